// Big Integer
// Sign + magnitude integer over a DigitStore, with comparison and bit/byte access

use std::cmp::Ordering;

use super::buffer::{DigitStore, Limb, LIMB_BITS, LIMB_BYTES};

/// Sign tag of a [`BigNum`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    pub fn flip(self) -> Sign {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }

    /// Sign of a product or quotient of operands with these signs
    pub fn xor(self, other: Sign) -> Sign {
        if self == other {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

/// Arbitrary-precision signed integer.
///
/// The magnitude lives in a [`DigitStore`] that may carry leading zero
/// limbs. Zero can be tagged with either sign; comparisons treat both
/// zeros as equal.
#[derive(Clone, Debug, Default)]
pub struct BigNum {
    pub(crate) sign: Sign,
    pub(crate) store: DigitStore,
}

impl BigNum {
    /// Positive zero with no storage
    pub const fn zero() -> Self {
        Self {
            sign: Sign::Positive,
            store: DigitStore::new(),
        }
    }

    pub fn one() -> Self {
        Self::from(1u32)
    }

    pub(crate) fn from_store(sign: Sign, store: DigitStore) -> Self {
        Self { sign, store }
    }

    /// Copy of `from` with its limb capacity changed to `limbs`
    pub fn with_capacity_from(from: &BigNum, limbs: usize) -> Self {
        Self {
            sign: from.sign,
            store: DigitStore::resized_copy(&from.store, limbs),
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn is_zero(&self) -> bool {
        self.store.as_slice().iter().all(|&limb| limb == 0)
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }

    pub fn is_positive(&self) -> bool {
        self.sign == Sign::Positive
    }

    pub fn is_even(&self) -> bool {
        self.store.get(0) & 1 == 0
    }

    pub fn is_odd(&self) -> bool {
        !self.is_even()
    }

    pub fn is_one(&self) -> bool {
        self.is_positive() && self.store.active_len() == 1 && self.store.get(0) == 1
    }

    /// Absolute value
    pub fn abs(&self) -> BigNum {
        Self {
            sign: Sign::Positive,
            store: self.store.clone(),
        }
    }

    /// Limb capacity of the underlying store
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Number of limbs up to the highest nonzero one
    pub fn active_len(&self) -> usize {
        self.store.active_len()
    }

    pub fn limb(&self, index: usize) -> Limb {
        self.store.get(index)
    }

    pub fn set_limb(&mut self, index: usize, value: Limb) -> bool {
        self.store.set(index, value)
    }

    pub fn limbs(&self) -> &[Limb] {
        self.store.as_slice()
    }

    /// Number of significant bits in the magnitude (zero for zero)
    pub fn bit_len(&self) -> usize {
        let active = self.store.active_len();
        if active == 0 {
            return 0;
        }
        let top = self.store.get(active - 1);
        (active - 1) * LIMB_BITS + (LIMB_BITS - top.leading_zeros() as usize)
    }

    /// Number of zero bits below the lowest set bit (zero for zero)
    pub fn trailing_zeros(&self) -> usize {
        self.store
            .as_slice()
            .iter()
            .position(|&limb| limb != 0)
            .map_or(0, |i| i * LIMB_BITS + self.store.get(i).trailing_zeros() as usize)
    }

    pub fn test_bit(&self, bit: usize) -> bool {
        (self.store.get(bit / LIMB_BITS) >> (bit % LIMB_BITS)) & 1 == 1
    }

    /// Set a bit, growing the store when the bit lies past its capacity
    pub fn set_bit(&mut self, bit: usize) {
        let index = bit / LIMB_BITS;
        if index >= self.store.capacity() {
            self.store = DigitStore::resized_copy(&self.store, index + 1);
        }
        let value = self.store.get(index) | (1 << (bit % LIMB_BITS));
        self.store.set(index, value);
    }

    pub fn clear_bit(&mut self, bit: usize) {
        let index = bit / LIMB_BITS;
        let value = self.store.get(index) & !(1 << (bit % LIMB_BITS));
        self.store.set(index, value);
    }

    /// Byte `index` of the magnitude, little-endian; zero past the end
    pub fn byte(&self, index: usize) -> u8 {
        let limb = self.store.get(index / LIMB_BYTES);
        (limb >> (8 * (index % LIMB_BYTES))) as u8
    }

    /// Overwrite byte `index`; returns false if it lies past the capacity
    pub fn set_byte(&mut self, index: usize, value: u8) -> bool {
        let pos = index / LIMB_BYTES;
        if pos >= self.store.capacity() {
            return false;
        }
        let shift = 8 * (index % LIMB_BYTES);
        let limb = (self.store.get(pos) & !(0xFF << shift)) | (Limb::from(value) << shift);
        self.store.set(pos, limb)
    }

    /// Number of bytes up to the highest nonzero one
    pub fn active_bytes(&self) -> usize {
        self.bit_len().div_ceil(8)
    }

    /// Size of the active limbs in bytes
    pub fn byte_len(&self) -> usize {
        self.store.active_len() * LIMB_BYTES
    }

    /// Lowest limb reinterpreted as a signed machine integer
    pub fn to_i32(&self) -> i32 {
        let low = self.store.get(0) as i32;
        if self.is_negative() {
            low.wrapping_neg()
        } else {
            low
        }
    }

    /// Lowest limb of the magnitude
    pub fn to_u32(&self) -> u32 {
        self.store.get(0)
    }

    /// Compare magnitudes, ignoring signs
    pub fn cmp_magnitude(&self, other: &BigNum) -> Ordering {
        cmp_digits(&self.store, &other.store)
    }
}

/// Compare two magnitudes by active length, then limb by limb from the top
pub(crate) fn cmp_digits(a: &DigitStore, b: &DigitStore) -> Ordering {
    let len_a = a.active_len();
    let len_b = b.active_len();
    if len_a != len_b {
        return len_a.cmp(&len_b);
    }
    for i in (0..len_a).rev() {
        match a.get(i).cmp(&b.get(i)) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    Ordering::Equal
}

impl Ord for BigNum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => {
                return if other.is_negative() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, true) => {
                return if self.is_negative() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, false) => {}
        }

        match (self.sign, other.sign) {
            (Sign::Positive, Sign::Negative) => Ordering::Greater,
            (Sign::Negative, Sign::Positive) => Ordering::Less,
            (Sign::Positive, Sign::Positive) => self.cmp_magnitude(other),
            (Sign::Negative, Sign::Negative) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for BigNum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BigNum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BigNum {}

impl From<u32> for BigNum {
    fn from(value: u32) -> Self {
        Self::from_store(Sign::Positive, DigitStore::from_limbs(vec![value]))
    }
}

impl From<u64> for BigNum {
    fn from(value: u64) -> Self {
        Self::from_store(
            Sign::Positive,
            DigitStore::from_limbs(vec![value as Limb, (value >> LIMB_BITS) as Limb]),
        )
    }
}

impl From<i32> for BigNum {
    fn from(value: i32) -> Self {
        let sign = if value < 0 { Sign::Negative } else { Sign::Positive };
        Self::from_store(sign, DigitStore::from_limbs(vec![value.unsigned_abs()]))
    }
}

impl From<i64> for BigNum {
    fn from(value: i64) -> Self {
        let mut n = BigNum::from(value.unsigned_abs());
        if value < 0 {
            n.sign = Sign::Negative;
        }
        n
    }
}

impl PartialEq<u32> for BigNum {
    fn eq(&self, other: &u32) -> bool {
        if *other == 0 {
            return self.is_zero();
        }
        self.is_positive() && self.store.active_len() == 1 && self.store.get(0) == *other
    }
}
