// Big Integer Arithmetic
// Shifts, sign-aware addition/subtraction, schoolbook multiplication

use std::cmp::Ordering;
use std::ops::{
    Add, AddAssign, Mul, MulAssign, Neg, Shl, ShlAssign, Shr, ShrAssign, Sub, SubAssign,
};

use super::bigint::{cmp_digits, BigNum, Sign};
use super::buffer::{DigitStore, Limb, WideLimb, LIMB_BITS};
use crate::error::{Error, Result};

/// Unsigned addition; the result has one spare limb for the final carry
fn add_digits(a: &DigitStore, b: &DigitStore) -> DigitStore {
    let len = a.active_len().max(b.active_len()) + 1;
    let mut result = DigitStore::zeroed(len);
    let mut carry: WideLimb = 0;

    for (i, slot) in result.as_mut_slice().iter_mut().enumerate() {
        let sum = WideLimb::from(a.get(i)) + WideLimb::from(b.get(i)) + carry;
        *slot = sum as Limb;
        carry = sum >> LIMB_BITS;
    }

    result
}

/// Unsigned subtraction, requires `a >= b`
fn sub_digits(a: &DigitStore, b: &DigitStore) -> DigitStore {
    debug_assert!(cmp_digits(a, b) != Ordering::Less);

    let len = a.active_len().max(b.active_len());
    let mut result = DigitStore::zeroed(len);
    let mut borrow = false;

    for (i, slot) in result.as_mut_slice().iter_mut().enumerate() {
        let (diff, b1) = a.get(i).overflowing_sub(b.get(i));
        let (diff, b2) = diff.overflowing_sub(Limb::from(borrow));
        *slot = diff;
        borrow = b1 || b2;
    }

    result
}

/// Signed addition by case analysis on the two sign tags
fn add_signed(a_sign: Sign, a: &DigitStore, b_sign: Sign, b: &DigitStore) -> BigNum {
    if b.active_len() == 0 {
        return BigNum::from_store(a_sign, a.clone());
    }
    if a.active_len() == 0 {
        return BigNum::from_store(b_sign, b.clone());
    }

    if a_sign == b_sign {
        return BigNum::from_store(a_sign, add_digits(a, b));
    }

    // Opposite signs: subtract the smaller magnitude from the larger
    match cmp_digits(a, b) {
        Ordering::Less => BigNum::from_store(b_sign, sub_digits(b, a)),
        Ordering::Equal => BigNum::zero(),
        Ordering::Greater => BigNum::from_store(a_sign, sub_digits(a, b)),
    }
}

/// Schoolbook product of two magnitudes.
///
/// Each row `a * b[i]` is formed with a 64-bit carry chain and added into
/// the running sum at limb offset `i`.
fn mul_digits(a: &DigitStore, b: &DigitStore) -> DigitStore {
    let len_a = a.active_len();
    let len_b = b.active_len();
    let mut result = DigitStore::zeroed(len_a + len_b);
    let acc = result.as_mut_slice();

    for i in 0..len_b {
        let multiplier = WideLimb::from(b.get(i));
        if multiplier == 0 {
            continue;
        }
        let mut carry: WideLimb = 0;
        for j in 0..len_a {
            let t = WideLimb::from(a.get(j)) * multiplier + WideLimb::from(acc[i + j]) + carry;
            acc[i + j] = t as Limb;
            carry = t >> LIMB_BITS;
        }
        acc[i + len_a] = carry as Limb;
    }

    result
}

impl BigNum {
    /// Shift the magnitude left by `bits`.
    ///
    /// The result is sized to hold every shifted-out bit, so a left shift
    /// never loses high-order bits.
    pub fn shl_bits(&self, bits: usize) -> BigNum {
        if self.is_zero() {
            return BigNum::zero();
        }
        if bits == 0 {
            return self.clone();
        }

        let limb_shift = bits / LIMB_BITS;
        let bit_shift = bits % LIMB_BITS;
        let active = self.active_len();
        let mut result = DigitStore::zeroed((self.bit_len() + bits).div_ceil(LIMB_BITS));

        // Intra-limb pass carries the top bits of each limb into the next one
        let mut carry: Limb = 0;
        for i in 0..active {
            let limb = self.limb(i);
            let shifted = if bit_shift == 0 {
                limb
            } else {
                (limb << bit_shift) | carry
            };
            result.set(i + limb_shift, shifted);
            carry = if bit_shift == 0 {
                0
            } else {
                limb >> (LIMB_BITS - bit_shift)
            };
        }
        if carry != 0 {
            result.set(active + limb_shift, carry);
        }

        BigNum::from_store(self.sign, result)
    }

    /// Shift the magnitude right by `bits`, truncating toward zero
    pub fn shr_bits(&self, bits: usize) -> BigNum {
        if bits == 0 {
            return self.clone();
        }
        if self.is_zero() || bits >= self.bit_len() {
            return BigNum::zero();
        }

        let limb_shift = bits / LIMB_BITS;
        let bit_shift = bits % LIMB_BITS;
        let active = self.active_len();
        let mut result = DigitStore::zeroed(active - limb_shift);

        for i in 0..active - limb_shift {
            let low = self.limb(i + limb_shift);
            let value = if bit_shift == 0 {
                low
            } else {
                let high = self.limb(i + limb_shift + 1);
                (low >> bit_shift) | (high << (LIMB_BITS - bit_shift))
            };
            result.set(i, value);
        }

        BigNum::from_store(self.sign, result)
    }

    /// Integer power by repeated squaring; a negative base is unsupported
    pub fn pow(&self, mut exp: u32) -> Result<BigNum> {
        if self.is_negative() && !self.is_zero() {
            return Err(Error::Arithmetic("negative base exponentiation"));
        }

        let mut result = BigNum::one();
        let mut x = self.clone();
        while exp > 0 {
            if exp & 1 == 1 {
                result = &result * &x;
            }
            exp >>= 1;
            if exp > 0 {
                x = &x * &x;
            }
        }
        Ok(result)
    }
}

impl<'a, 'b> Add<&'b BigNum> for &'a BigNum {
    type Output = BigNum;

    fn add(self, rhs: &'b BigNum) -> BigNum {
        add_signed(self.sign, &self.store, rhs.sign, &rhs.store)
    }
}

impl<'a, 'b> Sub<&'b BigNum> for &'a BigNum {
    type Output = BigNum;

    fn sub(self, rhs: &'b BigNum) -> BigNum {
        add_signed(self.sign, &self.store, rhs.sign.flip(), &rhs.store)
    }
}

impl<'a, 'b> Mul<&'b BigNum> for &'a BigNum {
    type Output = BigNum;

    fn mul(self, rhs: &'b BigNum) -> BigNum {
        if self.is_zero() || rhs.is_zero() {
            return BigNum::zero();
        }
        BigNum::from_store(self.sign.xor(rhs.sign), mul_digits(&self.store, &rhs.store))
    }
}

/// Forward the owned and mixed operand forms of a binary operator to the
/// `&BigNum op &BigNum` implementation, plus the `u32` right-hand side.
macro_rules! forward_binop {
    ($imp:ident, $method:ident, $assign_imp:ident, $assign_method:ident) => {
        impl $imp<BigNum> for BigNum {
            type Output = BigNum;

            fn $method(self, rhs: BigNum) -> BigNum {
                $imp::$method(&self, &rhs)
            }
        }

        impl<'a> $imp<&'a BigNum> for BigNum {
            type Output = BigNum;

            fn $method(self, rhs: &'a BigNum) -> BigNum {
                $imp::$method(&self, rhs)
            }
        }

        impl<'a> $imp<BigNum> for &'a BigNum {
            type Output = BigNum;

            fn $method(self, rhs: BigNum) -> BigNum {
                $imp::$method(self, &rhs)
            }
        }

        impl $imp<u32> for BigNum {
            type Output = BigNum;

            fn $method(self, rhs: u32) -> BigNum {
                $imp::$method(&self, &BigNum::from(rhs))
            }
        }

        impl<'a> $imp<u32> for &'a BigNum {
            type Output = BigNum;

            fn $method(self, rhs: u32) -> BigNum {
                $imp::$method(self, &BigNum::from(rhs))
            }
        }

        impl $assign_imp<BigNum> for BigNum {
            fn $assign_method(&mut self, rhs: BigNum) {
                *self = $imp::$method(&*self, &rhs);
            }
        }

        impl<'a> $assign_imp<&'a BigNum> for BigNum {
            fn $assign_method(&mut self, rhs: &'a BigNum) {
                *self = $imp::$method(&*self, rhs);
            }
        }

        impl $assign_imp<u32> for BigNum {
            fn $assign_method(&mut self, rhs: u32) {
                *self = $imp::$method(&*self, &BigNum::from(rhs));
            }
        }
    };
}

forward_binop!(Add, add, AddAssign, add_assign);
forward_binop!(Sub, sub, SubAssign, sub_assign);
forward_binop!(Mul, mul, MulAssign, mul_assign);

pub(crate) use forward_binop;

impl Neg for BigNum {
    type Output = BigNum;

    fn neg(mut self) -> BigNum {
        self.sign = self.sign.flip();
        self
    }
}

impl Neg for &BigNum {
    type Output = BigNum;

    fn neg(self) -> BigNum {
        -self.clone()
    }
}

impl Shl<usize> for &BigNum {
    type Output = BigNum;

    fn shl(self, bits: usize) -> BigNum {
        self.shl_bits(bits)
    }
}

impl Shl<usize> for BigNum {
    type Output = BigNum;

    fn shl(self, bits: usize) -> BigNum {
        self.shl_bits(bits)
    }
}

impl Shr<usize> for &BigNum {
    type Output = BigNum;

    fn shr(self, bits: usize) -> BigNum {
        self.shr_bits(bits)
    }
}

impl Shr<usize> for BigNum {
    type Output = BigNum;

    fn shr(self, bits: usize) -> BigNum {
        self.shr_bits(bits)
    }
}

impl ShlAssign<usize> for BigNum {
    fn shl_assign(&mut self, bits: usize) {
        *self = self.shl_bits(bits);
    }
}

impl ShrAssign<usize> for BigNum {
    fn shr_assign(&mut self, bits: usize) {
        *self = self.shr_bits(bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(s: &str) -> BigNum {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_carries_across_limbs() {
        let a = BigNum::from(0xFFFF_FFFFu32);
        let sum = &a + &BigNum::one();
        assert_eq!(sum, BigNum::from(0x1_0000_0000u64));
        assert_eq!(sum.active_len(), 2);
    }

    #[test]
    fn test_add_sign_cases() {
        let five = BigNum::from(5i32);
        let three = BigNum::from(3i32);
        assert_eq!(&five + &(-&three), BigNum::from(2i32));
        assert_eq!(&(-&five) + &three, BigNum::from(-2i32));
        assert_eq!(&(-&five) + &(-&three), BigNum::from(-8i32));
        assert_eq!(&three + &(-&five), BigNum::from(-2i32));
        assert_eq!(&five + &(-&five), BigNum::zero());
    }

    #[test]
    fn test_sub_sign_cases() {
        let five = BigNum::from(5i32);
        let three = BigNum::from(3i32);
        assert_eq!(&three - &five, BigNum::from(-2i32));
        assert_eq!(&five - &(-&three), BigNum::from(8i32));
        assert_eq!(&(-&five) - &three, BigNum::from(-8i32));
        assert_eq!(&(-&five) - &(-&three), BigNum::from(-2i32));
        assert_eq!(&BigNum::zero() - &five, BigNum::from(-5i32));
    }

    #[test]
    fn test_operands_are_not_mutated() {
        let a = BigNum::from(-4i32);
        let b = BigNum::from(9i32);
        let _ = &a + &b;
        let _ = &a - &b;
        assert!(a.is_negative());
        assert!(b.is_positive());
    }

    #[test]
    fn test_sub_borrows_across_limbs() {
        let a = BigNum::from(0x1_0000_0000u64);
        assert_eq!(&a - &BigNum::one(), BigNum::from(0xFFFF_FFFFu32));
    }

    #[test]
    fn test_mul() {
        let a = big("ffffffffffffffff");
        let b = big("ffffffff");
        assert_eq!(&a * &b, big("fffffffeffffffff00000001"));
        assert_eq!(&a * &BigNum::zero(), BigNum::zero());
        assert_eq!(&(-&a) * &b, -(&a * &b));
        assert_eq!(&(-&a) * &(-&b), &a * &b);
    }

    #[test]
    fn test_shl_grows_storage() {
        let a = BigNum::from(0x8000_0000u32);
        let shifted = &a << 1;
        assert_eq!(shifted, BigNum::from(0x1_0000_0000u64));
        assert_eq!(&a << 64, big("800000000000000000000000"));
        assert_eq!(&BigNum::from(3u32) << 35, big("1800000000"));
    }

    #[test]
    fn test_shr() {
        let a = big("123456789abcdef0123");
        assert_eq!(&a >> 4, big("123456789abcdef012"));
        assert_eq!(&a >> 36, big("123456789a"));
        assert_eq!(&a >> 0, a);
        assert_eq!(&a >> 200, BigNum::zero());
        assert_eq!(&BigNum::zero() >> 3, BigNum::zero());
    }

    #[test]
    fn test_shift_roundtrip() {
        let a = big("deadbeefcafebabe1234");
        for bits in [1, 7, 31, 32, 33, 64, 95] {
            assert_eq!((&a << bits) >> bits, a);
        }
    }

    #[test]
    fn test_assign_ops() {
        let mut n = BigNum::from(10u32);
        n += 5;
        n -= 3;
        n *= 4;
        n <<= 2;
        n >>= 1;
        assert_eq!(n, BigNum::from(96u32));
    }

    #[test]
    fn test_pow() {
        assert_eq!(BigNum::from(2u32).pow(100).unwrap(), BigNum::one() << 100);
        assert_eq!(BigNum::from(7u32).pow(0).unwrap(), BigNum::one());
        assert!(matches!(
            BigNum::from(-2i32).pow(3),
            Err(Error::Arithmetic(_))
        ));
    }
}
