// Digit Store
// Fixed-capacity little-endian limb storage backing a BigNum magnitude

use crate::error::{Error, Result};

/// One 32-bit digit of a multi-precision magnitude
pub type Limb = u32;

/// Double-width accumulator used for carries and partial products
pub type WideLimb = u64;

pub const LIMB_BITS: usize = 32;
pub const LIMB_BYTES: usize = 4;

/// Limb buffer, least significant limb first.
///
/// The capacity is fixed when the store is allocated. Reads past the end
/// yield zero and writes past the end are refused, so algorithms can treat
/// a short store as if it were zero-extended.
#[derive(Clone, Debug, Default)]
pub struct DigitStore {
    limbs: Vec<Limb>,
}

impl DigitStore {
    /// Empty, unallocated store
    pub const fn new() -> Self {
        Self { limbs: Vec::new() }
    }

    /// Store of `count` zero limbs
    pub fn zeroed(count: usize) -> Self {
        Self {
            limbs: vec![0; count],
        }
    }

    /// Deep copy of `from` into a store of `count` limbs.
    ///
    /// Truncates when `count` is smaller than the source capacity and
    /// zero-extends when it is larger.
    pub fn resized_copy(from: &DigitStore, count: usize) -> Self {
        let mut limbs = vec![0; count];
        let n = count.min(from.limbs.len());
        limbs[..n].copy_from_slice(&from.limbs[..n]);
        Self { limbs }
    }

    pub fn from_limbs(limbs: Vec<Limb>) -> Self {
        Self { limbs }
    }

    /// Reserve `count` zero-initialized limbs.
    ///
    /// Fails with [`Error::AlreadyAllocated`] if the store already owns
    /// storage. Allocating zero limbs leaves the store empty.
    pub fn allocate(&mut self, count: usize) -> Result<()> {
        if self.is_allocated() {
            return Err(Error::AlreadyAllocated);
        }
        if count == 0 {
            self.free();
            return Ok(());
        }

        let mut limbs = Vec::new();
        limbs
            .try_reserve_exact(count)
            .map_err(|_| Error::AllocationFailure { limbs: count })?;
        limbs.resize(count, 0);
        self.limbs = limbs;
        Ok(())
    }

    /// Change the capacity, keeping `min(old, new)` limbs and zero-extending on growth
    pub fn reallocate(&mut self, count: usize) -> Result<()> {
        if count == self.limbs.len() {
            return Ok(());
        }
        if count > self.limbs.len() {
            self.limbs
                .try_reserve_exact(count - self.limbs.len())
                .map_err(|_| Error::AllocationFailure { limbs: count })?;
        }
        self.limbs.resize(count, 0);
        if count == 0 {
            self.free();
        }
        Ok(())
    }

    /// Release the storage and return to the empty state
    pub fn free(&mut self) {
        self.limbs = Vec::new();
    }

    /// Limb at `index`, or zero past the end
    #[inline]
    pub fn get(&self, index: usize) -> Limb {
        self.limbs.get(index).copied().unwrap_or(0)
    }

    /// Store `value` at `index`; returns false if `index` is out of range
    #[inline]
    pub fn set(&mut self, index: usize, value: Limb) -> bool {
        match self.limbs.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of limbs up to and including the highest nonzero one
    pub fn active_len(&self) -> usize {
        self.limbs
            .iter()
            .rposition(|&limb| limb != 0)
            .map_or(0, |top| top + 1)
    }

    /// Number of limbs the store can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.limbs.len()
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        !self.limbs.is_empty()
    }

    pub fn as_slice(&self) -> &[Limb] {
        &self.limbs
    }

    pub fn as_mut_slice(&mut self) -> &mut [Limb] {
        &mut self.limbs
    }
}
