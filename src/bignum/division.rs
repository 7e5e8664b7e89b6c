// Big Integer Division
// Knuth Algorithm D long division with truncating sign semantics

use std::cmp::Ordering;
use std::ops::{Div, DivAssign, Rem, RemAssign};

use super::arith::forward_binop;
use super::bigint::{cmp_digits, BigNum};
use super::buffer::{DigitStore, Limb, WideLimb, LIMB_BITS};
use crate::error::{Error, Result};

const BASE: WideLimb = 1 << LIMB_BITS;

/// Divide a magnitude by a single nonzero limb, returning (quotient, remainder)
fn div_rem_limb(u: &DigitStore, v: Limb) -> (DigitStore, Limb) {
    let m = u.active_len();
    let divisor = WideLimb::from(v);
    let mut q = DigitStore::zeroed(m);
    let mut k: WideLimb = 0;

    for j in (0..m).rev() {
        let current = (k << LIMB_BITS) | WideLimb::from(u.get(j));
        q.set(j, (current / divisor) as Limb);
        k = current % divisor;
    }

    (q, k as Limb)
}

/// Knuth Algorithm D over magnitudes.
///
/// Requires `v` to have at least two active limbs and `u >= v`.
fn div_rem_knuth(u: &DigitStore, v: &DigitStore) -> (DigitStore, DigitStore) {
    let m = u.active_len();
    let n = v.active_len();
    debug_assert!(n >= 2 && m >= n);

    // D1: normalize so the top divisor limb has its high bit set
    let s = v.get(n - 1).leading_zeros() as usize;
    let mut vn = vec![0 as Limb; n];
    let mut un = vec![0 as Limb; m + 1];
    if s == 0 {
        vn.copy_from_slice(&v.as_slice()[..n]);
        un[..m].copy_from_slice(&u.as_slice()[..m]);
    } else {
        for i in (1..n).rev() {
            vn[i] = (v.get(i) << s) | (v.get(i - 1) >> (LIMB_BITS - s));
        }
        vn[0] = v.get(0) << s;

        un[m] = u.get(m - 1) >> (LIMB_BITS - s);
        for i in (1..m).rev() {
            un[i] = (u.get(i) << s) | (u.get(i - 1) >> (LIMB_BITS - s));
        }
        un[0] = u.get(0) << s;
    }

    let top = WideLimb::from(vn[n - 1]);
    let second = WideLimb::from(vn[n - 2]);
    let mut q = DigitStore::zeroed(m - n + 1);

    for j in (0..=m - n).rev() {
        // D3: estimate the quotient digit from the top two dividend limbs
        let num = (WideLimb::from(un[j + n]) << LIMB_BITS) | WideLimb::from(un[j + n - 1]);
        let mut qhat = num / top;
        let mut rhat = num % top;

        while qhat >= BASE
            || qhat * second > ((rhat << LIMB_BITS) | WideLimb::from(un[j + n - 2]))
        {
            qhat -= 1;
            rhat += top;
            if rhat >= BASE {
                break;
            }
        }

        // D4: multiply and subtract
        let mut borrow: i64 = 0;
        for i in 0..n {
            let p = qhat * WideLimb::from(vn[i]);
            let t = i64::from(un[i + j]) - borrow - (p & 0xFFFF_FFFF) as i64;
            un[i + j] = t as Limb;
            borrow = (p >> LIMB_BITS) as i64 - (t >> LIMB_BITS);
        }
        let t = i64::from(un[j + n]) - borrow;
        un[j + n] = t as Limb;

        // D5/D6: the estimate was one too large, add the divisor back
        if t < 0 {
            qhat -= 1;
            let mut carry: WideLimb = 0;
            for i in 0..n {
                let sum = WideLimb::from(un[i + j]) + WideLimb::from(vn[i]) + carry;
                un[i + j] = sum as Limb;
                carry = sum >> LIMB_BITS;
            }
            un[j + n] = un[j + n].wrapping_add(carry as Limb);
        }
        q.set(j, qhat as Limb);
    }

    // D8: undo the normalization on the remainder
    let mut r = DigitStore::zeroed(n);
    for i in 0..n {
        let value = if s == 0 {
            un[i]
        } else {
            (un[i] >> s) | (un[i + 1] << (LIMB_BITS - s))
        };
        r.set(i, value);
    }

    (q, r)
}

/// Unsigned division of magnitudes; `v` must be nonzero
fn div_rem_digits(u: &DigitStore, v: &DigitStore) -> (DigitStore, DigitStore) {
    match cmp_digits(u, v) {
        Ordering::Equal => return (DigitStore::from_limbs(vec![1]), DigitStore::new()),
        Ordering::Less => return (DigitStore::new(), u.clone()),
        Ordering::Greater => {}
    }

    if v.active_len() == 1 {
        let divisor = v.get(0);
        if divisor == 2 {
            let q = BigNum::from_store(Default::default(), u.clone()).shr_bits(1);
            return (q.store, DigitStore::from_limbs(vec![u.get(0) & 1]));
        }
        let (q, r) = div_rem_limb(u, divisor);
        return (q, DigitStore::from_limbs(vec![r]));
    }

    div_rem_knuth(u, v)
}

impl BigNum {
    /// Quotient and remainder of `self / divisor`.
    ///
    /// Division truncates toward zero: the quotient's sign is the XOR of the
    /// operand signs and the remainder takes the dividend's sign, so
    /// `q * divisor + r == self` always holds.
    pub fn div_rem(&self, divisor: &BigNum) -> Result<(BigNum, BigNum)> {
        if divisor.is_zero() {
            return Err(Error::DivisionByZero);
        }

        let (q, r) = div_rem_digits(&self.store, &divisor.store);
        Ok((
            BigNum::from_store(self.sign.xor(divisor.sign), q),
            BigNum::from_store(self.sign, r),
        ))
    }

    pub fn checked_div(&self, divisor: &BigNum) -> Result<BigNum> {
        self.div_rem(divisor).map(|(q, _)| q)
    }

    pub fn checked_rem(&self, divisor: &BigNum) -> Result<BigNum> {
        self.div_rem(divisor).map(|(_, r)| r)
    }

    /// Divide the magnitude by a small nonzero divisor, returning the
    /// signed quotient and the magnitude of the remainder
    pub fn div_rem_small(&self, divisor: u32) -> Result<(BigNum, u32)> {
        if divisor == 0 {
            return Err(Error::DivisionByZero);
        }
        let (q, r) = div_rem_limb(&self.store, divisor);
        Ok((BigNum::from_store(self.sign, q), r))
    }

    /// Remainder of the magnitude modulo a small nonzero divisor
    pub fn rem_small(&self, divisor: u32) -> Result<u32> {
        self.div_rem_small(divisor).map(|(_, r)| r)
    }
}

impl<'a, 'b> Div<&'b BigNum> for &'a BigNum {
    type Output = BigNum;

    fn div(self, rhs: &'b BigNum) -> BigNum {
        match self.div_rem(rhs) {
            Ok((q, _)) => q,
            Err(_) => panic!("attempt to divide by zero"),
        }
    }
}

impl<'a, 'b> Rem<&'b BigNum> for &'a BigNum {
    type Output = BigNum;

    fn rem(self, rhs: &'b BigNum) -> BigNum {
        match self.div_rem(rhs) {
            Ok((_, r)) => r,
            Err(_) => panic!("attempt to calculate the remainder with a divisor of zero"),
        }
    }
}

forward_binop!(Div, div, DivAssign, div_assign);
forward_binop!(Rem, rem, RemAssign, rem_assign);
