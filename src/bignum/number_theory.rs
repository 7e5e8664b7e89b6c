// Number Theory
// Binary GCD, LCM, modular exponentiation and modular inverse

use super::bigint::BigNum;
use crate::error::{Error, Result};

/// Greatest common divisor by Stein's binary algorithm.
///
/// Operates on magnitudes; the result is never negative. `gcd(a, 0) == |a|`.
pub fn gcd(u: &BigNum, v: &BigNum) -> BigNum {
    if u.is_zero() {
        return v.abs();
    }
    if v.is_zero() {
        return u.abs();
    }

    // Common factors of two
    let tz_u = u.trailing_zeros();
    let tz_v = v.trailing_zeros();
    let k = tz_u.min(tz_v);

    let mut a = u.abs() >> tz_u;
    let mut b = v.abs() >> tz_v;

    // Both odd from here; the difference of two odd numbers is even
    loop {
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        b = &b - &a;
        if b.is_zero() {
            break;
        }
        let tz = b.trailing_zeros();
        b >>= tz;
    }

    a << k
}

/// Least common multiple, computed as `(u / gcd) * v`; zero if either is zero
pub fn lcm(u: &BigNum, v: &BigNum) -> BigNum {
    if u.is_zero() || v.is_zero() {
        return BigNum::zero();
    }
    let g = gcd(u, v);
    (&u.abs() / &g) * v.abs()
}

/// Reduce `value` into `[0, modulus)` for a positive modulus
fn reduce(value: &BigNum, modulus: &BigNum) -> Result<BigNum> {
    let r = value.checked_rem(modulus)?;
    if r.is_negative() && !r.is_zero() {
        Ok(&r + modulus)
    } else {
        Ok(r.abs())
    }
}

/// `base^exp mod modulus` by left-to-right square-and-multiply.
///
/// A negative base is reduced into `[0, modulus)` first. The exponent must
/// be non-negative and the modulus positive.
pub fn mod_pow(base: &BigNum, exp: &BigNum, modulus: &BigNum) -> Result<BigNum> {
    if modulus.is_zero() {
        return Err(Error::DivisionByZero);
    }
    if modulus.is_negative() {
        return Err(Error::Arithmetic("negative modulus"));
    }
    if exp.is_negative() && !exp.is_zero() {
        return Err(Error::Arithmetic("negative exponent"));
    }
    if modulus.is_one() {
        return Ok(BigNum::zero());
    }

    let base = reduce(base, modulus)?;
    let mut acc = BigNum::one();

    for bit in (0..exp.bit_len()).rev() {
        acc = (&acc * &acc) % modulus;
        if exp.test_bit(bit) {
            acc = (&acc * &base) % modulus;
        }
    }

    Ok(acc)
}

/// Inverse of `u` modulo `v`, or zero when `gcd(u, v) != 1`.
///
/// Iterative extended Euclid that tracks only the magnitude of the Bezout
/// coefficient and recovers its sign from the parity of the step count.
pub fn mod_inverse(u: &BigNum, v: &BigNum) -> BigNum {
    if v.is_zero() || v.is_negative() {
        return BigNum::zero();
    }
    let Ok(u) = reduce(u, v) else {
        return BigNum::zero();
    };

    let mut u1 = BigNum::one();
    let mut u3 = u;
    let mut v1 = BigNum::zero();
    let mut v3 = v.clone();
    let mut negative = false;

    while !v3.is_zero() {
        let Ok((q, t3)) = u3.div_rem(&v3) else {
            return BigNum::zero();
        };
        let t1 = &u1 + &(&q * &v1);
        u1 = v1;
        v1 = t1;
        u3 = v3;
        v3 = t3;
        negative = !negative;
    }

    if !u3.is_one() {
        return BigNum::zero();
    }

    let inverse = if negative { v - &u1 } else { u1 };
    reduce(&inverse, v).unwrap_or_default()
}

/// Modular inverse as an `Option`, `None` when no inverse exists
pub fn checked_mod_inverse(u: &BigNum, v: &BigNum) -> Option<BigNum> {
    let inverse = mod_inverse(u, v);
    if inverse.is_zero() {
        None
    } else {
        Some(inverse)
    }
}

impl BigNum {
    pub fn gcd(&self, other: &BigNum) -> BigNum {
        gcd(self, other)
    }

    pub fn lcm(&self, other: &BigNum) -> BigNum {
        lcm(self, other)
    }

    pub fn mod_pow(&self, exp: &BigNum, modulus: &BigNum) -> Result<BigNum> {
        mod_pow(self, exp, modulus)
    }

    pub fn mod_inverse(&self, modulus: &BigNum) -> BigNum {
        mod_inverse(self, modulus)
    }

    /// Integer power with a big exponent; negative base or exponent is an error
    pub fn pow_big(&self, exp: &BigNum) -> Result<BigNum> {
        if self.is_negative() && !self.is_zero() {
            return Err(Error::Arithmetic("negative base exponentiation"));
        }
        if exp.is_negative() && !exp.is_zero() {
            return Err(Error::Arithmetic("negative exponent"));
        }

        let mut acc = BigNum::one();
        for bit in (0..exp.bit_len()).rev() {
            acc = &acc * &acc;
            if exp.test_bit(bit) {
                acc = &acc * self;
            }
        }
        Ok(acc)
    }
}
