// Primality Testing
// Trial division by primes below 2000 followed by Miller-Rabin rounds

use tracing::trace;

use super::bigint::BigNum;
use super::number_theory::{gcd, mod_pow};
use super::random::RandomSource;

/// Every prime below 2000
pub const SMALL_PRIMES: [u32; 303] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181,
    191, 193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281,
    283, 293, 307, 311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397,
    401, 409, 419, 421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619,
    631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743,
    751, 757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863,
    877, 881, 883, 887, 907, 911, 919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
    1009, 1013, 1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091, 1093,
    1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181, 1187, 1193, 1201, 1213,
    1217, 1223, 1229, 1231, 1237, 1249, 1259, 1277, 1279, 1283, 1289, 1291, 1297, 1301, 1303,
    1307, 1319, 1321, 1327, 1361, 1367, 1373, 1381, 1399, 1409, 1423, 1427, 1429, 1433, 1439,
    1447, 1451, 1453, 1459, 1471, 1481, 1483, 1487, 1489, 1493, 1499, 1511, 1523, 1531, 1543,
    1549, 1553, 1559, 1567, 1571, 1579, 1583, 1597, 1601, 1607, 1609, 1613, 1619, 1621, 1627,
    1637, 1657, 1663, 1667, 1669, 1693, 1697, 1699, 1709, 1721, 1723, 1733, 1741, 1747, 1753,
    1759, 1777, 1783, 1787, 1789, 1801, 1811, 1823, 1831, 1847, 1861, 1867, 1871, 1873, 1877,
    1879, 1889, 1901, 1907, 1913, 1931, 1933, 1949, 1951, 1973, 1979, 1987, 1993, 1997, 1999,
];

/// Outcome of the trial division stage
enum Sieve {
    Prime,
    Composite,
    Undecided,
}

fn trial_division(n: &BigNum) -> Sieve {
    if n.is_negative() || n.bit_len() < 2 {
        return Sieve::Composite;
    }
    if n.is_even() {
        return if *n == 2u32 { Sieve::Prime } else { Sieve::Composite };
    }

    for &p in SMALL_PRIMES.iter().skip(1) {
        if *n == p {
            return Sieve::Prime;
        }
        match n.rem_small(p) {
            Ok(0) => return Sieve::Composite,
            Ok(_) => {}
            Err(_) => return Sieve::Composite,
        }
    }
    Sieve::Undecided
}

/// Miller-Rabin with `rounds` random bases drawn from `[1, n - 1]`.
///
/// `n` must be odd and greater than 3.
pub fn miller_rabin<R: RandomSource + ?Sized>(n: &BigNum, rounds: u32, rng: &mut R) -> bool {
    let one = BigNum::one();
    let n_minus_1 = n - &one;

    // n - 1 = 2^s * t with t odd
    let s = n_minus_1.trailing_zeros();
    let t = &n_minus_1 >> s;

    'rounds: for round in 0..rounds {
        let a = &BigNum::random_max(&n_minus_1, rng) + &one;
        if !gcd(&a, n).is_one() {
            trace!(round, "base shares a factor with candidate");
            return false;
        }

        let Ok(mut b) = mod_pow(&a, &t, n) else {
            return false;
        };
        if b.is_one() || b == n_minus_1 {
            continue;
        }

        for _ in 1..s {
            b = (&b * &b) % n;
            if b == n_minus_1 {
                continue 'rounds;
            }
        }

        trace!(round, "witness found");
        return false;
    }

    true
}

/// Trial division, then Miller-Rabin using the supplied random source
pub fn is_probable_prime_with<R: RandomSource + ?Sized>(
    n: &BigNum,
    rounds: u32,
    rng: &mut R,
) -> bool {
    match trial_division(n) {
        Sieve::Prime => true,
        Sieve::Composite => false,
        Sieve::Undecided => miller_rabin(n, rounds, rng),
    }
}

/// Trial division, then Miller-Rabin with bases from the thread-local RNG
pub fn is_probable_prime(n: &BigNum, rounds: u32) -> bool {
    is_probable_prime_with(n, rounds, &mut rand::thread_rng())
}

impl BigNum {
    pub fn is_probable_prime(&self, rounds: u32) -> bool {
        is_probable_prime(self, rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bignum::random::TimeSeededRng;

    fn big(s: &str) -> BigNum {
        s.parse().unwrap()
    }

    #[test]
    fn test_small_primes_table() {
        assert_eq!(SMALL_PRIMES.len(), 303);
        assert_eq!(SMALL_PRIMES[0], 2);
        assert_eq!(SMALL_PRIMES[302], 1999);
    }

    #[test]
    fn test_all_primes_below_2000() {
        for &p in SMALL_PRIMES.iter() {
            assert!(is_probable_prime(&BigNum::from(p), 30), "{} should be prime", p);
        }
    }

    #[test]
    fn test_small_composites() {
        for n in [0u32, 1, 4, 9, 15, 341, 561, 1001, 1999 * 1997] {
            assert!(!is_probable_prime(&BigNum::from(n), 30), "{} should be composite", n);
        }
        assert!(!is_probable_prime(&BigNum::from(-7i32), 30));
    }

    #[test]
    fn test_miller_rabin_catches_pseudoprimes() {
        // Fermat pseudoprime to base 2 and a Carmichael number
        let mut rng = TimeSeededRng::seed(7);
        assert!(!miller_rabin(&BigNum::from(341u32), 30, &mut rng));
        assert!(!miller_rabin(&BigNum::from(561u32), 30, &mut rng));
        assert!(!miller_rabin(&BigNum::from(41041u32), 30, &mut rng));
    }

    #[test]
    fn test_miller_rabin_accepts_primes() {
        let mut rng = TimeSeededRng::seed(11);
        for p in [2003u32, 65537, 1_000_003, 4_294_967_291] {
            assert!(miller_rabin(&BigNum::from(p), 30, &mut rng), "{} should be prime", p);
        }
    }

    #[test]
    fn test_large_primes() {
        let m127 = &(BigNum::one() << 127) - &BigNum::one();
        let m521 = &(BigNum::one() << 521) - &BigNum::one();
        let curve = &(BigNum::one() << 255) - &BigNum::from(19u32);
        for p in [&m127, &m521, &curve] {
            assert!(is_probable_prime(p, 30));
        }
    }

    #[test]
    fn test_large_composites() {
        // Fermat number F7 and a product of two Mersenne primes
        let f7 = &(BigNum::one() << 128) + &BigNum::one();
        assert!(!is_probable_prime(&f7, 30));
        let m61 = big("1fffffffffffffff");
        let m89 = big("1ffffffffffffffffffffff");
        assert!(!is_probable_prime(&(&m61 * &m89), 30));
    }
}
