// Random Generation
// Random big integers and primes drawn from a pluggable random source

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use super::bigint::{BigNum, Sign};
use super::buffer::{DigitStore, Limb, LIMB_BITS};
use super::prime::is_probable_prime_with;
use crate::config::RsaConfig;
use crate::error::{Error, Result};

/// Source of random limbs for number generation.
///
/// Every `rand::RngCore` is a `RandomSource`, so `rand::thread_rng()` or
/// `rand::rngs::OsRng` can be passed wherever one is expected.
pub trait RandomSource {
    fn random_limb(&mut self) -> Limb;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn random_limb(&mut self) -> Limb {
        self.next_u32()
    }
}

/// Small fast generator seeded from the wall clock or a fixed seed.
///
/// Not cryptographically secure. Intended for reproducible runs and tests;
/// keys meant to protect anything should come from `OsRng` or `thread_rng`.
#[derive(Debug, Clone)]
pub struct TimeSeededRng {
    inner: SmallRng,
}

impl TimeSeededRng {
    /// Seed from the current time in nanoseconds
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::seed(nanos)
    }

    pub fn seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RngCore for TimeSeededRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

impl BigNum {
    /// Positive value with `limbs` uniformly random limbs
    pub fn random<R: RandomSource + ?Sized>(limbs: usize, rng: &mut R) -> BigNum {
        let mut store = DigitStore::zeroed(limbs);
        for slot in store.as_mut_slice() {
            *slot = rng.random_limb();
        }
        BigNum::from_store(Sign::Positive, store)
    }

    /// Random value in `[0, |max|)`; zero when `max` is zero
    pub fn random_max<R: RandomSource + ?Sized>(max: &BigNum, rng: &mut R) -> BigNum {
        if max.is_zero() {
            return BigNum::zero();
        }
        let bound = max.abs();
        let value = BigNum::random(bound.active_len(), rng);
        if value >= bound {
            value % &bound
        } else {
            value
        }
    }

    /// Random value of exactly `bits` bits.
    ///
    /// The low `bits` bits are random, bit `bits - 1` is forced to one and
    /// everything above it is zero.
    pub fn random_bits<R: RandomSource + ?Sized>(bits: usize, rng: &mut R) -> BigNum {
        if bits == 0 {
            return BigNum::zero();
        }

        let mut n = BigNum::random(bits.div_ceil(LIMB_BITS), rng);
        let spare = n.capacity() * LIMB_BITS - bits;
        if spare > 0 {
            let top = n.capacity() - 1;
            let masked = n.limb(top) & (Limb::MAX >> spare);
            n.set_limb(top, masked);
        }
        n.set_bit(bits - 1);
        n
    }

    /// Random probable prime of exactly `bits` bits with its top `top_bits`
    /// bits set.
    ///
    /// Each attempt draws a random odd candidate and steps it by two until it
    /// passes the primality test; an attempt is abandoned if stepping carries
    /// the candidate past `bits` bits. Fails after `config.max_prime_attempts`
    /// abandoned attempts.
    pub fn generate_prime<R: RandomSource + ?Sized>(
        bits: usize,
        top_bits: usize,
        config: &RsaConfig,
        rng: &mut R,
    ) -> Result<BigNum> {
        if bits < 2 {
            return Err(Error::Arithmetic("prime needs at least two bits"));
        }
        let top_bits = top_bits.min(bits);

        for attempt in 0..config.max_prime_attempts {
            let mut candidate = BigNum::random_bits(bits, rng);
            for i in 0..top_bits {
                candidate.set_bit(bits - 1 - i);
            }
            candidate.set_bit(0);

            let mut steps = 0usize;
            while candidate.bit_len() == bits {
                if is_probable_prime_with(&candidate, config.prime_rounds, rng) {
                    debug!(bits, attempt, steps, "found probable prime");
                    return Ok(candidate);
                }
                candidate += 2;
                steps += 1;
            }
            debug!(bits, attempt, steps, "prime search overflowed bit length, restarting");
        }

        Err(Error::NoSuitableCandidate {
            attempts: config.max_prime_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = TimeSeededRng::seed(1234);
        let mut b = TimeSeededRng::seed(1234);
        assert_eq!(BigNum::random(8, &mut a), BigNum::random(8, &mut b));
    }

    #[test]
    fn test_random_limb_count() {
        let mut rng = TimeSeededRng::seed(1);
        let n = BigNum::random(5, &mut rng);
        assert_eq!(n.capacity(), 5);
        assert!(n.is_positive());
    }

    #[test]
    fn test_random_bits_exact_length() {
        let mut rng = TimeSeededRng::seed(2);
        for bits in [1usize, 7, 8, 31, 32, 33, 63, 64, 65, 127, 128, 1000] {
            for _ in 0..10 {
                let n = BigNum::random_bits(bits, &mut rng);
                assert_eq!(n.bit_len(), bits);
                assert_eq!(n.capacity(), bits.div_ceil(32));
            }
        }
        assert!(BigNum::random_bits(0, &mut rng).is_zero());
    }

    #[test]
    fn test_random_max_bound() {
        let mut rng = TimeSeededRng::seed(3);
        let max = BigNum::from(1000u32);
        for _ in 0..200 {
            let n = BigNum::random_max(&max, &mut rng);
            assert!(n < max);
            assert!(!n.is_negative());
        }
        let wide = "10000000000000000000000001".parse::<BigNum>().unwrap();
        for _ in 0..50 {
            assert!(BigNum::random_max(&wide, &mut rng) < wide);
        }
    }

    #[test]
    fn test_thread_rng_is_a_source() {
        let n = BigNum::random_bits(96, &mut rand::thread_rng());
        assert_eq!(n.bit_len(), 96);
    }

    #[test]
    fn test_generate_prime() {
        let mut rng = TimeSeededRng::seed(4);
        let config = RsaConfig::default();
        for bits in [16usize, 33, 64, 100] {
            let p = BigNum::generate_prime(bits, 2, &config, &mut rng).unwrap();
            assert_eq!(p.bit_len(), bits);
            assert!(p.test_bit(bits - 1) && p.test_bit(bits - 2));
            assert!(p.is_odd());
            assert!(p.is_probable_prime(30));
        }
    }

    #[test]
    fn test_generate_prime_gives_up() {
        let mut rng = TimeSeededRng::seed(5);
        let config = RsaConfig::default().with_max_prime_attempts(0);
        assert!(matches!(
            BigNum::generate_prime(64, 2, &config, &mut rng),
            Err(Error::NoSuitableCandidate { attempts: 0 })
        ));
        assert!(BigNum::generate_prime(1, 1, &RsaConfig::default(), &mut rng).is_err());
    }
}
