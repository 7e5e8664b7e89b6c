// Big Integer Module
// Multi-precision signed integers and the number theory built on them

pub mod arith;
pub mod bigint;
pub mod buffer;
pub mod convert;
pub mod division;
pub mod number_theory;
pub mod prime;
pub mod random;

pub use bigint::{BigNum, Sign};
pub use buffer::{DigitStore, Limb, LIMB_BITS, LIMB_BYTES};
pub use number_theory::{checked_mod_inverse, gcd, lcm, mod_inverse, mod_pow};
pub use prime::{is_probable_prime, is_probable_prime_with, miller_rabin, SMALL_PRIMES};
pub use random::{RandomSource, TimeSeededRng};
