// PMZ RSA
// Arbitrary-precision integers and textbook RSA built on them

pub mod bignum;
pub mod config;
pub mod error;
pub mod rsa;
pub mod util;

pub use bignum::{BigNum, RandomSource, Sign, TimeSeededRng};
pub use config::RsaConfig;
pub use error::{Error, Result};
pub use rsa::{RsaCipher, RsaKey, RsaPrivateKey, RsaPublicKey};
