// RSA Key Generation
// Key material, generation from random primes, validation and demotion

use std::fmt;

use tracing::{debug, info};

use crate::bignum::{gcd, is_probable_prime_with, lcm, mod_inverse, BigNum, RandomSource};
use crate::config::RsaConfig;
use crate::error::{Error, Result};

/// RSA Public Key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    pub bits: usize,   // Modulus size the key was generated for
    pub n: BigNum,     // Modulus
    pub e: BigNum,     // Public exponent
}

/// RSA Private Key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    pub bits: usize,
    pub p: BigNum,     // First prime factor
    pub q: BigNum,     // Second prime factor
    pub n: BigNum,     // Modulus
    pub e: BigNum,     // Public exponent
    pub d: BigNum,     // Private exponent
    // CRT parameters
    pub dp: BigNum,    // d mod (p-1)
    pub dq: BigNum,    // d mod (q-1)
    pub qinv: BigNum,  // q^(-1) mod p
}

/// Which half of a key pair a key file or key value holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Private,
    Public,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Private => f.write_str("private"),
            KeyKind::Public => f.write_str("public"),
        }
    }
}

/// A loaded or generated key.
///
/// A public key carries no private fields at all, so demoting a private key
/// drops its secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RsaKey {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

impl RsaPublicKey {
    pub fn new(bits: usize, n: BigNum, e: BigNum) -> Self {
        Self { bits, n, e }
    }

    /// Encrypt the integer `m`; requires `0 <= m < n`
    pub fn encrypt_integer(&self, m: &BigNum) -> Result<BigNum> {
        if (m.is_negative() && !m.is_zero()) || *m >= self.n {
            return Err(Error::MessageTooLarge {
                len: m.active_bytes(),
                max: self.n.active_bytes(),
            });
        }
        m.mod_pow(&self.e, &self.n)
    }
}

impl RsaPrivateKey {
    /// Derive the full private key from two primes and a public exponent.
    ///
    /// Fails if `e` has no inverse modulo `lcm(p - 1, q - 1)` or `q` has no
    /// inverse modulo `p`.
    pub fn from_primes(p: BigNum, q: BigNum, e: BigNum) -> Result<Self> {
        let one = BigNum::one();
        let p_minus_1 = &p - &one;
        let q_minus_1 = &q - &one;

        // Step 1: n = p * q
        let n = &p * &q;

        // Step 2: λ(n) = lcm(p-1, q-1)
        let lambda = lcm(&p_minus_1, &q_minus_1);

        // Step 3: d = e^(-1) mod λ(n)
        let d = mod_inverse(&e, &lambda);
        if d.is_zero() {
            return Err(Error::InvalidKey(
                "public exponent has no inverse modulo lcm(p-1, q-1)".to_string(),
            ));
        }

        // Step 4: CRT parameters
        let dp = d.checked_rem(&p_minus_1)?;
        let dq = d.checked_rem(&q_minus_1)?;
        let qinv = mod_inverse(&q, &p);
        if qinv.is_zero() {
            return Err(Error::InvalidKey("q has no inverse modulo p".to_string()));
        }

        Ok(Self {
            bits: n.bit_len(),
            p,
            q,
            n,
            e,
            d,
            dp,
            dq,
            qinv,
        })
    }

    /// Public half of this key
    pub fn to_public(&self) -> RsaPublicKey {
        RsaPublicKey::new(self.bits, self.n.clone(), self.e.clone())
    }

    /// `c^d mod n`, evaluated with the CRT parameters
    pub fn decrypt_integer(&self, c: &BigNum) -> Result<BigNum> {
        if (c.is_negative() && !c.is_zero()) || *c >= self.n {
            return Err(Error::MalformedBlock(
                "ciphertext is not smaller than the modulus".to_string(),
            ));
        }

        // m1 = c^dp mod p, m2 = c^dq mod q
        let m1 = c.mod_pow(&self.dp, &self.p)?;
        let m2 = c.mod_pow(&self.dq, &self.q)?;

        // h = (m1 - m2) * qinv mod p
        let mut h = (&m1 - &m2).checked_rem(&self.p)?;
        if h.is_negative() && !h.is_zero() {
            h += &self.p;
        }
        h = (&h * &self.qinv).checked_rem(&self.p)?;

        // m = m2 + q * h
        Ok(&m2 + &(&self.q * &h))
    }

    /// Structural check: both factors probably prime, `n == p * q`, and
    /// both factors coprime with `e`
    pub fn is_valid_with<R: RandomSource + ?Sized>(&self, rounds: u32, rng: &mut R) -> bool {
        let one = BigNum::one();
        is_probable_prime_with(&self.p, rounds, rng)
            && is_probable_prime_with(&self.q, rounds, rng)
            && self.n == &self.p * &self.q
            && gcd(&self.p, &self.e) == one
            && gcd(&self.q, &self.e) == one
    }
}

impl RsaKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            RsaKey::Private(_) => KeyKind::Private,
            RsaKey::Public(_) => KeyKind::Public,
        }
    }

    pub fn bits(&self) -> usize {
        match self {
            RsaKey::Private(key) => key.bits,
            RsaKey::Public(key) => key.bits,
        }
    }

    pub fn modulus(&self) -> &BigNum {
        match self {
            RsaKey::Private(key) => &key.n,
            RsaKey::Public(key) => &key.n,
        }
    }

    pub fn exponent(&self) -> &BigNum {
        match self {
            RsaKey::Private(key) => &key.e,
            RsaKey::Public(key) => &key.e,
        }
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        match self {
            RsaKey::Private(key) => Some(key),
            RsaKey::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> RsaPublicKey {
        match self {
            RsaKey::Private(key) => key.to_public(),
            RsaKey::Public(key) => key.clone(),
        }
    }

    /// Turn a private key into its public half, discarding the secrets
    pub fn demote(self) -> RsaKey {
        match self {
            RsaKey::Private(key) => RsaKey::Public(key.to_public()),
            public => public,
        }
    }

    /// Validate with the given Miller-Rabin round count; public keys are
    /// always accepted
    pub fn is_valid_with<R: RandomSource + ?Sized>(&self, rounds: u32, rng: &mut R) -> bool {
        match self {
            RsaKey::Private(key) => key.is_valid_with(rounds, rng),
            RsaKey::Public(_) => true,
        }
    }

    pub fn is_valid(&self, rounds: u32) -> bool {
        self.is_valid_with(rounds, &mut rand::thread_rng())
    }
}

impl From<RsaPrivateKey> for RsaKey {
    fn from(key: RsaPrivateKey) -> Self {
        RsaKey::Private(key)
    }
}

impl From<RsaPublicKey> for RsaKey {
    fn from(key: RsaPublicKey) -> Self {
        RsaKey::Public(key)
    }
}

/// Draw `bits`-bit primes until one gives a usable factor for exponent `e`
fn generate_factor<R: RandomSource + ?Sized>(
    bits: usize,
    e: &BigNum,
    config: &RsaConfig,
    rng: &mut R,
) -> Result<BigNum> {
    let one = BigNum::one();
    for attempt in 0..config.max_coprime_attempts {
        let candidate = BigNum::generate_prime(bits, 2, config, rng)?;
        if gcd(&candidate, e) == one && gcd(&(&candidate - &one), e) == one {
            return Ok(candidate);
        }
        debug!(bits, attempt, "prime rejected, not coprime with public exponent");
    }
    Err(Error::NoSuitableCandidate {
        attempts: config.max_coprime_attempts,
    })
}

/// Generate an RSA key with a modulus of exactly `bits` bits
///
/// `p` gets the larger half of the bits and both primes have their top two
/// bits set, so their product always fills the requested size.
pub fn generate_key<R: RandomSource + ?Sized>(
    bits: usize,
    config: &RsaConfig,
    rng: &mut R,
) -> Result<RsaPrivateKey> {
    config.check_key_bits(bits)?;
    let e = BigNum::from(config.public_exponent);
    if config.public_exponent < 3 || e.is_even() {
        return Err(Error::InvalidKey(format!(
            "public exponent must be odd and at least 3, got {}",
            config.public_exponent
        )));
    }

    let bits_p = (bits + 1) / 2;
    let bits_q = bits - bits_p;
    info!(bits, bits_p, bits_q, "generating RSA key");

    for attempt in 0..config.max_key_attempts {
        let p = generate_factor(bits_p, &e, config, rng)?;
        let q = generate_factor(bits_q, &e, config, rng)?;
        if p == q {
            debug!(attempt, "drew the same prime twice, retrying");
            continue;
        }

        match RsaPrivateKey::from_primes(p, q, e.clone()) {
            Ok(mut key) => {
                key.bits = bits;
                info!(bits, "RSA key generated");
                return Ok(key);
            }
            Err(err) => debug!(attempt, %err, "key derivation failed, retrying"),
        }
    }

    Err(Error::NoSuitableCandidate {
        attempts: config.max_key_attempts,
    })
}
