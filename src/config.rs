// Configuration
// Tunables for key generation and the block cipher

/// Default public exponent (F4)
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 0x10001;

/// Miller-Rabin rounds used for prime generation and key validation
pub const DEFAULT_PRIME_ROUNDS: u32 = 30;

/// Configuration for key generation and validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaConfig {
    pub public_exponent: u32,
    pub prime_rounds: u32,
    /// Outer restarts of the prime search before giving up
    pub max_prime_attempts: usize,
    /// Primes drawn per factor while looking for one coprime with `e`
    pub max_coprime_attempts: usize,
    /// Prime pairs tried before key generation gives up
    pub max_key_attempts: usize,
    pub min_key_bits: usize,
    pub max_key_bits: usize,
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self {
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            prime_rounds: DEFAULT_PRIME_ROUNDS,
            max_prime_attempts: 10_000,
            max_coprime_attempts: 1_000,
            max_key_attempts: 100,
            min_key_bits: 128,
            max_key_bits: 2048,
        }
    }
}

impl RsaConfig {
    pub fn with_public_exponent(mut self, e: u32) -> Self {
        self.public_exponent = e;
        self
    }

    pub fn with_prime_rounds(mut self, rounds: u32) -> Self {
        self.prime_rounds = rounds;
        self
    }

    pub fn with_max_prime_attempts(mut self, attempts: usize) -> Self {
        self.max_prime_attempts = attempts;
        self
    }

    pub fn with_max_coprime_attempts(mut self, attempts: usize) -> Self {
        self.max_coprime_attempts = attempts;
        self
    }

    pub fn with_max_key_attempts(mut self, attempts: usize) -> Self {
        self.max_key_attempts = attempts;
        self
    }

    pub fn with_key_bits_range(mut self, min: usize, max: usize) -> Self {
        self.min_key_bits = min;
        self.max_key_bits = max;
        self
    }

    /// Check that a modulus size is usable by the block cipher.
    ///
    /// Sizes must be whole bytes so ciphertext blocks are exactly `bits / 8`
    /// bytes, and small enough that the one-byte length prefix can describe
    /// a full plaintext block.
    pub fn check_key_bits(&self, bits: usize) -> crate::Result<()> {
        if bits < self.min_key_bits || bits > self.max_key_bits {
            return Err(crate::Error::InvalidKey(format!(
                "key size must be between {} and {} bits, got {}",
                self.min_key_bits, self.max_key_bits, bits
            )));
        }
        if bits % 8 != 0 {
            return Err(crate::Error::InvalidKey(format!(
                "key size must be a multiple of 8 bits, got {}",
                bits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RsaConfig::default();
        assert_eq!(config.public_exponent, 0x10001);
        assert_eq!(config.prime_rounds, 30);
        assert_eq!(config.max_key_attempts, 100);
    }

    #[test]
    fn test_builder() {
        let config = RsaConfig::default()
            .with_public_exponent(3)
            .with_prime_rounds(5)
            .with_key_bits_range(64, 512);
        assert_eq!(config.public_exponent, 3);
        assert_eq!(config.prime_rounds, 5);
        assert!(config.check_key_bits(64).is_ok());
        assert!(config.check_key_bits(1024).is_err());
    }

    #[test]
    fn test_key_bits_must_be_whole_bytes() {
        let config = RsaConfig::default();
        assert!(config.check_key_bits(128).is_ok());
        assert!(config.check_key_bits(130).is_err());
        assert!(config.check_key_bits(64).is_err());
    }
}
