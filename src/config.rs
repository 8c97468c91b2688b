// Tunable parameters for key generation and key wrapping

use crate::envelope::EnvelopeFormat;
use crate::error::{CryptoError, Result};

/// Smallest prime size that still leaves a one-byte plaintext block
pub const MIN_PRIME_BITS: u32 = 16;
/// Largest prime size accepted; keeps frame lengths well inside u16
pub const MAX_PRIME_BITS: u32 = 8192;
/// Shortest salt accepted by the key derivation
pub const MIN_SALT_LENGTH: usize = 16;

/// Configuration shared by the key generator and the envelope
#[derive(Clone, Debug, PartialEq)]
pub struct CryptoConfig {
    pub prime_bits: u32,
    pub miller_rabin_rounds: u32,
    pub max_prime_attempts: u64,
    pub max_keypair_attempts: u32,
    pub parallel_prime_search: bool,
    pub pbkdf2_iterations: u32,
    pub salt_length: usize,
    pub envelope_format: EnvelopeFormat,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            prime_bits: 512,
            miller_rabin_rounds: 20,
            max_prime_attempts: 100_000,
            max_keypair_attempts: 16,
            parallel_prime_search: true,
            pbkdf2_iterations: 100_000,
            salt_length: MIN_SALT_LENGTH,
            envelope_format: EnvelopeFormat::Authenticated,
        }
    }
}

impl CryptoConfig {
    pub fn with_prime_bits(mut self, bits: u32) -> Self {
        self.prime_bits = bits;
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.miller_rabin_rounds = rounds;
        self
    }

    pub fn with_max_prime_attempts(mut self, attempts: u64) -> Self {
        self.max_prime_attempts = attempts;
        self
    }

    pub fn with_max_keypair_attempts(mut self, attempts: u32) -> Self {
        self.max_keypair_attempts = attempts;
        self
    }

    pub fn with_parallel_search(mut self, parallel: bool) -> Self {
        self.parallel_prime_search = parallel;
        self
    }

    pub fn with_pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.pbkdf2_iterations = iterations;
        self
    }

    pub fn with_salt_length(mut self, len: usize) -> Self {
        self.salt_length = len;
        self
    }

    pub fn with_envelope_format(mut self, format: EnvelopeFormat) -> Self {
        self.envelope_format = format;
        self
    }

    /// Reject parameter combinations the algorithms cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PRIME_BITS..=MAX_PRIME_BITS).contains(&self.prime_bits) {
            return Err(CryptoError::InvalidInput(format!(
                "Prime size must be between {} and {} bits, got {}",
                MIN_PRIME_BITS, MAX_PRIME_BITS, self.prime_bits
            )));
        }
        if self.miller_rabin_rounds == 0 {
            return Err(CryptoError::InvalidInput(
                "Miller-Rabin needs at least one round".to_string(),
            ));
        }
        if self.max_prime_attempts == 0 || self.max_keypair_attempts == 0 {
            return Err(CryptoError::InvalidInput(
                "Attempt bounds must be positive".to_string(),
            ));
        }
        if self.pbkdf2_iterations == 0 {
            return Err(CryptoError::InvalidInput(
                "PBKDF2 needs at least one iteration".to_string(),
            ));
        }
        if self.salt_length < MIN_SALT_LENGTH {
            return Err(CryptoError::InvalidInput(format!(
                "Salt must be at least {} bytes",
                MIN_SALT_LENGTH
            )));
        }
        Ok(())
    }
}
