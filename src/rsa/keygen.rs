// RSA Key Generation
// Implements RSA key pair generation (public and private keys)

use std::fmt;
use std::panic;
use std::time::Instant;

use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use super::bigint::{byte_length, from_u64, gcd, mod_inverse, RsaBigInt};
use super::prime::generate_probable_prime;
use crate::config::CryptoConfig;
use crate::error::{CryptoError, Result};

/// Fixed public exponent
pub const PUBLIC_EXPONENT: u64 = 65537;

/// RSA Public Key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    n: RsaBigInt, // Modulus
    e: RsaBigInt, // Public exponent
}

/// RSA Private Key
///
/// Holds only the modulus and the private exponent; the prime factors
/// are discarded once the key pair is built.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    n: RsaBigInt, // Modulus (same as public)
    d: RsaBigInt, // Private exponent
}

/// RSA Key Pair (both public and private keys)
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    pub public_key: RsaPublicKey,
    pub private_key: RsaPrivateKey,
    pub prime_bits: u32,
}

/// Shared validation for both halves of a key
fn check_modulus(n: &RsaBigInt) -> Result<()> {
    // Block size (L - 1) / 2 must be at least one byte
    if byte_length(n) < 3 {
        return Err(CryptoError::InvalidKey(format!(
            "modulus {} is too small to carry a plaintext block",
            n
        )));
    }
    Ok(())
}

fn check_exponent(x: &RsaBigInt, n: &RsaBigInt, name: &str) -> Result<()> {
    if x <= &RsaBigInt::one() || x >= n {
        return Err(CryptoError::InvalidKey(format!(
            "{} exponent must lie in (1, modulus)",
            name
        )));
    }
    Ok(())
}

fn parse_decimal(value: &str, name: &str) -> Result<RsaBigInt> {
    RsaBigInt::parse_bytes(value.trim().as_bytes(), 10)
        .ok_or_else(|| CryptoError::InvalidKey(format!("{} is not a decimal integer", name)))
}

impl RsaPublicKey {
    pub fn new(e: RsaBigInt, n: RsaBigInt) -> Result<Self> {
        check_modulus(&n)?;
        check_exponent(&e, &n, "public")?;
        Ok(Self { n, e })
    }

    /// Parse the decimal-string form used by storage
    pub fn from_decimal(e: &str, n: &str) -> Result<Self> {
        Self::new(parse_decimal(e, "public exponent")?, parse_decimal(n, "modulus")?)
    }

    /// (public exponent, modulus) as decimal strings
    pub fn to_decimal(&self) -> (String, String) {
        (self.e.to_str_radix(10), self.n.to_str_radix(10))
    }

    pub fn modulus(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn exponent(&self) -> &RsaBigInt {
        &self.e
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    /// Encrypt a string using this public key
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        super::encrypt::encrypt_text(plaintext, self)
    }
}

impl RsaPrivateKey {
    pub fn new(d: RsaBigInt, n: RsaBigInt) -> Result<Self> {
        check_modulus(&n)?;
        check_exponent(&d, &n, "private")?;
        Ok(Self { n, d })
    }

    pub fn modulus(&self) -> &RsaBigInt {
        &self.n
    }

    pub fn exponent(&self) -> &RsaBigInt {
        &self.d
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    /// Decrypt a payload produced by the matching public key
    pub fn decrypt(&self, payload: &str) -> Result<String> {
        super::decrypt::decrypt_text(payload, self)
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("n", &self.n)
            .field("d", &"[REDACTED]")
            .finish()
    }
}

impl RsaKeyPair {
    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.public_key.bit_length()
    }
}

/// Search for p and q, on two threads when the config asks for it.
///
/// In parallel mode each thread gets its own ChaCha20 stream seeded from
/// `rng`, so a seeded caller still gets a reproducible pair.
fn generate_prime_pair<R>(rng: &mut R, config: &CryptoConfig) -> Result<(RsaBigInt, RsaBigInt)>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let bits = config.prime_bits;
    let rounds = config.miller_rabin_rounds;
    let attempts = config.max_prime_attempts;

    if !config.parallel_prime_search {
        let p = generate_probable_prime(rng, bits, rounds, attempts)?;
        let q = generate_probable_prime(rng, bits, rounds, attempts)?;
        return Ok((p, q));
    }

    let mut seeds = [[0u8; 32]; 2];
    for seed in seeds.iter_mut() {
        rng.fill_bytes(seed);
    }
    let search = |seed: [u8; 32]| {
        move || {
            let mut thread_rng = ChaCha20Rng::from_seed(seed);
            generate_probable_prime(&mut thread_rng, bits, rounds, attempts)
        }
    };

    std::thread::scope(|s| -> Result<(RsaBigInt, RsaBigInt)> {
        let p = s.spawn(search(seeds[0]));
        let q = s.spawn(search(seeds[1]));
        let p = p.join().unwrap_or_else(|e| panic::resume_unwind(e))?;
        let q = q.join().unwrap_or_else(|e| panic::resume_unwind(e))?;
        Ok((p, q))
    })
}

/// Generate an RSA key pair from two primes of `config.prime_bits` bits
/// each, using the fixed public exponent 65537.
///
/// The prime pair is drawn again when p = q or gcd(e, φ(n)) ≠ 1.
pub fn generate_keypair_with<R>(rng: &mut R, config: &CryptoConfig) -> Result<RsaKeyPair>
where
    R: RngCore + CryptoRng + ?Sized,
{
    config.validate()?;
    let start = Instant::now();
    let e = from_u64(PUBLIC_EXPONENT);

    for attempt in 1..=config.max_keypair_attempts {
        // Step 1: Generate two random primes p and q
        let (p, q) = generate_prime_pair(rng, config)?;
        if p == q {
            debug!(attempt, "drew identical primes, retrying");
            continue;
        }

        // Step 2: Compute n = p * q and φ(n) = (p-1)(q-1)
        let n = &p * &q;
        let phi_n = (&p - 1u8) * (&q - 1u8);

        // Step 3: Verify e and φ(n) are coprime
        if !gcd(&e, &phi_n).is_one() {
            debug!(attempt, "public exponent shares a factor with phi, retrying");
            continue;
        }

        // Step 4: Compute d = e^(-1) mod φ(n)
        let d = match mod_inverse(&e, &phi_n) {
            Some(d) if !d.is_zero() => d,
            _ => continue,
        };

        debug!(
            prime_bits = config.prime_bits,
            modulus_bits = n.bits(),
            attempt,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generated RSA key pair"
        );

        return Ok(RsaKeyPair {
            public_key: RsaPublicKey::new(e.clone(), n.clone())?,
            private_key: RsaPrivateKey::new(d, n)?,
            prime_bits: config.prime_bits,
        });
    }

    Err(CryptoError::PrimeGenerationFailure {
        bits: config.prime_bits,
        attempts: u64::from(config.max_keypair_attempts),
    })
}

/// Generate RSA key pair with two `prime_bits`-bit primes
pub fn generate_keypair(prime_bits: u32) -> Result<RsaKeyPair> {
    let config = CryptoConfig::default().with_prime_bits(prime_bits);
    generate_keypair_with(&mut rand::thread_rng(), &config)
}

/// Generate RSA key pair with default settings (512-bit primes, e=65537)
pub fn generate_default_keypair() -> Result<RsaKeyPair> {
    generate_keypair_with(&mut rand::thread_rng(), &CryptoConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CryptoConfig {
        CryptoConfig::default()
            .with_prime_bits(128)
            .with_parallel_search(false)
    }

    #[test]
    fn test_key_generation() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let keypair = generate_keypair_with(&mut rng, &small_config()).unwrap();

        assert!(keypair.bit_length() >= 255 && keypair.bit_length() <= 256);
        assert_eq!(keypair.public_key.exponent(), &from_u64(65537));
        assert_eq!(keypair.public_key.modulus(), keypair.private_key.modulus());
    }

    /// Every draw returns the same byte
    struct ConstantRng(u8);

    impl RngCore for ConstantRng {
        fn next_u32(&mut self) -> u32 {
            u32::from_le_bytes([self.0; 4])
        }

        fn next_u64(&mut self) -> u64 {
            u64::from_le_bytes([self.0; 8])
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ConstantRng {}

    #[test]
    fn test_key_generation_is_reproducible_with_seed() {
        for config in [small_config(), small_config().with_parallel_search(true)] {
            let a = generate_keypair_with(&mut ChaCha20Rng::seed_from_u64(9), &config).unwrap();
            let b = generate_keypair_with(&mut ChaCha20Rng::seed_from_u64(9), &config).unwrap();
            assert_eq!(a.public_key, b.public_key);
            assert_eq!(a.private_key, b.private_key);
        }
    }

    #[test]
    fn test_default_config_honours_seeded_rng() {
        let config = CryptoConfig::default().with_prime_bits(64);
        assert!(config.parallel_prime_search);
        let a = generate_keypair_with(&mut ChaCha20Rng::seed_from_u64(9), &config).unwrap();
        let b = generate_keypair_with(&mut ChaCha20Rng::seed_from_u64(9), &config).unwrap();
        assert_eq!(a.public_key.modulus(), b.public_key.modulus());
    }

    #[test]
    fn test_keypair_attempt_bound() {
        // Both search threads get the same seed, so p = q on every attempt
        let config = CryptoConfig::default()
            .with_prime_bits(64)
            .with_max_keypair_attempts(3);
        let result = generate_keypair_with(&mut ConstantRng(0x5A), &config);
        assert!(matches!(
            result,
            Err(CryptoError::PrimeGenerationFailure { bits: 64, attempts: 3 })
        ));
    }

    #[test]
    fn test_key_properties() {
        // Replaying the seed reproduces the primes the generator drew
        let config = CryptoConfig::default().with_parallel_search(false);
        let keypair = generate_keypair_with(&mut ChaCha20Rng::seed_from_u64(4), &config).unwrap();

        let mut replay = ChaCha20Rng::seed_from_u64(4);
        let p = generate_probable_prime(&mut replay, 512, 20, config.max_prime_attempts).unwrap();
        let q = generate_probable_prime(&mut replay, 512, 20, config.max_prime_attempts).unwrap();

        // Verify n = p * q
        assert_eq!(keypair.public_key.modulus(), &(&p * &q));
        assert!((1017..=1024).contains(&keypair.bit_length()));

        // Verify e * d ≡ 1 (mod φ(n))
        let phi_n = (&p - 1u8) * (&q - 1u8);
        let product = keypair.public_key.exponent() * keypair.private_key.exponent();
        assert_eq!(product % &phi_n, from_u64(1));
    }

    #[test]
    fn test_parallel_key_generation() {
        let config = CryptoConfig::default().with_prime_bits(128);
        let keypair = generate_keypair_with(&mut rand::thread_rng(), &config).unwrap();
        assert!(keypair.bit_length() >= 255);
    }

    #[test]
    fn test_key_encrypt_decrypt() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let keypair = generate_keypair_with(&mut rng, &small_config()).unwrap();
        let message = "Hello, RSA!";

        let ciphertext = keypair.public_key.encrypt(message).unwrap();
        let decrypted = keypair.private_key.decrypt(&ciphertext).unwrap();

        assert_eq!(message, decrypted);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let config = small_config().with_prime_bits(4);
        assert!(matches!(
            generate_keypair_with(&mut rng, &config),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_public_key_decimal_round_trip() {
        let key = RsaPublicKey::new(from_u64(65537), from_u64(3_233_000_017)).unwrap();
        let (e, n) = key.to_decimal();
        assert_eq!(e, "65537");
        assert_eq!(n, "3233000017");
        assert_eq!(RsaPublicKey::from_decimal(&e, &n).unwrap(), key);
    }

    #[test]
    fn test_rejects_bad_key_values() {
        assert!(RsaPublicKey::from_decimal("65537", "not-a-number").is_err());
        // Two-byte modulus leaves no room for a block
        assert!(RsaPublicKey::new(from_u64(3), from_u64(3233)).is_err());
        // Exponent must be below the modulus
        assert!(RsaPrivateKey::new(from_u64(5_000_000_000), from_u64(3_233_000_017)).is_err());
        assert!(RsaPrivateKey::new(from_u64(1), from_u64(3_233_000_017)).is_err());
    }

    #[test]
    fn test_private_key_debug_redacts() {
        let key = RsaPrivateKey::new(from_u64(123_456_789), from_u64(3_233_000_017)).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("123456789"));
    }
}
