//! Passphrase key derivation for the private-key envelope.
//!
//! PBKDF2-HMAC-SHA256 turns a passphrase and a per-identity salt into a
//! 32-byte master key. The authenticated envelope splits that key with
//! HKDF-SHA256 so encryption and MAC never share key material.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::MIN_SALT_LENGTH;
use crate::error::{CryptoError, Result};

/// PBKDF2 rounds for stored envelopes
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Length of derived keys in bytes (AES-256)
pub const KEY_LENGTH: usize = 32;

/// Domain separation strings for HKDF
mod domain {
    pub const CIPHER_KEY: &[u8] = b"rsa-vault-envelope-cipher-v2";
    pub const MAC_KEY: &[u8] = b"rsa-vault-envelope-mac-v2";
}

/// Random salt owned by one identity, stored next to its envelope
#[derive(Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Wrap existing salt bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_SALT_LENGTH {
            return Err(CryptoError::InvalidInput(format!(
                "Salt must be at least {} bytes",
                MIN_SALT_LENGTH
            )));
        }
        Ok(Self(bytes))
    }

    /// Fresh salt of `len` bytes from the given RNG
    pub fn generate_with<R>(rng: &mut R, len: usize) -> Result<Self>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Self::new(bytes)
    }

    /// Fresh 16-byte salt from the thread RNG
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidInput(format!("Salt is not valid base64: {}", e)))?;
        Self::new(bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Salt").field(&self.to_base64()).finish()
    }
}

/// A key derived from a passphrase, zeroized when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Get a reference to the raw key bytes.
    ///
    /// Avoid storing or logging this value.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Split into independent cipher and MAC keys
    pub fn split(&self) -> Result<EnvelopeKeys> {
        let hkdf = Hkdf::<Sha256>::new(None, &self.key);

        let mut cipher_key = [0u8; KEY_LENGTH];
        hkdf.expand(domain::CIPHER_KEY, &mut cipher_key)
            .map_err(|_| CryptoError::InvalidInput("Failed to derive cipher key".to_string()))?;

        let mut mac_key = [0u8; KEY_LENGTH];
        hkdf.expand(domain::MAC_KEY, &mut mac_key)
            .map_err(|_| CryptoError::InvalidInput("Failed to derive MAC key".to_string()))?;

        Ok(EnvelopeKeys { cipher_key, mac_key })
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Cipher and MAC keys for the authenticated envelope
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EnvelopeKeys {
    pub cipher_key: [u8; KEY_LENGTH],
    pub mac_key: [u8; KEY_LENGTH],
}

/// Derive a 32-byte key from a passphrase with PBKDF2-HMAC-SHA256.
///
/// Same passphrase, salt and iteration count always give the same key.
pub fn derive_key(passphrase: &str, salt: &Salt, iterations: u32) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(CryptoError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }
    if iterations == 0 {
        return Err(CryptoError::InvalidInput(
            "PBKDF2 needs at least one iteration".to_string(),
        ));
    }

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt.as_bytes(), iterations, &mut key);
    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt(fill: u8) -> Salt {
        Salt::new(vec![fill; 16]).unwrap()
    }

    #[test]
    fn test_pbkdf2_sha256_vector() {
        // RFC 7914 section 11: PBKDF2-HMAC-SHA256("passwd", "salt", 1, 64)
        let salt = Salt(b"salt".to_vec());
        let key = derive_key("passwd", &salt, 1).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let a = derive_key("test-passphrase", &salt(1), 1_000).unwrap();
        let b = derive_key("test-passphrase", &salt(1), 1_000).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_different_inputs_different_key() {
        let base = derive_key("test-passphrase", &salt(1), 1_000).unwrap();
        let other_salt = derive_key("test-passphrase", &salt(2), 1_000).unwrap();
        let other_pass = derive_key("other-passphrase", &salt(1), 1_000).unwrap();
        let other_rounds = derive_key("test-passphrase", &salt(1), 1_001).unwrap();
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_pass.as_bytes());
        assert_ne!(base.as_bytes(), other_rounds.as_bytes());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let result = derive_key("", &salt(1), 1_000);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Passphrase cannot be empty"));
    }

    #[test]
    fn test_short_salt_rejected() {
        assert!(Salt::new(b"short".to_vec()).is_err());
        assert!(Salt::from_base64("c2hvcnQ=").is_err());
        assert!(Salt::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_salt_base64_round_trip() {
        let salt = Salt::generate();
        assert_eq!(salt.as_bytes().len(), 16);
        assert_eq!(Salt::from_base64(&salt.to_base64()).unwrap(), salt);
        assert_ne!(Salt::generate(), salt);
    }

    #[test]
    fn test_split_keys_differ() {
        let key = derive_key("test-passphrase", &salt(3), 1_000).unwrap();
        let keys = key.split().unwrap();
        assert_ne!(keys.cipher_key, keys.mac_key);
        assert_ne!(&keys.cipher_key, key.as_bytes());
    }

    #[test]
    fn test_derived_key_debug_redacts() {
        let key = derive_key("test-passphrase", &salt(4), 1_000).unwrap();
        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));
        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
