//! Wrapping the RSA private exponent under a passphrase.
//!
//! Authenticated format (written by default):
//!
//! ```text
//! base64( 0x02 || iv[16] || AES-256-CBC-PKCS7(d) || HMAC-SHA256(0x02 || iv || ct)[32] )
//! ```
//!
//! Legacy format (still readable, writable on request):
//!
//! ```text
//! base64( iv[16] || AES-256-CBC-PKCS7(d) )
//! ```
//!
//! The legacy format carries no MAC. A wrong passphrase that happens to
//! produce valid padding yields a wrong exponent instead of an error, and
//! the mistake only surfaces when the next decryption fails.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use num_traits::Zero;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::kdf::{derive_key, Salt, PBKDF2_ITERATIONS};
use crate::config::CryptoConfig;
use crate::error::{CryptoError, Result};
use crate::rsa::bigint::{from_bytes, to_bytes, RsaBigInt};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// IV length for AES-CBC
pub const IV_LENGTH: usize = 16;
const BLOCK_LENGTH: usize = 16;
const TAG_LENGTH: usize = 32;
const VERSION_AUTHENTICATED: u8 = 0x02;

/// On-disk envelope layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeFormat {
    /// IV and CBC ciphertext only
    Legacy,
    /// Versioned, with an HMAC over IV and ciphertext
    Authenticated,
}

/// Wraps and unwraps private exponents with a fixed PBKDF2 cost
#[derive(Debug, Clone)]
pub struct KeyWrapper {
    iterations: u32,
    format: EnvelopeFormat,
}

impl Default for KeyWrapper {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
            format: EnvelopeFormat::Authenticated,
        }
    }
}

fn aes_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidInput("bad AES key or IV length".to_string()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn aes_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LENGTH != 0 {
        return Err(CryptoError::MalformedEnvelope(
            "ciphertext is not a whole number of AES blocks".to_string(),
        ));
    }
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidInput("bad AES key or IV length".to_string()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationFailure)
}

fn new_mac(key: &[u8]) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|_| CryptoError::InvalidInput("bad MAC key length".to_string()))
}

/// Parse decrypted exponent bytes; zero is never a usable exponent
fn exponent_from_bytes(bytes: &[u8]) -> Result<RsaBigInt> {
    let d = from_bytes(bytes);
    if d.is_zero() {
        return Err(CryptoError::AuthenticationFailure);
    }
    Ok(d)
}

impl KeyWrapper {
    pub fn new(iterations: u32, format: EnvelopeFormat) -> Self {
        Self { iterations, format }
    }

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self::new(config.pbkdf2_iterations, config.envelope_format)
    }

    pub fn format(&self) -> EnvelopeFormat {
        self.format
    }

    /// Encrypt `private_exponent` under a key derived from passphrase and salt.
    /// A fresh IV is drawn on every call, so wrapping twice never repeats.
    pub fn wrap_with<R>(
        &self,
        rng: &mut R,
        private_exponent: &RsaBigInt,
        passphrase: &str,
        salt: &Salt,
    ) -> Result<String>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        if private_exponent.is_zero() {
            return Err(CryptoError::InvalidKey("private exponent is zero".to_string()));
        }

        let master = derive_key(passphrase, salt, self.iterations)?;
        let mut iv = [0u8; IV_LENGTH];
        rng.fill_bytes(&mut iv);

        // Minimal big-endian bytes; BigUint carries no sign byte
        let plaintext = Zeroizing::new(to_bytes(private_exponent));

        let envelope = match self.format {
            EnvelopeFormat::Legacy => {
                let ciphertext = aes_encrypt(master.as_bytes(), &iv, &plaintext)?;
                let mut out = Vec::with_capacity(IV_LENGTH + ciphertext.len());
                out.extend_from_slice(&iv);
                out.extend_from_slice(&ciphertext);
                out
            }
            EnvelopeFormat::Authenticated => {
                let keys = master.split()?;
                let ciphertext = aes_encrypt(&keys.cipher_key, &iv, &plaintext)?;

                let mut out = Vec::with_capacity(1 + IV_LENGTH + ciphertext.len() + TAG_LENGTH);
                out.push(VERSION_AUTHENTICATED);
                out.extend_from_slice(&iv);
                out.extend_from_slice(&ciphertext);

                let mut mac = new_mac(&keys.mac_key)?;
                mac.update(&out);
                out.extend_from_slice(&mac.finalize().into_bytes());
                out
            }
        };

        debug!(format = ?self.format, "wrapped private key");
        Ok(STANDARD.encode(envelope))
    }

    /// Wrap using the thread RNG
    pub fn wrap(&self, private_exponent: &RsaBigInt, passphrase: &str, salt: &Salt) -> Result<String> {
        self.wrap_with(&mut rand::thread_rng(), private_exponent, passphrase, salt)
    }

    /// Recover the private exponent from an envelope of either format
    pub fn unwrap(&self, envelope: &str, passphrase: &str, salt: &Salt) -> Result<RsaBigInt> {
        let raw = STANDARD
            .decode(envelope.trim())
            .map_err(|e| CryptoError::MalformedEnvelope(format!("not valid base64: {}", e)))?;

        match raw.len() % BLOCK_LENGTH {
            1 if raw[0] == VERSION_AUTHENTICATED
                && raw.len() >= 1 + IV_LENGTH + BLOCK_LENGTH + TAG_LENGTH =>
            {
                self.unwrap_authenticated(&raw, passphrase, salt)
            }
            0 if raw.len() >= IV_LENGTH + BLOCK_LENGTH => self.unwrap_legacy(&raw, passphrase, salt),
            _ => Err(CryptoError::MalformedEnvelope(format!(
                "unrecognized envelope of {} bytes",
                raw.len()
            ))),
        }
    }

    fn unwrap_authenticated(&self, raw: &[u8], passphrase: &str, salt: &Salt) -> Result<RsaBigInt> {
        let (body, tag) = raw.split_at(raw.len() - TAG_LENGTH);
        let keys = derive_key(passphrase, salt, self.iterations)?.split()?;

        let mut mac = new_mac(&keys.mac_key)?;
        mac.update(body);
        mac.verify_slice(tag)
            .map_err(|_| CryptoError::AuthenticationFailure)?;

        let (iv, ciphertext) = body[1..].split_at(IV_LENGTH);
        let plaintext = aes_decrypt(&keys.cipher_key, iv, ciphertext)?;
        exponent_from_bytes(&plaintext)
    }

    fn unwrap_legacy(&self, raw: &[u8], passphrase: &str, salt: &Salt) -> Result<RsaBigInt> {
        warn!("opening unauthenticated legacy key envelope; rewrap to upgrade");
        let (iv, ciphertext) = raw.split_at(IV_LENGTH);
        let key = derive_key(passphrase, salt, self.iterations)?;
        let plaintext = aes_decrypt(key.as_bytes(), iv, ciphertext)?;
        exponent_from_bytes(&plaintext)
    }

    /// Re-encrypt under a new passphrase and salt with a fresh IV,
    /// in this wrapper's format
    pub fn rewrap(
        &self,
        envelope: &str,
        old_passphrase: &str,
        old_salt: &Salt,
        new_passphrase: &str,
        new_salt: &Salt,
    ) -> Result<String> {
        let private_exponent = self.unwrap(envelope, old_passphrase, old_salt)?;
        self.wrap(&private_exponent, new_passphrase, new_salt)
    }
}
