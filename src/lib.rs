//! Block RSA text encryption with passphrase-wrapped private keys.
//!
//! The crate generates RSA key pairs from Miller-Rabin probable primes,
//! encrypts text of any length block by block into a printable 64-symbol
//! payload, and keeps the private exponent at rest only inside a
//! PBKDF2/AES envelope.
//!
//! Keys are plain immutable values. Each call receives the exponents it
//! needs explicitly, so concurrent callers never share key state.
//!
//! ```no_run
//! use rsa_vault::envelope::Salt;
//!
//! let keys = rsa_vault::generate_key_pair(512)?;
//! let (e, d, n) = (
//!     keys.public_key.exponent(),
//!     keys.private_key.exponent(),
//!     keys.public_key.modulus(),
//! );
//!
//! let payload = rsa_vault::encrypt("Hello, World!", e, n)?;
//! assert_eq!(rsa_vault::decrypt(&payload, d, n)?, "Hello, World!");
//!
//! let salt = Salt::generate();
//! let envelope = rsa_vault::wrap_private_key(d, "master password", &salt)?;
//! assert_eq!(&rsa_vault::unwrap_private_key(&envelope, "master password", &salt)?, d);
//! # Ok::<(), rsa_vault::CryptoError>(())
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod keystore;
pub mod rsa;

pub use config::CryptoConfig;
pub use envelope::{EnvelopeFormat, KeyWrapper, Salt};
pub use error::{CryptoError, Result};
pub use keystore::StoredKeyPair;
pub use rsa::{RsaBigInt, RsaKeyPair, RsaPrivateKey, RsaPublicKey};

/// Generate a key pair from two `prime_bits`-bit primes with e = 65537
pub fn generate_key_pair(prime_bits: u32) -> Result<RsaKeyPair> {
    rsa::generate_keypair(prime_bits)
}

/// Encrypt text under (public exponent, modulus)
pub fn encrypt(text: &str, public_exponent: &RsaBigInt, modulus: &RsaBigInt) -> Result<String> {
    let key = RsaPublicKey::new(public_exponent.clone(), modulus.clone())?;
    rsa::encrypt_text(text, &key)
}

/// Decrypt a payload under (private exponent, modulus).
///
/// An exponent that cannot belong to `modulus`, such as one recovered from
/// an unauthenticated envelope with the wrong passphrase, is reported as
/// [`CryptoError::CryptoMismatch`].
pub fn decrypt(payload: &str, private_exponent: &RsaBigInt, modulus: &RsaBigInt) -> Result<String> {
    let key = RsaPrivateKey::new(private_exponent.clone(), modulus.clone()).map_err(|e| match e {
        CryptoError::InvalidKey(msg) => CryptoError::CryptoMismatch(msg),
        other => other,
    })?;
    rsa::decrypt_text(payload, &key)
}

/// Wrap a private exponent into a base64 envelope
pub fn wrap_private_key(private_exponent: &RsaBigInt, passphrase: &str, salt: &Salt) -> Result<String> {
    KeyWrapper::default().wrap(private_exponent, passphrase, salt)
}

/// Recover a private exponent from its envelope
pub fn unwrap_private_key(envelope: &str, passphrase: &str, salt: &Salt) -> Result<RsaBigInt> {
    KeyWrapper::default().unwrap(envelope, passphrase, salt)
}
