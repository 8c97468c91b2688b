//! Passphrase envelope for the RSA private exponent.
//!
//! The private exponent is only ever stored wrapped: PBKDF2 stretches the
//! owner's passphrase into an AES-256 key, and the exponent is encrypted
//! under it with a fresh IV on every wrap.
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of stored envelopes and salts
//! - Offline guessing, slowed by 100 000 PBKDF2 rounds
//! - Tampering with authenticated envelopes
//!
//! We do NOT defend against:
//! - Compromised process memory while a key is unwrapped
//! - Wrong-passphrase detection for legacy envelopes, which have no MAC

pub mod kdf;
pub mod wrap;

pub use kdf::{derive_key, DerivedKey, Salt, KEY_LENGTH, PBKDF2_ITERATIONS};
pub use wrap::{EnvelopeFormat, KeyWrapper, IV_LENGTH};
