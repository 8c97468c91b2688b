// Error types for the RSA core and the key envelope
// Every failure the library can report to its caller lives here

use thiserror::Error;

/// Result type alias for rsa_vault operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors produced by key generation, text encryption and key wrapping.
///
/// None of these are recoverable inside the library; callers decide
/// whether to re-prompt for a passphrase or reject the request.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Payload contains an unknown symbol or its frame headers are
    /// truncated or inconsistent
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Frame parsed but the blocks do not decrypt under this key
    #[error("Wrong key or corrupted data: {0}")]
    CryptoMismatch(String),

    /// Envelope could not be opened with the given passphrase and salt
    #[error("Authentication failed: wrong passphrase or salt")]
    AuthenticationFailure,

    /// Envelope is not valid base64 or has an impossible length
    #[error("Malformed key envelope: {0}")]
    MalformedEnvelope(String),

    /// Prime search hit its attempt bound
    #[error("Failed to find a {bits}-bit prime after {attempts} attempts")]
    PrimeGenerationFailure { bits: u32, attempts: u64 },

    /// Key material is unusable (modulus too small, exponent out of range, ...)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Caller-supplied parameter out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CryptoError {
    /// True for errors caused by the passphrase/salt pair rather than the data
    pub fn is_authentication(&self) -> bool {
        matches!(self, CryptoError::AuthenticationFailure)
    }
}
