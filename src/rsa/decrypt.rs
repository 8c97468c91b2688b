// RSA Decryption Implementation
// Reverses the symbol encoding and framing, then decrypts block by block

use tracing::trace;

use super::alphabet;
use super::bigint::{from_bytes, mod_pow, to_fixed_bytes};
use super::block::{block_size, unframe};
use super::keygen::RsaPrivateKey;
use crate::error::{CryptoError, Result};

/// Decrypt an already symbol-decoded frame
pub fn decrypt_frame(framed: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    let n = private_key.modulus();
    let size = block_size(n);
    let blocks = unframe(framed)?;

    let mut plaintext = Vec::with_capacity(blocks.len() * size);
    for (index, block) in blocks.iter().enumerate() {
        if block.plain_len > size {
            return Err(CryptoError::CryptoMismatch(format!(
                "block {} declares {} bytes but this key carries {} per block",
                index, block.plain_len, size
            )));
        }

        let c = from_bytes(&block.cipher);
        if &c >= n {
            return Err(CryptoError::CryptoMismatch(format!(
                "block {} is not below the modulus",
                index
            )));
        }

        let m = mod_pow(&c, private_key.exponent(), n);
        let bytes = to_fixed_bytes(&m, block.plain_len).ok_or_else(|| {
            CryptoError::CryptoMismatch(format!(
                "block {} decrypts to more than its declared {} bytes",
                index, block.plain_len
            ))
        })?;
        plaintext.extend_from_slice(&bytes);
    }

    trace!(blocks = blocks.len(), "decrypted blocks");
    Ok(plaintext)
}

/// Decrypt a payload string to raw bytes
pub fn decrypt_bytes(payload: &str, private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Err(CryptoError::MalformedCiphertext("empty payload".to_string()));
    }
    let framed = alphabet::decode(payload)?;
    decrypt_frame(&framed, private_key)
}

/// Decrypt a payload string to text
pub fn decrypt_text(payload: &str, private_key: &RsaPrivateKey) -> Result<String> {
    let plaintext = decrypt_bytes(payload, private_key)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::CryptoMismatch(format!("decrypted bytes are not UTF-8: {}", e)))
}
