// RSA Encryption Implementation
// Textbook RSA over half-modulus blocks, framed and printed in the 64-symbol alphabet
//
// Encryption is deterministic: the same text under the same key always
// yields the same payload. There is no padding scheme, so payloads are
// malleable and reveal equal blocks; wrap this in OAEP or a KEM/DEM
// construction before relying on it for semantic security.

use tracing::trace;

use super::alphabet;
use super::bigint::{from_bytes, mod_pow, to_bytes};
use super::block::{block_size, frame, split, FramedBlock};
use super::keygen::RsaPublicKey;
use crate::error::Result;

/// Encrypt raw bytes; returns the framed ciphertext before symbol encoding
pub fn encrypt_to_frame(plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    let n = public_key.modulus();
    let size = block_size(n);

    let blocks = split(plaintext, size)
        .into_iter()
        .map(|chunk| {
            // m < 2^(8 * size) < n
            let m = from_bytes(chunk);
            let c = mod_pow(&m, public_key.exponent(), n);
            FramedBlock {
                cipher: to_bytes(&c),
                plain_len: chunk.len(),
            }
        })
        .collect::<Vec<_>>();

    trace!(blocks = blocks.len(), block_size = size, "encrypted blocks");
    frame(&blocks)
}

/// Encrypt bytes using RSA public key
/// Returns the payload as a string over the 64-symbol alphabet
pub fn encrypt_bytes(plaintext: &[u8], public_key: &RsaPublicKey) -> Result<String> {
    let framed = encrypt_to_frame(plaintext, public_key)?;
    Ok(alphabet::encode(&framed))
}

/// Encrypt a string using RSA public key
pub fn encrypt_text(plaintext: &str, public_key: &RsaPublicKey) -> Result<String> {
    encrypt_bytes(plaintext.as_bytes(), public_key)
}
