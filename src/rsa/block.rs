// Block framing for multi-block RSA payloads
//
// Plaintext is cut into blocks of half the modulus size. Each encrypted
// block is framed with its own length and the length of the plaintext it
// came from, so neither side depends on how a big integer trims zeros.
//
// Frame layout (u16 fields little-endian):
//   [count] ([cipher_len][plain_len]) x count [cipher bytes] x count
//
// Frames with a single length per block ([count][len] x count) are not
// compatible; their header and data run out of step and unframe reports
// MalformedCiphertext.

use super::bigint::{byte_length, RsaBigInt};
use crate::error::{CryptoError, Result};

const HEADER_FIELD: usize = 2;

/// Plaintext bytes per block for `modulus`: (L - 1) / 2 where L is the
/// modulus byte length. Any block value, even all 0xFF, stays far below
/// the modulus.
pub fn block_size(modulus: &RsaBigInt) -> usize {
    byte_length(modulus).saturating_sub(1) / 2
}

/// Split input into chunks of `block_size` bytes; the last one may be shorter
pub fn split(bytes: &[u8], block_size: usize) -> Vec<&[u8]> {
    if block_size == 0 {
        return Vec::new();
    }
    bytes.chunks(block_size).collect()
}

/// One encrypted block together with the plaintext length it restores to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedBlock {
    pub cipher: Vec<u8>,
    pub plain_len: usize,
}

fn to_u16(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        CryptoError::InvalidInput(format!("{} {} does not fit in a frame header", what, value))
    })
}

/// Serialize blocks into a single frame
pub fn frame(blocks: &[FramedBlock]) -> Result<Vec<u8>> {
    let count = to_u16(blocks.len(), "block count")?;
    let body: usize = blocks.iter().map(|b| b.cipher.len()).sum();

    let mut out = Vec::with_capacity(HEADER_FIELD * (1 + 2 * blocks.len()) + body);
    out.extend_from_slice(&count.to_le_bytes());
    for block in blocks {
        out.extend_from_slice(&to_u16(block.cipher.len(), "block length")?.to_le_bytes());
        out.extend_from_slice(&to_u16(block.plain_len, "plaintext length")?.to_le_bytes());
    }
    for block in blocks {
        out.extend_from_slice(&block.cipher);
    }
    Ok(out)
}

/// Cursor over a frame that reports truncation as malformed ciphertext
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let data = self.data;
        let end = self.offset.checked_add(len).filter(|end| *end <= data.len());
        match end {
            Some(end) => {
                let slice = &data[self.offset..end];
                self.offset = end;
                Ok(slice)
            }
            None => Err(CryptoError::MalformedCiphertext(format!(
                "frame truncated while reading {} at offset {}",
                what, self.offset
            ))),
        }
    }

    fn u16(&mut self, what: &str) -> Result<usize> {
        let bytes = self.take(HEADER_FIELD, what)?;
        Ok(usize::from(u16::from_le_bytes([bytes[0], bytes[1]])))
    }
}

/// Parse a frame produced by [`frame`]
pub fn unframe(data: &[u8]) -> Result<Vec<FramedBlock>> {
    let mut reader = Reader { data, offset: 0 };
    let count = reader.u16("block count")?;

    let mut lengths = Vec::with_capacity(count);
    for _ in 0..count {
        let cipher_len = reader.u16("block length")?;
        let plain_len = reader.u16("plaintext length")?;
        lengths.push((cipher_len, plain_len));
    }

    let mut blocks = Vec::with_capacity(count);
    for (cipher_len, plain_len) in lengths {
        let cipher = reader.take(cipher_len, "block data")?.to_vec();
        blocks.push(FramedBlock { cipher, plain_len });
    }

    if reader.offset != data.len() {
        return Err(CryptoError::MalformedCiphertext(format!(
            "{} unexpected bytes after the last block",
            data.len() - reader.offset
        )));
    }

    Ok(blocks)
}
