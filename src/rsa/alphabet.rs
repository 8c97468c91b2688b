// Printable 64-symbol encoding for framed ciphertext
// Bytes are read as a bit stream and emitted six bits per symbol

use crate::error::{CryptoError, Result};

/// Symbol table; a symbol's index is the 6-bit value it carries
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@";

const INVALID: u8 = 0xFF;

/// Reverse lookup, built once at compile time
const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encode bytes; a trailing partial group is filled with zero bits after the data
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8 + 5) / 6);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= 6 {
            bits -= 6;
            out.push(char::from(ALPHABET[((acc >> bits) & 0x3F) as usize]));
        }
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(char::from(ALPHABET[((acc << (6 - bits)) & 0x3F) as usize]));
    }

    out
}

/// Decode symbols back into bytes; incomplete trailing bits are dropped
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 6 / 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for (position, ch) in text.chars().enumerate() {
        let value = u8::try_from(ch)
            .ok()
            .map(|b| DECODE_TABLE[usize::from(b)])
            .filter(|v| *v != INVALID)
            .ok_or_else(|| {
                CryptoError::MalformedCiphertext(format!(
                    "invalid symbol {:?} at position {}",
                    ch, position
                ))
            })?;

        acc = (acc << 6) | u32::from(value);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xFF) as u8);
        }
        acc &= (1 << bits) - 1;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_unique() {
        let mut seen = [false; 256];
        for &c in ALPHABET.iter() {
            assert!(!seen[c as usize], "duplicate symbol {}", c as char);
            seen[c as usize] = true;
        }
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(&[]), "");
        // 0x00 -> 000000 00(0000) -> "AA"
        assert_eq!(encode(&[0x00]), "AA");
        // 0xFF -> 111111 11(0000) -> '@' then 110000 = 48 = 'w'
        assert_eq!(encode(&[0xFF]), "@w");
        // three bytes fill four symbols exactly
        assert_eq!(encode(&[0xFF, 0xFF, 0xFF]), "@@@@");
        // frame of zero blocks
        assert_eq!(encode(&[0x00, 0x00]), "AAA");
    }

    #[test]
    fn test_decode_recovers_length() {
        for len in 0..20usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            assert_eq!(decode(&encode(&data)).unwrap(), data, "length {}", len);
        }
    }

    #[test]
    fn test_decode_rejects_unknown_symbol() {
        for bad in ["AB=C", "AAA ", "ABCé", "+/"] {
            assert!(matches!(decode(bad), Err(CryptoError::MalformedCiphertext(_))));
        }
    }

    #[test]
    fn test_decode_short_input() {
        // Fewer than eight bits decode to nothing
        assert!(decode("A").unwrap().is_empty());
    }
}
