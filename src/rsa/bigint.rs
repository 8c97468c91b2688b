// RSA Big Integer Operations
// Wrapper around num-bigint for RSA-specific operations

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// Create a big integer from bytes (big-endian, unsigned)
pub fn from_bytes(bytes: &[u8]) -> RsaBigInt {
    RsaBigInt::from_bytes_be(bytes)
}

/// Convert big integer to its minimal big-endian bytes.
/// Zero becomes an empty vector, never a lone 0x00.
pub fn to_bytes(n: &RsaBigInt) -> Vec<u8> {
    if n.is_zero() {
        return Vec::new();
    }
    n.to_bytes_be()
}

/// Convert big integer to exactly `len` big-endian bytes, zero-padded on the left.
/// Returns None if the value needs more than `len` bytes.
pub fn to_fixed_bytes(n: &RsaBigInt, len: usize) -> Option<Vec<u8>> {
    let bytes = to_bytes(n);
    if bytes.len() > len {
        return None;
    }
    let mut out = vec![0u8; len];
    out[len - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

/// Number of bytes in the unsigned big-endian form of `n`
pub fn byte_length(n: &RsaBigInt) -> usize {
    ((n.bits() + 7) / 8) as usize
}

/// Modular exponentiation: base^exp mod modulus
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> RsaBigInt {
    if modulus.is_one() {
        return RsaBigInt::zero();
    }
    base.modpow(exp, modulus)
}

/// Extended Euclidean Algorithm
/// Returns (gcd, x, y) such that a*x + b*y = gcd = gcd(a, b)
pub fn extended_gcd(a: &RsaBigInt, b: &RsaBigInt) -> (RsaBigInt, BigInt, BigInt) {
    let mut old_r = BigInt::from_biguint(Sign::Plus, a.clone());
    let mut r = BigInt::from_biguint(Sign::Plus, b.clone());
    let mut old_s = BigInt::one();
    let mut s = BigInt::zero();
    let mut old_t = BigInt::zero();
    let mut t = BigInt::one();

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    // old_r is non-negative: both inputs are
    (old_r.magnitude().clone(), old_s, old_t)
}

/// Compute modular inverse: a^(-1) mod m
/// Returns None if inverse doesn't exist
pub fn mod_inverse(a: &RsaBigInt, m: &RsaBigInt) -> Option<RsaBigInt> {
    if m.is_zero() || m.is_one() {
        return None;
    }

    let (gcd, x, _) = extended_gcd(a, m);
    if !gcd.is_one() {
        return None;
    }

    let m_signed = BigInt::from_biguint(Sign::Plus, m.clone());
    x.mod_floor(&m_signed).to_biguint()
}

/// Greatest common divisor
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    a.gcd(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_pow() {
        // 3^5 mod 7 = 243 mod 7 = 5
        let base = from_u64(3);
        let exp = from_u64(5);
        let modulus = from_u64(7);
        assert_eq!(mod_pow(&base, &exp, &modulus), from_u64(5));
        assert_eq!(mod_pow(&base, &exp, &from_u64(1)), from_u64(0));
    }

    #[test]
    fn test_mod_inverse() {
        // 3 * 5 = 15 ≡ 1 mod 7, so inverse of 3 mod 7 is 5
        let a = from_u64(3);
        let m = from_u64(7);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!(inv, from_u64(5));
        assert_eq!((a * inv) % m, from_u64(1));
    }

    #[test]
    fn test_mod_inverse_negative_coefficient() {
        // Bezout coefficient for 65537 mod 3120 is negative before reduction
        let e = from_u64(65537);
        let phi = from_u64(3120);
        let d = mod_inverse(&e, &phi).unwrap();
        assert!(d < phi);
        assert_eq!((&e * &d) % &phi, from_u64(1));
    }

    #[test]
    fn test_mod_inverse_missing() {
        assert!(mod_inverse(&from_u64(6), &from_u64(9)).is_none());
        assert!(mod_inverse(&from_u64(5), &from_u64(1)).is_none());
    }

    #[test]
    fn test_extended_gcd_identity() {
        let a = from_u64(240);
        let b = from_u64(46);
        let (g, x, y) = extended_gcd(&a, &b);
        assert_eq!(g, from_u64(2));
        let lhs = BigInt::from(240) * x + BigInt::from(46) * y;
        assert_eq!(lhs, BigInt::from(2));
    }

    #[test]
    fn test_to_bytes_strips_zero() {
        assert!(to_bytes(&from_u64(0)).is_empty());
        assert_eq!(to_bytes(&from_u64(0x0102)), vec![0x01, 0x02]);
    }

    #[test]
    fn test_to_fixed_bytes() {
        assert_eq!(to_fixed_bytes(&from_u64(0x0102), 4), Some(vec![0, 0, 0x01, 0x02]));
        assert_eq!(to_fixed_bytes(&from_u64(0), 2), Some(vec![0, 0]));
        assert_eq!(to_fixed_bytes(&from_u64(0x010203), 2), None);
    }

    #[test]
    fn test_byte_length() {
        assert_eq!(byte_length(&from_u64(0)), 0);
        assert_eq!(byte_length(&from_u64(0xFF)), 1);
        assert_eq!(byte_length(&from_u64(0x100)), 2);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(&from_u64(12), &from_u64(18)), from_u64(6));
    }
}
