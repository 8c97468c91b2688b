// Probable prime generation
// Random odd candidates of a fixed bit length, filtered by Miller-Rabin

use num_bigint::RandBigInt;
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use tracing::trace;

use super::bigint::{byte_length, from_bytes, mod_pow, RsaBigInt};
use crate::error::{CryptoError, Result};

/// Miller-Rabin rounds used when the caller does not choose; false
/// positive probability is at most 4^-20
pub const DEFAULT_ROUNDS: u32 = 20;

/// Uniform integer in [min, max) by rejection sampling over draws that
/// have the same byte length as `max`
pub fn random_in_range<R>(rng: &mut R, min: &RsaBigInt, max: &RsaBigInt) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if min >= max {
        return Err(CryptoError::InvalidInput(format!(
            "random range is empty: min {} >= max {}",
            min, max
        )));
    }

    let mut bytes = vec![0u8; byte_length(max)];
    loop {
        rng.fill_bytes(&mut bytes);
        let candidate = from_bytes(&bytes);
        if &candidate >= min && &candidate < max {
            return Ok(candidate);
        }
    }
}

fn check_bit_length(bit_length: u32) -> Result<()> {
    if bit_length < 2 {
        return Err(CryptoError::InvalidInput(format!(
            "cannot generate a {}-bit prime",
            bit_length
        )));
    }
    Ok(())
}

/// Random odd integer with exactly `bit_length` bits (top and bottom bit set)
pub fn random_odd<R>(rng: &mut R, bit_length: u32) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    check_bit_length(bit_length)?;
    let top = RsaBigInt::one() << (bit_length - 1);
    let candidate = rng.gen_biguint(u64::from(bit_length));
    Ok(candidate | top | RsaBigInt::one())
}

/// Miller-Rabin primality test
/// Returns true if n is probably prime
pub fn is_probable_prime<R>(rng: &mut R, n: &RsaBigInt, rounds: u32) -> bool
where
    R: RngCore + CryptoRng + ?Sized,
{
    let two = RsaBigInt::from(2u8);
    if n < &two {
        return false;
    }
    if n == &two || n == &RsaBigInt::from(3u8) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // Write n-1 as d * 2^r with d odd
    let n_minus_one = n - 1u8;
    let mut d = n_minus_one.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    let n_minus_two = n - 2u8;
    for _ in 0..rounds {
        // n >= 5 here, so [2, n-2) is never empty
        let a = match random_in_range(rng, &two, &n_minus_two) {
            Ok(a) => a,
            Err(_) => return false,
        };

        let mut x = mod_pow(&a, &d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }

        let mut witness_passed = false;
        for _ in 1..r {
            x = mod_pow(&x, &two, n);
            if x == n_minus_one {
                witness_passed = true;
                break;
            }
        }

        if !witness_passed {
            // Composite
            return false;
        }
    }

    // Probably prime
    true
}

/// Draw odd candidates of `bit_length` bits until one passes
/// `rounds` of Miller-Rabin, giving up after `max_attempts` draws
pub fn generate_probable_prime<R>(
    rng: &mut R,
    bit_length: u32,
    rounds: u32,
    max_attempts: u64,
) -> Result<RsaBigInt>
where
    R: RngCore + CryptoRng + ?Sized,
{
    check_bit_length(bit_length)?;

    for attempt in 1..=max_attempts {
        let candidate = random_odd(rng, bit_length)?;
        if is_probable_prime(rng, &candidate, rounds) {
            trace!(bit_length, attempt, "found probable prime");
            return Ok(candidate);
        }
    }

    Err(CryptoError::PrimeGenerationFailure {
        bits: bit_length,
        attempts: max_attempts,
    })
}
