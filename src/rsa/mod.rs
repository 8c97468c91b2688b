// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod alphabet;
pub mod bigint;
pub mod block;
pub mod decrypt;
pub mod encrypt;
pub mod keygen;
pub mod prime;

pub use bigint::RsaBigInt;
pub use decrypt::{decrypt_bytes, decrypt_text};
pub use encrypt::{encrypt_bytes, encrypt_text};
pub use keygen::{
    generate_default_keypair, generate_keypair, generate_keypair_with, RsaKeyPair,
    RsaPrivateKey, RsaPublicKey, PUBLIC_EXPONENT,
};
pub use prime::{generate_probable_prime, is_probable_prime, random_in_range};
