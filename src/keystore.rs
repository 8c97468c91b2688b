// Persisted key record for one identity
//
// Public half as decimal strings, private exponent wrapped under the
// owner's passphrase. Every unlock builds a fresh immutable key pair;
// nothing here is ever overwritten in place.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CryptoConfig;
use crate::envelope::{KeyWrapper, Salt};
use crate::error::{CryptoError, Result};
use crate::rsa::keygen::{generate_keypair_with, RsaKeyPair, RsaPrivateKey, RsaPublicKey};

/// Storage form of a key pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredKeyPair {
    pub public_exponent: String,
    pub modulus: String,
    pub envelope: String,
    pub salt: String,
    #[serde(default)]
    pub prime_bits: u32,
}

impl StoredKeyPair {
    /// Generate a new key pair and wrap its private exponent.
    /// Returns the record to persist and the unlocked pair for immediate use.
    pub fn create_with<R>(
        rng: &mut R,
        passphrase: &str,
        config: &CryptoConfig,
    ) -> Result<(Self, RsaKeyPair)>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let keypair = generate_keypair_with(rng, config)?;
        let salt = Salt::generate_with(rng, config.salt_length)?;
        let stored = Self::seal(&keypair, passphrase, &salt, config)?;
        Ok((stored, keypair))
    }

    pub fn create(passphrase: &str, config: &CryptoConfig) -> Result<(Self, RsaKeyPair)> {
        Self::create_with(&mut rand::thread_rng(), passphrase, config)
    }

    /// Build the record for an existing key pair
    pub fn seal(
        keypair: &RsaKeyPair,
        passphrase: &str,
        salt: &Salt,
        config: &CryptoConfig,
    ) -> Result<Self> {
        let envelope = KeyWrapper::from_config(config).wrap(
            keypair.private_key.exponent(),
            passphrase,
            salt,
        )?;
        let (public_exponent, modulus) = keypair.public_key.to_decimal();

        Ok(Self {
            public_exponent,
            modulus,
            envelope,
            salt: salt.to_base64(),
            prime_bits: keypair.prime_bits,
        })
    }

    /// Public key only; no passphrase needed
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::from_decimal(&self.public_exponent, &self.modulus)
    }

    /// Unwrap the private exponent into a key pair that lives only as
    /// long as the caller holds it
    pub fn unlock(&self, passphrase: &str, config: &CryptoConfig) -> Result<RsaKeyPair> {
        let public_key = self.public_key()?;
        let salt = Salt::from_base64(&self.salt)?;
        let d = KeyWrapper::from_config(config).unwrap(&self.envelope, passphrase, &salt)?;
        // A legacy envelope opened with the wrong passphrase can yield any value
        let private_key = RsaPrivateKey::new(d, public_key.modulus().clone())
            .map_err(|_| CryptoError::AuthenticationFailure)?;

        debug!(modulus_bits = public_key.bit_length(), "unlocked stored key pair");
        Ok(RsaKeyPair {
            public_key,
            private_key,
            prime_bits: self.prime_bits,
        })
    }

    /// Replace passphrase and salt, keeping the same key pair
    pub fn change_passphrase(
        &self,
        old_passphrase: &str,
        new_passphrase: &str,
        config: &CryptoConfig,
    ) -> Result<Self> {
        let old_salt = Salt::from_base64(&self.salt)?;
        let mut rng = rand::thread_rng();
        let new_salt = Salt::generate_with(&mut rng, config.salt_length)?;
        let envelope = KeyWrapper::from_config(config).rewrap(
            &self.envelope,
            old_passphrase,
            &old_salt,
            new_passphrase,
            &new_salt,
        )?;

        Ok(Self {
            envelope,
            salt: new_salt.to_base64(),
            ..self.clone()
        })
    }
}
