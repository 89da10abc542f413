//! Salted PBKDF2 password derivation and verification.
//!
//! A password is stretched with PBKDF2-HMAC over `pepper || salt`, where the
//! pepper is a per-deployment secret and the salt is a fresh random value per
//! user. The stored hash is the hex encoding of the derived key, so the same
//! inputs always reproduce the same stored bytes.

use std::fmt;
use std::sync::Arc;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::user::Credentials;
use crate::{Error, Result, TRACING_TARGET_PASSWORD};

/// Length of the random per-user salt in bytes.
pub const PASSWORD_SALT_LENGTH: usize = 12;

/// Default PBKDF2 output length in bytes.
pub const DEFAULT_KEY_LENGTH: u32 = 12;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 4096;

/// Upper bound on the derived key length accepted from stored records.
const MAX_KEY_LENGTH: u32 = 1024;

/// Digest used as the PBKDF2 pseudo-random function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DigestType {
    #[default]
    Sha256,
    Sha512,
}

impl DigestType {
    /// Parses a stored digest tag.
    pub fn parse(tag: &str) -> Result<Self, &'static str> {
        if tag.is_empty() {
            return Err("must have digest type");
        }
        tag.parse().map_err(|_| "unsupported digest type")
    }
}

/// Key-derivation parameters stored next to every password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordOptions {
    pub digest_type: DigestType,
    pub iterations: u32,
    pub key_length: u32,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            digest_type: DigestType::default(),
            iterations: DEFAULT_ITERATIONS,
            key_length: DEFAULT_KEY_LENGTH,
        }
    }
}

/// Stored password record, one per username.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Password {
    pub id: Uuid,
    pub username: String,
    pub salt: Vec<u8>,
    /// Hex-encoded derived key.
    pub hashed_password: Vec<u8>,
    pub iterations: u32,
    pub key_length: u32,
    pub digest_type: DigestType,
}

impl Password {
    /// Returns the derivation parameters of this record.
    #[inline]
    pub fn options(&self) -> PasswordOptions {
        PasswordOptions {
            digest_type: self.digest_type,
            iterations: self.iterations,
            key_length: self.key_length,
        }
    }

    /// Checks that every field was populated.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.is_empty() {
            return Err("must have username");
        }
        if self.salt.is_empty() {
            return Err("must have salt");
        }
        if self.hashed_password.is_empty() {
            return Err("must be hashed");
        }
        if self.iterations == 0 {
            return Err("must have iterations");
        }
        if self.key_length == 0 {
            return Err("must have key length");
        }
        Ok(())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("iterations", &self.iterations)
            .field("key_length", &self.key_length)
            .field("digest_type", &self.digest_type)
            .finish_non_exhaustive()
    }
}

/// Derives and verifies password hashes with a deployment-wide pepper.
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: Arc<[u8]>,
}

impl PasswordHasher {
    /// Creates a new [`PasswordHasher`] with the given pepper.
    pub fn new(pepper: impl AsRef<[u8]>) -> Self {
        Self {
            pepper: Arc::from(pepper.as_ref()),
        }
    }

    /// Generates a fresh random salt.
    pub fn generate_salt() -> Vec<u8> {
        let mut salt = vec![0u8; PASSWORD_SALT_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        salt
    }

    /// Derives the hex-encoded key for `password`.
    ///
    /// # Errors
    ///
    /// Returns a server error if the parameters cannot produce a key.
    pub fn derive(&self, password: &str, salt: &[u8], options: &PasswordOptions) -> Result<Vec<u8>> {
        if options.iterations == 0 {
            return Err(Error::server("cannot make password: must have iterations"));
        }
        if options.key_length == 0 || options.key_length > MAX_KEY_LENGTH {
            tracing::error!(
                target: TRACING_TARGET_PASSWORD,
                key_length = options.key_length,
                "Refusing to derive key with unsupported length"
            );
            return Err(Error::server("cannot make password: invalid key length"));
        }

        let mut peppered_salt = Vec::with_capacity(self.pepper.len() + salt.len());
        peppered_salt.extend_from_slice(&self.pepper);
        peppered_salt.extend_from_slice(salt);

        let mut key = vec![0u8; options.key_length as usize];
        match options.digest_type {
            DigestType::Sha256 => {
                pbkdf2_hmac::<Sha256>(password.as_bytes(), &peppered_salt, options.iterations, &mut key)
            }
            DigestType::Sha512 => {
                pbkdf2_hmac::<Sha512>(password.as_bytes(), &peppered_salt, options.iterations, &mut key)
            }
        }

        Ok(hex::encode(key).into_bytes())
    }

    /// Builds a password record for `credentials` from an explicit salt.
    pub fn make_password(
        &self,
        credentials: &Credentials,
        salt: Vec<u8>,
        options: PasswordOptions,
    ) -> Result<Password> {
        let hashed_password = self.derive(&credentials.password, &salt, &options)?;

        let password = Password {
            id: Uuid::now_v7(),
            username: credentials.username.clone(),
            salt,
            hashed_password,
            iterations: options.iterations,
            key_length: options.key_length,
            digest_type: options.digest_type,
        };

        password
            .validate()
            .map_err(|reason| Error::server(format!("failed to make password: {reason}")))?;

        Ok(password)
    }

    /// Builds a password record with a fresh salt and default parameters.
    pub fn hash_password(&self, credentials: &Credentials) -> Result<Password> {
        self.make_password(credentials, Self::generate_salt(), PasswordOptions::default())
    }

    /// Re-derives `attempt` with the stored salt and parameters and compares
    /// it to the stored hash.
    ///
    /// # Errors
    ///
    /// Returns a bad request error `invalid password` on mismatch.
    pub fn verify(&self, password: &Password, attempt: &str) -> Result<()> {
        let derived = self.derive(attempt, &password.salt, &password.options())?;

        if derived != password.hashed_password {
            tracing::debug!(
                target: TRACING_TARGET_PASSWORD,
                username = %password.username,
                "Password verification failed"
            );
            return Err(Error::bad_request("invalid password"));
        }

        tracing::debug!(
            target: TRACING_TARGET_PASSWORD,
            username = %password.username,
            "Password verification successful"
        );

        Ok(())
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn derive_matches_reference_vector() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new("");
        let options = PasswordOptions {
            digest_type: DigestType::Sha256,
            iterations: 1,
            key_length: 32,
        };

        let derived = hasher.derive("password", b"salt", &options)?;
        assert_eq!(
            String::from_utf8(derived)?,
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        Ok(())
    }

    #[test]
    fn pepper_is_prepended_to_salt() -> anyhow::Result<()> {
        let options = PasswordOptions::default();
        let peppered = PasswordHasher::new("pep").derive("p@ss", b"salt", &options)?;
        let inlined = PasswordHasher::new("").derive("p@ss", b"pepsalt", &options)?;
        assert_eq!(peppered, inlined);
        Ok(())
    }

    #[test]
    fn derive_respects_parameters() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new("pepper");
        let sha256 = hasher.derive("p@ss", b"salt", &PasswordOptions::default())?;
        let sha512 = hasher.derive(
            "p@ss",
            b"salt",
            &PasswordOptions {
                digest_type: DigestType::Sha512,
                ..Default::default()
            },
        )?;

        assert_eq!(sha256.len(), DEFAULT_KEY_LENGTH as usize * 2);
        assert_ne!(sha256, sha512);
        Ok(())
    }

    #[test]
    fn derive_rejects_zero_parameters() {
        let hasher = PasswordHasher::new("pepper");
        let options = PasswordOptions {
            iterations: 0,
            ..Default::default()
        };
        let error = hasher.derive("p@ss", b"salt", &options).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Server);
    }

    #[test]
    fn hash_and_verify() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new("pepper");
        let password = hasher.hash_password(&Credentials::new("alice", "p@ss"))?;

        assert_eq!(password.salt.len(), PASSWORD_SALT_LENGTH);
        assert_eq!(password.iterations, DEFAULT_ITERATIONS);
        assert_eq!(password.key_length, DEFAULT_KEY_LENGTH);
        assert_eq!(password.digest_type, DigestType::Sha256);

        hasher.verify(&password, "p@ss")?;

        let error = hasher.verify(&password, "wrong").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), "invalid password");
        Ok(())
    }

    #[test]
    fn verify_fails_with_other_pepper() -> anyhow::Result<()> {
        let password = PasswordHasher::new("one").hash_password(&Credentials::new("alice", "p@ss"))?;
        assert!(PasswordHasher::new("two").verify(&password, "p@ss").is_err());
        Ok(())
    }

    #[test]
    fn digest_tags() {
        assert_eq!(DigestType::parse("sha256"), Ok(DigestType::Sha256));
        assert_eq!(DigestType::parse("sha512"), Ok(DigestType::Sha512));
        assert_eq!(DigestType::parse(""), Err("must have digest type"));
        assert_eq!(DigestType::parse("md5"), Err("unsupported digest type"));
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(PasswordHasher::generate_salt(), PasswordHasher::generate_salt());
    }

    #[test]
    fn password_validation() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new("pepper");
        let valid = hasher.hash_password(&Credentials::new("alice", "p@ss"))?;

        let mut password = valid.clone();
        password.username.clear();
        assert_eq!(password.validate(), Err("must have username"));

        let mut password = valid.clone();
        password.salt.clear();
        assert_eq!(password.validate(), Err("must have salt"));

        let mut password = valid.clone();
        password.hashed_password.clear();
        assert_eq!(password.validate(), Err("must be hashed"));

        let mut password = valid.clone();
        password.iterations = 0;
        assert_eq!(password.validate(), Err("must have iterations"));

        let mut password = valid;
        password.key_length = 0;
        assert_eq!(password.validate(), Err("must have key length"));
        Ok(())
    }

    #[test]
    fn make_password_requires_username() {
        let hasher = PasswordHasher::new("pepper");
        let error = hasher
            .hash_password(&Credentials::new("", "p@ss"))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(error.message(), "failed to make password: must have username");
    }
}
