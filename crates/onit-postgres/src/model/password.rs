//! Password model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use onit_core::password::{self as domain, DigestType};
use uuid::Uuid;

use crate::schema::passwords;
use crate::{PgError, PgResult};

/// Stored password record.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = passwords)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Password {
    /// Unique record identifier.
    pub id: Uuid,
    /// Name of the user owning the password.
    pub username: String,
    /// Random per-user salt.
    pub salt: Vec<u8>,
    /// Hex-encoded derived key.
    pub hashed_password: Vec<u8>,
    /// PBKDF2 iteration count.
    pub iterations: i32,
    /// Derived key length in bytes.
    pub key_length: i32,
    /// Textual digest tag, e.g. `sha256`.
    pub digest_type: String,
    /// Timestamp of record creation.
    pub created_at: Timestamp,
    /// Timestamp of the last password change.
    pub updated_at: Timestamp,
}

/// Data for creating a new password record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = passwords)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPassword {
    pub id: Uuid,
    pub username: String,
    pub salt: Vec<u8>,
    pub hashed_password: Vec<u8>,
    pub iterations: i32,
    pub key_length: i32,
    pub digest_type: String,
}

/// Data for replacing the salt and hash of a password record.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = passwords)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdatePassword {
    pub salt: Vec<u8>,
    pub hashed_password: Vec<u8>,
    pub updated_at: Timestamp,
}

impl Password {
    /// Converts the row into a domain password record.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Corrupted`] if the digest tag is unknown or a
    /// parameter is out of range.
    pub fn into_domain(self) -> PgResult<domain::Password> {
        let digest_type = DigestType::parse(&self.digest_type)
            .map_err(|reason| PgError::Corrupted(reason.into()))?;
        let iterations = u32::try_from(self.iterations)
            .map_err(|_| PgError::Corrupted("negative iteration count".into()))?;
        let key_length = u32::try_from(self.key_length)
            .map_err(|_| PgError::Corrupted("negative key length".into()))?;

        Ok(domain::Password {
            id: self.id,
            username: self.username,
            salt: self.salt,
            hashed_password: self.hashed_password,
            iterations,
            key_length,
            digest_type,
        })
    }
}

impl TryFrom<&domain::Password> for NewPassword {
    type Error = PgError;

    fn try_from(password: &domain::Password) -> PgResult<Self> {
        let iterations = i32::try_from(password.iterations)
            .map_err(|_| PgError::Config("iteration count out of range".into()))?;
        let key_length = i32::try_from(password.key_length)
            .map_err(|_| PgError::Config("key length out of range".into()))?;

        Ok(Self {
            id: password.id,
            username: password.username.clone(),
            salt: password.salt.clone(),
            hashed_password: password.hashed_password.clone(),
            iterations,
            key_length,
            digest_type: password.digest_type.to_string(),
        })
    }
}

impl UpdatePassword {
    /// Creates a change set stamped with the current time.
    pub fn new(salt: &[u8], hashed_password: &[u8]) -> Self {
        Self {
            salt: salt.to_vec(),
            hashed_password: hashed_password.to_vec(),
            updated_at: jiff::Timestamp::now().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use onit_core::password::PasswordHasher;
    use onit_core::user::Credentials;

    use super::*;

    fn row(password: &domain::Password) -> anyhow::Result<Password> {
        let new = NewPassword::try_from(password)?;
        let now: Timestamp = jiff::Timestamp::now().into();
        Ok(Password {
            id: new.id,
            username: new.username,
            salt: new.salt,
            hashed_password: new.hashed_password,
            iterations: new.iterations,
            key_length: new.key_length,
            digest_type: new.digest_type,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn stored_row_reproduces_record() -> anyhow::Result<()> {
        let password =
            PasswordHasher::new("pepper").hash_password(&Credentials::new("alice", "p@ss"))?;
        let restored = row(&password)?.into_domain()?;
        assert_eq!(restored, password);
        Ok(())
    }

    #[test]
    fn unknown_digest_is_corrupted() -> anyhow::Result<()> {
        let password =
            PasswordHasher::new("pepper").hash_password(&Credentials::new("alice", "p@ss"))?;
        let mut row = row(&password)?;
        row.digest_type = "md5".into();

        let error = row.into_domain().unwrap_err();
        assert!(matches!(error, PgError::Corrupted(reason) if reason == "unsupported digest type"));
        Ok(())
    }
}
