//! Named constraints of the session schema.
//!
//! Postgres reports the constraint a statement violated by name. Parsing
//! that name tells the store whether a failed insert was a duplicate.

mod passwords;
mod refresh_tokens;
mod user_sessions;
mod users;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::passwords::PasswordConstraints;
pub use self::refresh_tokens::RefreshTokenConstraints;
pub use self::user_sessions::UserSessionConstraints;
pub use self::users::UserConstraints;

/// What kind of rule a constraint enforces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Non-empty and positive checks on a single column.
    Validation,
    /// Ordering between timestamps of one row.
    Chronological,
    /// Foreign keys to another table.
    Reference,
    /// Primary keys and unique indexes.
    Uniqueness,
}

/// A constraint of the session schema, identified by its database name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConstraintViolation {
    User(UserConstraints),
    UserSession(UserSessionConstraints),
    Password(PasswordConstraints),
    RefreshToken(RefreshTokenConstraints),
}

impl ConstraintViolation {
    /// Looks up a constraint by name, `None` if it is not part of the schema.
    ///
    /// ```
    /// use onit_postgres::types::ConstraintViolation;
    ///
    /// let violation = ConstraintViolation::new("users_name_unique_idx");
    /// assert!(violation.is_some_and(|v| v.is_uniqueness()));
    /// assert!(ConstraintViolation::new("accounts_pkey").is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        UserConstraints::new(constraint)
            .map(Self::User)
            .or_else(|| UserSessionConstraints::new(constraint).map(Self::UserSession))
            .or_else(|| PasswordConstraints::new(constraint).map(Self::Password))
            .or_else(|| RefreshTokenConstraints::new(constraint).map(Self::RefreshToken))
    }

    /// Table the constraint is declared on.
    pub fn table(&self) -> &'static str {
        match self {
            Self::User(_) => "users",
            Self::UserSession(_) => "user_sessions",
            Self::Password(_) => "passwords",
            Self::RefreshToken(_) => "refresh_tokens",
        }
    }

    pub fn category(&self) -> ConstraintCategory {
        match self {
            Self::User(c) => c.categorize(),
            Self::UserSession(c) => c.categorize(),
            Self::Password(c) => c.categorize(),
            Self::RefreshToken(c) => c.categorize(),
        }
    }

    /// Returns whether the violation means the row already exists.
    #[inline]
    pub fn is_uniqueness(&self) -> bool {
        self.category() == ConstraintCategory::Uniqueness
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(c) => fmt::Display::fmt(c, f),
            Self::UserSession(c) => fmt::Display::fmt(c, f),
            Self::Password(c) => fmt::Display::fmt(c, f),
            Self::RefreshToken(c) => fmt::Display::fmt(c, f),
        }
    }
}

impl From<ConstraintViolation> for String {
    fn from(value: ConstraintViolation) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ConstraintViolation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("unknown constraint: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_schema_constraints() {
        assert_eq!(
            ConstraintViolation::new("users_name_unique_idx"),
            Some(ConstraintViolation::User(UserConstraints::NameUnique))
        );
        assert_eq!(
            ConstraintViolation::new("user_sessions_pkey"),
            Some(ConstraintViolation::UserSession(
                UserSessionConstraints::SessionUnique
            ))
        );
        assert_eq!(
            ConstraintViolation::new("refresh_tokens_pkey"),
            Some(ConstraintViolation::RefreshToken(
                RefreshTokenConstraints::SessionUnique
            ))
        );
        assert_eq!(ConstraintViolation::new("users_unknown"), None);
    }

    #[test]
    fn categories_follow_the_rule() {
        let duplicate = ConstraintViolation::Password(PasswordConstraints::UsernameUnique);
        assert!(duplicate.is_uniqueness());
        assert_eq!(duplicate.table(), "passwords");

        let empty = ConstraintViolation::User(UserConstraints::NameNotEmpty);
        assert_eq!(empty.category(), ConstraintCategory::Validation);
        assert!(!empty.is_uniqueness());

        let orphan = ConstraintViolation::UserSession(UserSessionConstraints::UserExists);
        assert_eq!(orphan.category(), ConstraintCategory::Reference);

        let backwards =
            ConstraintViolation::RefreshToken(RefreshTokenConstraints::ExpiresAfterIssued);
        assert_eq!(backwards.category(), ConstraintCategory::Chronological);
    }

    #[test]
    fn serializes_as_constraint_name() -> anyhow::Result<()> {
        let violation = ConstraintViolation::User(UserConstraints::IdUnique);
        assert_eq!(serde_json::to_string(&violation)?, "\"users_pkey\"");

        let parsed: ConstraintViolation = serde_json::from_str("\"passwords_username_unique_idx\"")?;
        assert_eq!(
            parsed,
            ConstraintViolation::Password(PasswordConstraints::UsernameUnique)
        );
        Ok(())
    }
}
