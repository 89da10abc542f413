//! Passwords table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Passwords table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum PasswordConstraints {
    // Password validation constraints
    #[strum(serialize = "passwords_salt_not_empty")]
    SaltNotEmpty,
    #[strum(serialize = "passwords_hashed_password_not_empty")]
    HashedPasswordNotEmpty,
    #[strum(serialize = "passwords_iterations_positive")]
    IterationsPositive,
    #[strum(serialize = "passwords_key_length_positive")]
    KeyLengthPositive,

    // Password reference constraints
    #[strum(serialize = "passwords_username_fkey")]
    UserExists,

    // Password unique constraints
    #[strum(serialize = "passwords_pkey")]
    IdUnique,
    #[strum(serialize = "passwords_username_unique_idx")]
    UsernameUnique,
}

impl PasswordConstraints {
    /// Creates a new [`PasswordConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            PasswordConstraints::SaltNotEmpty
            | PasswordConstraints::HashedPasswordNotEmpty
            | PasswordConstraints::IterationsPositive
            | PasswordConstraints::KeyLengthPositive => ConstraintCategory::Validation,

            PasswordConstraints::UserExists => ConstraintCategory::Reference,

            PasswordConstraints::IdUnique | PasswordConstraints::UsernameUnique => {
                ConstraintCategory::Uniqueness
            }
        }
    }
}

impl From<PasswordConstraints> for String {
    #[inline]
    fn from(val: PasswordConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for PasswordConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
