//! Users table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Users table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum UserConstraints {
    // User validation constraints
    #[strum(serialize = "users_name_not_empty")]
    NameNotEmpty,
    #[strum(serialize = "users_email_not_empty")]
    EmailNotEmpty,

    // User unique constraints
    #[strum(serialize = "users_pkey")]
    IdUnique,
    #[strum(serialize = "users_name_unique_idx")]
    NameUnique,
}

impl UserConstraints {
    /// Creates a new [`UserConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            UserConstraints::NameNotEmpty | UserConstraints::EmailNotEmpty => {
                ConstraintCategory::Validation
            }
            UserConstraints::IdUnique | UserConstraints::NameUnique => {
                ConstraintCategory::Uniqueness
            }
        }
    }
}

impl From<UserConstraints> for String {
    #[inline]
    fn from(val: UserConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for UserConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
