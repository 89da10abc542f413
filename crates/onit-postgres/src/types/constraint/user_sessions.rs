//! User sessions table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// User sessions table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum UserSessionConstraints {
    #[strum(serialize = "user_sessions_pkey")]
    SessionUnique,
    #[strum(serialize = "user_sessions_user_id_fkey")]
    UserExists,
}

impl UserSessionConstraints {
    /// Creates a new [`UserSessionConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            UserSessionConstraints::SessionUnique => ConstraintCategory::Uniqueness,
            UserSessionConstraints::UserExists => ConstraintCategory::Reference,
        }
    }
}

impl From<UserSessionConstraints> for String {
    #[inline]
    fn from(val: UserSessionConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for UserSessionConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
