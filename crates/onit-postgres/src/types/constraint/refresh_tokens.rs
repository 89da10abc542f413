//! Refresh tokens table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ConstraintCategory;

/// Refresh tokens table constraint violations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum RefreshTokenConstraints {
    #[strum(serialize = "refresh_tokens_expires_after_issued")]
    ExpiresAfterIssued,
    #[strum(serialize = "refresh_tokens_pkey")]
    SessionUnique,
}

impl RefreshTokenConstraints {
    /// Creates a new [`RefreshTokenConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            RefreshTokenConstraints::ExpiresAfterIssued => ConstraintCategory::Chronological,
            RefreshTokenConstraints::SessionUnique => ConstraintCategory::Uniqueness,
        }
    }
}

impl From<RefreshTokenConstraints> for String {
    #[inline]
    fn from(val: RefreshTokenConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for RefreshTokenConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
