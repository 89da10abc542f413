//! User status enumeration.

use diesel_derive_enum::DbEnum;
use onit_core::user;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Verification status of a user.
///
/// This enumeration corresponds to the `USER_STATUS` PostgreSQL enum.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::UserStatus"]
pub enum UserStatus {
    /// Registered, email not confirmed yet.
    #[db_rename = "unverified"]
    #[serde(rename = "unverified")]
    #[strum(serialize = "unverified")]
    #[default]
    Unverified,

    #[db_rename = "verified"]
    #[serde(rename = "verified")]
    #[strum(serialize = "verified")]
    Verified,

    #[db_rename = "privileged"]
    #[serde(rename = "privileged")]
    #[strum(serialize = "privileged")]
    Privileged,
}

impl From<user::UserStatus> for UserStatus {
    fn from(value: user::UserStatus) -> Self {
        match value {
            user::UserStatus::Unverified => Self::Unverified,
            user::UserStatus::Verified => Self::Verified,
            user::UserStatus::Privileged => Self::Privileged,
        }
    }
}

impl From<UserStatus> for user::UserStatus {
    fn from(value: UserStatus) -> Self {
        match value {
            UserStatus::Unverified => Self::Unverified,
            UserStatus::Verified => Self::Verified,
            UserStatus::Privileged => Self::Privileged,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn converts_both_ways() {
        for status in UserStatus::iter() {
            let domain = user::UserStatus::from(status);
            assert_eq!(UserStatus::from(domain), status);
            assert_eq!(status.to_string(), domain.to_string());
        }
    }
}
