//! User type enumeration.

use diesel_derive_enum::DbEnum;
use onit_core::user;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Role of a user within the deployment.
///
/// This enumeration corresponds to the `USER_TYPE` PostgreSQL enum.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::UserType"]
pub enum UserType {
    #[db_rename = "guest"]
    #[serde(rename = "guest")]
    #[strum(serialize = "guest")]
    #[default]
    Guest,

    #[db_rename = "me"]
    #[serde(rename = "me")]
    #[strum(serialize = "me")]
    Me,

    #[db_rename = "admin"]
    #[serde(rename = "admin")]
    #[strum(serialize = "admin")]
    Admin,

    #[db_rename = "normal"]
    #[serde(rename = "normal")]
    #[strum(serialize = "normal")]
    Normal,
}

impl From<user::UserType> for UserType {
    fn from(value: user::UserType) -> Self {
        match value {
            user::UserType::Guest => Self::Guest,
            user::UserType::Me => Self::Me,
            user::UserType::Admin => Self::Admin,
            user::UserType::Normal => Self::Normal,
        }
    }
}

impl From<UserType> for user::UserType {
    fn from(value: UserType) -> Self {
        match value {
            UserType::Guest => Self::Guest,
            UserType::Me => Self::Me,
            UserType::Admin => Self::Admin,
            UserType::Normal => Self::Normal,
        }
    }
}
