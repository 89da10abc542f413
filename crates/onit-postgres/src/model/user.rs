//! User model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use onit_core::user as domain;
use uuid::Uuid;

use crate::schema::users;
use crate::types::{UserStatus, UserType};

/// User model representing a registered user.
///
/// Sessions live in their own table, see [`UserSession`].
///
/// [`UserSession`]: crate::model::UserSession
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub name: String,
    /// Contact email address.
    pub email: String,
    /// Role of the user.
    pub user_type: UserType,
    /// Verification status.
    pub status: UserStatus,
    /// Timestamp of user creation.
    pub created_at: Timestamp,
    /// Timestamp of the last profile update.
    pub updated_at: Timestamp,
}

/// Data for creating a new user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub status: UserStatus,
}

impl User {
    /// Converts the row into a domain user with the given ordered sessions.
    pub fn into_domain(self, sessions: Vec<Uuid>) -> domain::User {
        domain::User {
            id: self.id,
            name: self.name,
            email: self.email,
            user_type: self.user_type.into(),
            status: self.status.into(),
            sessions,
        }
    }
}

impl From<&domain::User> for NewUser {
    fn from(user: &domain::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            user_type: user.user_type.into(),
            status: user.status.into(),
        }
    }
}
