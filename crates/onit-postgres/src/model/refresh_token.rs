//! Refresh token model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use onit_core::token as domain;
use uuid::Uuid;

use crate::schema::refresh_tokens;

/// Issued refresh token, keyed by its session.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = refresh_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RefreshToken {
    /// Session shared with the access token issued alongside.
    pub session_id: Uuid,
    /// Reference to the user the token was issued to.
    pub user_id: Uuid,
    /// Issuer claim.
    pub issuer: String,
    /// Audience claim.
    pub audience: Vec<Option<String>>,
    /// Timestamp of token issue.
    pub issued_at: Timestamp,
    /// Timestamp when the token expires.
    pub expires_at: Timestamp,
    /// Set once the token was exchanged for a new session.
    pub consumed: bool,
}

/// Data for storing a newly issued refresh token.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = refresh_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRefreshToken {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub issuer: String,
    pub audience: Vec<Option<String>>,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<&domain::RefreshToken> for NewRefreshToken {
    fn from(token: &domain::RefreshToken) -> Self {
        Self {
            session_id: token.session_id,
            user_id: token.user_id,
            issuer: token.issuer.clone(),
            audience: token.audience.iter().cloned().map(Some).collect(),
            issued_at: token.issued_at.into(),
            expires_at: token.expires_at.into(),
        }
    }
}
