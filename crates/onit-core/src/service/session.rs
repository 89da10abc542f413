use jiff::Timestamp;

use crate::token::SessionTokens;
use crate::user::User;

/// Outcome of a login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The user with the new session already in its session list.
    pub user: User,
    pub tokens: SessionTokens,
}

/// Signed tokens of a session, ready to be attached to a response.
///
/// Expiry instants let the transport layer align cookie lifetimes with the
/// tokens they carry.
#[derive(Clone)]
pub struct SignedSession {
    pub access_token: String,
    pub access_expires_at: Timestamp,
    pub refresh_token: String,
    pub refresh_expires_at: Timestamp,
    pub user_token: String,
    pub user_expires_at: Timestamp,
}

impl std::fmt::Debug for SignedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedSession")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("user_expires_at", &self.user_expires_at)
            .finish_non_exhaustive()
    }
}

/// A caller resolved from its access and user tokens.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// The current user record.
    pub user: User,
    /// Freshly signed user token reflecting the current record.
    pub user_token: String,
    pub user_expires_at: Timestamp,
}
