//! Claims carried by access, refresh and user-identity tokens.

use derive_more::{Deref, DerefMut};
use jiff::{SignedDuration, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// Audience of every session token issued by this service.
pub const TOKEN_AUDIENCE: &str = "api/admin/v1";

/// Lifetime of a user-identity token.
pub const USER_TOKEN_LIFETIME: SignedDuration = SignedDuration::from_hours(10 * 365 * 24);

/// Claims that can be signed and verified by a [`TokenCodec`].
///
/// [`TokenCodec`]: crate::token::TokenCodec
pub trait Claims: Serialize + DeserializeOwned {
    /// Checks the claims invariants at the instant `now`.
    ///
    /// The returned reason is reported as `invalid token: <reason>`.
    fn validate(&self, now: Timestamp) -> Result<(), &'static str>;
}

/// Claims of a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Session shared with the refresh token issued alongside.
    #[serde(rename = "jti")]
    pub session_id: Uuid,
    #[serde(rename = "sub")]
    pub user_id: Uuid,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "aud")]
    pub audience: Vec<String>,
    #[serde(rename = "iat", with = "jiff::fmt::serde::timestamp::second::required")]
    pub issued_at: Timestamp,
    #[serde(rename = "exp", with = "jiff::fmt::serde::timestamp::second::required")]
    pub expires_at: Timestamp,
}

impl AccessToken {
    /// Creates access token claims valid for `ttl` from `issued_at`.
    ///
    /// Timestamps are truncated to whole seconds, the precision of the
    /// encoded claims.
    pub fn new(
        session_id: Uuid,
        user_id: Uuid,
        issuer: impl Into<String>,
        issued_at: Timestamp,
        ttl: SignedDuration,
    ) -> Self {
        let issued_at = truncate_to_second(issued_at);
        Self {
            session_id,
            user_id,
            issuer: issuer.into(),
            audience: vec![TOKEN_AUDIENCE.to_owned()],
            issued_at,
            expires_at: issued_at.saturating_add(ttl).unwrap_or(Timestamp::MAX),
        }
    }

    /// Returns whether the token is expired at `now`.
    #[inline]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

impl Claims for AccessToken {
    fn validate(&self, now: Timestamp) -> Result<(), &'static str> {
        if self.session_id.is_nil() {
            return Err("token needs session");
        }
        if self.user_id.is_nil() {
            return Err("token needs user");
        }
        if self.is_expired(now) {
            return Err("token is expired");
        }
        Ok(())
    }
}

/// Claims of a long-lived, single-use refresh token.
///
/// The encoded form carries the same claims as an [`AccessToken`]. The
/// consumed flag only lives in the refresh token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Deref, DerefMut)]
pub struct RefreshToken {
    #[serde(flatten)]
    #[deref]
    #[deref_mut]
    pub claims: AccessToken,
    #[serde(skip)]
    pub consumed: bool,
}

impl RefreshToken {
    /// Creates an unconsumed refresh token for the session of `access`,
    /// valid for `ttl` from the same issue instant.
    pub fn new(access: &AccessToken, ttl: SignedDuration) -> Self {
        let mut claims = access.clone();
        claims.expires_at = claims
            .issued_at
            .saturating_add(ttl)
            .unwrap_or(Timestamp::MAX);

        Self {
            claims,
            consumed: false,
        }
    }
}

impl Claims for RefreshToken {
    fn validate(&self, now: Timestamp) -> Result<(), &'static str> {
        self.claims.validate(now)
    }
}

/// Signed snapshot of a user's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Deref)]
pub struct UserToken {
    #[serde(flatten)]
    #[deref]
    pub user: User,
    #[serde(rename = "iat", with = "jiff::fmt::serde::timestamp::second::required")]
    pub issued_at: Timestamp,
    #[serde(rename = "exp", with = "jiff::fmt::serde::timestamp::second::required")]
    pub expires_at: Timestamp,
}

impl UserToken {
    /// Creates a user token valid for [`USER_TOKEN_LIFETIME`].
    ///
    /// Session ids are dropped from the snapshot.
    pub fn new(user: &User, issued_at: Timestamp) -> Self {
        let issued_at = truncate_to_second(issued_at);
        let user = User {
            sessions: Vec::new(),
            ..user.clone()
        };

        Self {
            user,
            issued_at,
            expires_at: issued_at
                .saturating_add(USER_TOKEN_LIFETIME)
                .unwrap_or(Timestamp::MAX),
        }
    }
}

impl Claims for UserToken {
    fn validate(&self, now: Timestamp) -> Result<(), &'static str> {
        self.user.validate()?;
        if self.user.id.is_nil() {
            return Err("token needs user");
        }
        if now > self.expires_at {
            return Err("token is expired");
        }
        Ok(())
    }
}

/// Access and refresh token of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

impl SessionTokens {
    #[inline]
    pub fn session_id(&self) -> Uuid {
        self.access.session_id
    }
}

fn truncate_to_second(timestamp: Timestamp) -> Timestamp {
    Timestamp::from_second(timestamp.as_second()).unwrap_or(timestamp)
}
