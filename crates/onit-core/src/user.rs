//! User records, credentials and registration payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Role of a user within the deployment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserType {
    /// Anonymous visitor.
    #[default]
    Guest,
    /// The deployment owner.
    Me,
    /// Administrator.
    Admin,
    /// Regular registered user.
    Normal,
}

/// Verification status of a user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Unverified,
    Verified,
    Privileged,
}

/// A registered user and its active sessions.
///
/// The session list is ordered by creation and never holds duplicates. It is
/// not part of the serialized form, so a [`UserToken`] snapshot never leaks
/// session ids.
///
/// [`UserToken`]: crate::token::UserToken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "type", default)]
    pub user_type: UserType,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(skip)]
    pub sessions: Vec<Uuid>,
}

impl User {
    /// Creates a new user with a freshly assigned identifier.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            email: email.into(),
            user_type: UserType::default(),
            status: UserStatus::default(),
            sessions: Vec::new(),
        }
    }

    /// Checks the user invariants.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_empty() {
            return Err("must have name");
        }
        if self.email.is_empty() {
            return Err("must have email");
        }
        Ok(())
    }

    /// Returns whether the session is active for this user.
    #[inline]
    pub fn has_session(&self, session_id: Uuid) -> bool {
        self.sessions.contains(&session_id)
    }

    /// Appends a session, keeping the list free of duplicates.
    pub fn add_session(&mut self, session_id: Uuid) {
        if !self.has_session(session_id) {
            self.sessions.push(session_id);
        }
    }

    /// Removes a session, returning whether it was present.
    pub fn remove_session(&mut self, session_id: Uuid) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|id| *id != session_id);
        self.sessions.len() != before
    }
}

/// Username and password presented at login.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.is_empty() {
            return Err("must have username");
        }
        if self.password.is_empty() {
            return Err("must have password");
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Payload accepted when creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub email: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials::new(username, password),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        self.credentials.validate()?;
        if self.email.is_empty() {
            return Err("must have email");
        }
        Ok(())
    }
}
