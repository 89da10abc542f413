//! Error types shared by the authentication core.
//!
//! Every failure surfaced by this crate is a single [`Error`] carrying:
//!
//! - an [`ErrorKind`] with a stable machine-readable code
//! - a human-readable message that callers and tests match on
//! - an optional source error for chaining

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for authentication operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing authentication errors.
///
/// The kind decides how a transport layer reports the failure, see
/// [`ErrorKind::status_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, failed validation or a wrong password.
    BadRequest,
    /// Unknown user or password record.
    NotFound,
    /// Missing, malformed, unsigned or expired credentials.
    InvalidAuth,
    /// Authenticated, but not allowed to perform the operation.
    InsufficientAuth,
    /// Persistence, derivation or serialization failures.
    Server,
    /// A dependency is temporarily unavailable.
    ServerUnavailable,
    /// Invalid deployment configuration.
    Config,
}

impl ErrorKind {
    /// Returns the stable error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::InvalidAuth => "invalid_auth",
            Self::InsufficientAuth => "insufficient_auth",
            Self::Server => "server",
            Self::ServerUnavailable => "server_unavailable",
            Self::Config => "config",
        }
    }

    /// Returns the HTTP status code a transport layer should answer with.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::InvalidAuth => 401,
            Self::InsufficientAuth => 403,
            Self::NotFound => 404,
            Self::Server | Self::Config => 500,
            Self::ServerUnavailable => 503,
        }
    }

    /// Returns whether the failure was caused by the caller.
    #[inline]
    pub const fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::BadRequest | Self::NotFound | Self::InvalidAuth | Self::InsufficientAuth
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the stable error code, see [`ErrorKind::as_str`].
    #[must_use]
    #[inline]
    pub const fn code(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Creates a new bad request error.
    #[inline]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Creates a new not found error.
    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a new invalid authentication error.
    #[inline]
    pub fn invalid_auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidAuth, message)
    }

    /// Creates a new insufficient authentication error.
    #[inline]
    pub fn insufficient_auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InsufficientAuth, message)
    }

    /// Creates a new server error.
    #[inline]
    pub fn server(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    /// Creates a new server unavailable error.
    #[inline]
    pub fn server_unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ServerUnavailable, message)
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Wraps a store failure with the operation that failed, keeping its kind.
    ///
    /// Client-class failures (not found, expired session) pass through
    /// untouched so callers keep matching on their exact message.
    pub fn context(self, operation: &str) -> Self {
        if self.kind.is_client_error() {
            return self;
        }

        Self {
            kind: self.kind,
            message: format!("{operation}: {}", self.message).into(),
            source: self.source,
        }
    }

    /// The token or cookie is not bound to a live session.
    pub fn invalid_session() -> Self {
        Self::invalid_auth("invalid session")
    }

    /// The token signature does not match.
    pub fn invalid_signature() -> Self {
        Self::invalid_auth("invalid signature")
    }

    /// The token cannot be decoded.
    pub fn malformed_token() -> Self {
        Self::invalid_auth("token is malformed")
    }

    /// The caller presented no credentials.
    pub fn must_authenticate() -> Self {
        Self::invalid_auth("must authenticate")
    }

    /// The refresh token was already consumed or never existed.
    pub fn session_expired() -> Self {
        Self::invalid_auth("session has expired")
    }

    /// The user cannot be found.
    pub fn user_not_found() -> Self {
        Self::not_found("cannot find user")
    }

    /// Decoded claims failed semantic validation.
    pub fn invalid_token(reason: impl fmt::Display) -> Self {
        Self::invalid_auth(format!("invalid token: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation() {
        let error = Error::bad_request("invalid password");
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), "invalid password");
        assert_eq!(error.to_string(), "invalid password");
    }

    #[test]
    fn error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let error = Error::server("failed to find user").with_source(source);

        assert!(StdError::source(&error).is_some());
        assert_eq!(error.kind(), ErrorKind::Server);
    }

    #[test]
    fn context_wraps_server_errors_only() {
        let error = Error::server("connection reset").context("failed to find user");
        assert_eq!(error.message(), "failed to find user: connection reset");
        assert_eq!(error.kind(), ErrorKind::Server);

        let error = Error::user_not_found().context("failed to find user");
        assert_eq!(error.message(), "cannot find user");
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn invalid_token_reason() {
        let error = Error::invalid_token("token needs session");
        assert_eq!(error.kind(), ErrorKind::InvalidAuth);
        assert_eq!(error.message(), "invalid token: token needs session");
    }

    #[test]
    fn error_kind_codes() {
        assert_eq!(ErrorKind::BadRequest.as_str(), "bad_request");
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::InvalidAuth.as_str(), "invalid_auth");
        assert_eq!(ErrorKind::InsufficientAuth.as_str(), "insufficient_auth");
        assert_eq!(ErrorKind::Server.as_str(), "server");
        assert_eq!(ErrorKind::ServerUnavailable.as_str(), "server_unavailable");
    }

    #[test]
    fn error_kind_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::InvalidAuth.status_code(), 401);
        assert_eq!(ErrorKind::InsufficientAuth.status_code(), 403);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Server.status_code(), 500);
        assert_eq!(ErrorKind::ServerUnavailable.status_code(), 503);
    }
}
