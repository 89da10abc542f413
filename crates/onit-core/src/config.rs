//! Deployment configuration consumed by the authentication core.

use std::fmt;

#[cfg(any(test, feature = "config"))]
use clap::Args;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Secrets and token lifetimes of a deployment.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
pub struct AuthConfig {
    /// Deployment base URL, used as the token issuer.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long = "auth-issuer", env = "AUTH_ISSUER", default_value = "http://localhost")
    )]
    #[serde(default = "AuthConfig::default_issuer")]
    pub issuer: String,

    /// Symmetric secret used to sign session tokens.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long = "auth-jwt-secret", env = "AUTH_JWT_SECRET")
    )]
    pub jwt_secret: String,

    /// Deployment-wide secret mixed into every password derivation.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long = "auth-password-pepper", env = "AUTH_PASSWORD_PEPPER", default_value = "")
    )]
    #[serde(default)]
    pub password_pepper: String,

    /// Access token lifetime in seconds.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(
            long = "auth-access-token-expiry-secs",
            env = "AUTH_ACCESS_TOKEN_EXPIRY_SECS",
            default_value = "300"
        )
    )]
    #[serde(default = "AuthConfig::default_access_token_expiry_secs")]
    pub access_token_expiry_secs: u64,

    /// Refresh token lifetime in days.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(
            long = "auth-refresh-token-expiry-days",
            env = "AUTH_REFRESH_TOKEN_EXPIRY_DAYS",
            default_value = "30"
        )
    )]
    #[serde(default = "AuthConfig::default_refresh_token_expiry_days")]
    pub refresh_token_expiry_days: u64,
}

impl AuthConfig {
    fn default_issuer() -> String {
        "http://localhost".to_owned()
    }

    fn default_access_token_expiry_secs() -> u64 {
        300
    }

    fn default_refresh_token_expiry_days() -> u64 {
        30
    }

    /// Creates a configuration with default lifetimes.
    pub fn new(issuer: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            jwt_secret: jwt_secret.into(),
            password_pepper: String::new(),
            access_token_expiry_secs: Self::default_access_token_expiry_secs(),
            refresh_token_expiry_days: Self::default_refresh_token_expiry_days(),
        }
    }

    /// Sets the password pepper.
    pub fn with_password_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.password_pepper = pepper.into();
        self
    }

    /// Sets the access token lifetime in seconds.
    pub fn with_access_token_expiry_secs(mut self, secs: u64) -> Self {
        self.access_token_expiry_secs = secs;
        self
    }

    /// Sets the refresh token lifetime in days.
    pub fn with_refresh_token_expiry_days(mut self, days: u64) -> Self {
        self.refresh_token_expiry_days = days;
        self
    }

    /// Returns the access token lifetime.
    pub fn access_token_ttl(&self) -> SignedDuration {
        SignedDuration::from_secs(i64::try_from(self.access_token_expiry_secs).unwrap_or(i64::MAX))
    }

    /// Returns the refresh token lifetime, saturating at [`SignedDuration::MAX`].
    pub fn refresh_token_ttl(&self) -> SignedDuration {
        self.refresh_token_secs()
            .map_or(SignedDuration::MAX, SignedDuration::from_secs)
    }

    fn refresh_token_secs(&self) -> Option<i64> {
        let secs = self.refresh_token_expiry_days.checked_mul(86_400)?;
        i64::try_from(secs).ok()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the issuer or secret is empty, a
    /// lifetime is zero, or access tokens would outlive refresh tokens.
    pub fn validate(&self) -> Result<()> {
        if self.issuer.is_empty() {
            return Err(Error::config("auth issuer must not be empty"));
        }
        if self.jwt_secret.is_empty() {
            return Err(Error::config("jwt secret must not be empty"));
        }
        if self.access_token_expiry_secs == 0 {
            return Err(Error::config("access token expiry must be positive"));
        }
        if self.refresh_token_expiry_days == 0 {
            return Err(Error::config("refresh token expiry must be positive"));
        }
        if self.refresh_token_secs().is_none() {
            return Err(Error::config("refresh token expiry is out of range"));
        }
        if self.access_token_ttl() >= self.refresh_token_ttl() {
            return Err(Error::config(
                "access token expiry must be shorter than refresh token expiry",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("jwt_secret", &"[REDACTED]")
            .field("password_pepper", &"[REDACTED]")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

/// Builds a deployment base URL as `http(s)://host[:port]`.
///
/// An empty host falls back to `localhost`, and port `0` is omitted.
pub fn base_url(host: &str, port: u16, tls: bool) -> String {
    let scheme = if tls { "https" } else { "http" };
    let host = if host.is_empty() { "localhost" } else { host };

    match port {
        0 => format!("{scheme}://{host}"),
        port => format!("{scheme}://{host}:{port}"),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::ErrorKind;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        auth: AuthConfig,
    }

    #[test]
    fn parses_flags_with_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["onit", "--auth-jwt-secret", "secret"])?;

        assert_eq!(cli.auth.issuer, "http://localhost");
        assert_eq!(cli.auth.access_token_expiry_secs, 300);
        assert_eq!(cli.auth.refresh_token_expiry_days, 30);
        assert_eq!(cli.auth.access_token_ttl(), SignedDuration::from_secs(300));
        assert_eq!(cli.auth.refresh_token_ttl(), SignedDuration::from_hours(720));
        cli.auth.validate()?;
        Ok(())
    }

    #[test]
    fn deserializes_with_defaults() -> anyhow::Result<()> {
        let config: AuthConfig = serde_json::from_str(r#"{"jwt_secret":"secret"}"#)?;
        assert_eq!(config.issuer, "http://localhost");
        assert_eq!(config.access_token_expiry_secs, 300);
        assert_eq!(config.refresh_token_expiry_days, 30);
        assert!(config.password_pepper.is_empty());
        Ok(())
    }

    #[test]
    fn validation() {
        assert!(AuthConfig::new("http://localhost", "secret").validate().is_ok());

        let error = AuthConfig::new("http://localhost", "").validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);

        let config = AuthConfig::new("http://localhost", "secret").with_access_token_expiry_secs(0);
        assert!(config.validate().is_err());

        let config = AuthConfig::new("http://localhost", "secret")
            .with_access_token_expiry_secs(86_400)
            .with_refresh_token_expiry_days(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_refresh_expiry_is_rejected() {
        let config = AuthConfig::new("http://localhost", "secret")
            .with_refresh_token_expiry_days(200_000_000_000_000);
        assert_eq!(config.refresh_token_ttl(), SignedDuration::MAX);

        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.message(), "refresh token expiry is out of range");

        let config = config.with_refresh_token_expiry_days(u64::MAX);
        assert_eq!(config.refresh_token_ttl(), SignedDuration::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_hides_secrets() {
        let config = AuthConfig::new("http://localhost", "jwt-secret").with_password_pepper("hunter2");
        let output = format!("{config:?}");
        assert!(!output.contains("jwt-secret"));
        assert!(!output.contains("hunter2"));
    }

    #[test]
    fn builds_base_url() {
        assert_eq!(base_url("", 0, false), "http://localhost");
        assert_eq!(base_url("example.com", 0, true), "https://example.com");
        assert_eq!(base_url("localhost", 8080, false), "http://localhost:8080");
    }
}
