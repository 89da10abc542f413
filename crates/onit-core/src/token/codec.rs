use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff::Timestamp;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::Claims;
use crate::{Error, Result, TRACING_TARGET_TOKEN};

/// The only algorithm tokens are signed and accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs and verifies session tokens with a symmetric secret.
///
/// Verification distinguishes three failure classes, all reported as
/// invalid authentication:
///
/// - `invalid signature` when the signature does not match
/// - `token is malformed` for any other decoding failure, including
///   unsupported algorithms
/// - `invalid token: <reason>` when decoded claims fail [`Claims::validate`]
#[derive(Clone)]
pub struct TokenCodec {
    inner: Arc<TokenCodecInner>,
}

struct TokenCodecInner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Creates a new codec from the deployment signing secret.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::config("jwt secret must not be empty"));
        }

        // Temporal and audience checks belong to `Claims::validate`, so that
        // their failures are reported as `invalid token: <reason>`.
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let inner = TokenCodecInner {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Signs `claims` into a compact token.
    pub fn sign<C: Claims>(&self, claims: &C) -> Result<String> {
        jsonwebtoken::encode(&Header::new(TOKEN_ALGORITHM), claims, &self.inner.encoding_key)
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_TOKEN,
                    error = %e,
                    "Failed to sign token"
                );
                Error::server("failed to sign token").with_source(e)
            })
    }

    /// Verifies `token` and validates its claims against the current time.
    pub fn verify<C: Claims>(&self, token: &str) -> Result<C> {
        self.verify_at(token, Timestamp::now())
    }

    /// Verifies `token` and validates its claims at the instant `now`.
    pub fn verify_at<C: Claims>(&self, token: &str, now: Timestamp) -> Result<C> {
        let claims: C = self.decode(token)?;
        claims.validate(now).map_err(|reason| {
            tracing::debug!(target: TRACING_TARGET_TOKEN, reason, "Token claims are invalid");
            Error::invalid_token(reason)
        })?;
        Ok(claims)
    }

    fn decode<C: Claims>(&self, token: &str) -> Result<C> {
        let header = jsonwebtoken::decode_header(token).map_err(|e| {
            tracing::debug!(target: TRACING_TARGET_TOKEN, error = %e, "Token header is malformed");
            Error::malformed_token()
        })?;

        if header.alg != TOKEN_ALGORITHM {
            tracing::warn!(
                target: TRACING_TARGET_TOKEN,
                algorithm = ?header.alg,
                "Rejected token with unsupported signing algorithm"
            );
            return Err(Error::malformed_token());
        }

        // The payload must decode into the claims before the signature is
        // considered, so a garbled body reads as malformed, not forged.
        let payload = token.split('.').nth(1).ok_or_else(Error::malformed_token)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| Error::malformed_token())?;
        serde_json::from_slice::<C>(&payload).map_err(|e| {
            tracing::debug!(target: TRACING_TARGET_TOKEN, error = %e, "Token claims are malformed");
            Error::malformed_token()
        })?;

        let data = jsonwebtoken::decode::<C>(token, &self.inner.decoding_key, &self.inner.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => {
                    tracing::debug!(target: TRACING_TARGET_TOKEN, "Token signature is invalid");
                    Error::invalid_signature()
                }
                _ => {
                    tracing::debug!(target: TRACING_TARGET_TOKEN, error = %e, "Token is malformed");
                    Error::malformed_token()
                }
            })?;

        Ok(data.claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &TOKEN_ALGORITHM)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use uuid::Uuid;

    use super::*;
    use crate::ErrorKind;
    use crate::token::{AccessToken, RefreshToken, UserToken};
    use crate::user::User;

    const SECRET: &str = "test-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).expect("codec")
    }

    fn access_token() -> AccessToken {
        AccessToken::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            "http://localhost",
            Timestamp::now(),
            SignedDuration::from_secs(300),
        )
    }

    fn assert_invalid_auth(result: Result<impl fmt::Debug>, message: &str) {
        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidAuth);
        assert_eq!(error.message(), message);
    }

    #[test]
    fn rejects_empty_secret() {
        let error = TokenCodec::new("").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn round_trips_every_token_kind() -> anyhow::Result<()> {
        let codec = codec();

        let access = access_token();
        let signed = codec.sign(&access)?;
        assert_eq!(codec.verify::<AccessToken>(&signed)?, access);

        let refresh = RefreshToken::new(&access, SignedDuration::from_hours(24));
        let signed = codec.sign(&refresh)?;
        assert_eq!(codec.verify::<RefreshToken>(&signed)?, refresh);

        let user = UserToken::new(&User::new("alice", "alice@example.com"), Timestamp::now());
        let signed = codec.sign(&user)?;
        assert_eq!(codec.verify::<UserToken>(&signed)?, user);
        Ok(())
    }

    #[test]
    fn rejects_foreign_signature() -> anyhow::Result<()> {
        let signed = TokenCodec::new("other-secret")?.sign(&access_token())?;
        assert_invalid_auth(codec().verify::<AccessToken>(&signed), "invalid signature");
        Ok(())
    }

    fn tamper(signed: &str) -> String {
        let (message, signature) = signed.rsplit_once('.').expect("three segments");

        let mut signature = signature.to_owned();
        let first = if signature.starts_with('A') { "B" } else { "A" };
        signature.replace_range(0..1, first);

        format!("{message}.{signature}")
    }

    #[test]
    fn rejects_tampered_signature() -> anyhow::Result<()> {
        let codec = codec();

        let access = access_token();
        let tampered = tamper(&codec.sign(&access)?);
        assert_invalid_auth(codec.verify::<AccessToken>(&tampered), "invalid signature");

        let refresh = RefreshToken::new(&access, SignedDuration::from_hours(24));
        let tampered = tamper(&codec.sign(&refresh)?);
        assert_invalid_auth(codec.verify::<RefreshToken>(&tampered), "invalid signature");

        let user = UserToken::new(&User::new("alice", "alice@example.com"), Timestamp::now());
        let tampered = tamper(&codec.sign(&user)?);
        assert_invalid_auth(codec.verify::<UserToken>(&tampered), "invalid signature");
        Ok(())
    }

    #[test]
    fn rejects_garbled_body() -> anyhow::Result<()> {
        let signed = codec().sign(&UserToken::new(
            &User::new("alice", "alice@example.com"),
            Timestamp::now(),
        ))?;
        let garbled = signed.replacen(".eyJ", ".EyJ", 1);

        assert_invalid_auth(codec().verify::<UserToken>(&garbled), "token is malformed");
        Ok(())
    }

    #[test]
    fn rejects_truncated_token() -> anyhow::Result<()> {
        let signed = codec().sign(&access_token())?;
        let truncated = &signed[..signed.len() / 2];

        assert_invalid_auth(codec().verify::<AccessToken>(truncated), "token is malformed");
        assert_invalid_auth(codec().verify::<AccessToken>(""), "token is malformed");
        Ok(())
    }

    #[test]
    fn rejects_unsupported_algorithm() -> anyhow::Result<()> {
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let signed = jsonwebtoken::encode(&Header::new(Algorithm::HS512), &access_token(), &key)?;
        assert_invalid_auth(codec().verify::<AccessToken>(&signed), "token is malformed");

        let unsigned = format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&access_token())?),
        );
        assert_invalid_auth(codec().verify::<AccessToken>(&unsigned), "token is malformed");
        Ok(())
    }

    #[test]
    fn rejects_wrong_claims_shape() -> anyhow::Result<()> {
        let signed = codec().sign(&access_token())?;
        assert_invalid_auth(codec().verify::<UserToken>(&signed), "token is malformed");
        Ok(())
    }

    #[test]
    fn reports_semantic_violations() -> anyhow::Result<()> {
        let codec = codec();

        let mut token = access_token();
        token.session_id = Uuid::nil();
        let signed = codec.sign(&token)?;
        assert_invalid_auth(
            codec.verify::<AccessToken>(&signed),
            "invalid token: token needs session",
        );

        let mut token = access_token();
        token.user_id = Uuid::nil();
        let signed = codec.sign(&token)?;
        assert_invalid_auth(
            codec.verify::<AccessToken>(&signed),
            "invalid token: token needs user",
        );

        let token = access_token();
        let signed = codec.sign(&token)?;
        let later = token.expires_at + SignedDuration::from_secs(1);
        assert_invalid_auth(
            codec.verify_at::<AccessToken>(&signed, later),
            "invalid token: token is expired",
        );

        let user = UserToken::new(&User::new("alice", "alice@example.com"), Timestamp::now());
        let signed = codec.sign(&user)?;
        let later = user.expires_at + SignedDuration::from_secs(1);
        assert_invalid_auth(
            codec.verify_at::<UserToken>(&signed, later),
            "invalid token: token is expired",
        );

        let mut user = UserToken::new(&User::new("alice", "alice@example.com"), Timestamp::now());
        user.user.name.clear();
        let signed = codec.sign(&user)?;
        assert_invalid_auth(
            codec.verify::<UserToken>(&signed),
            "invalid token: must have name",
        );
        Ok(())
    }

    #[test]
    fn debug_hides_keys() {
        let output = format!("{:?}", codec());
        assert!(!output.contains(SECRET));
    }
}
