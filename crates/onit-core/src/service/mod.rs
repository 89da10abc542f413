//! Session lifecycle: registration, login, logout and token rotation.

mod session;

use jiff::{SignedDuration, Timestamp};
pub use session::{Authenticated, Session, SignedSession};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::RequestContext;
use crate::password::PasswordHasher;
use crate::store::AuthStore;
use crate::token::{AccessToken, Claims, RefreshToken, SessionTokens, TokenCodec, UserToken};
use crate::user::{Credentials, Registration, User};
use crate::{Error, Result, TRACING_TARGET_SERVICE};

/// Orchestrates users, passwords and session tokens over an [`AuthStore`].
///
/// The service holds no mutable state of its own. Every coordination point
/// between concurrent requests lives in the store, most importantly the
/// conditional consumption of refresh tokens.
#[derive(Debug, Clone)]
pub struct AuthService<S> {
    store: S,
    codec: TokenCodec,
    hasher: PasswordHasher,
    issuer: String,
    access_ttl: SignedDuration,
    refresh_ttl: SignedDuration,
}

impl<S: AuthStore> AuthService<S> {
    /// Creates a new service from a validated configuration.
    pub fn new(config: &AuthConfig, store: S) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            issuer = %config.issuer,
            access_token_expiry_secs = config.access_token_expiry_secs,
            refresh_token_expiry_days = config.refresh_token_expiry_days,
            "Authentication service initialized"
        );

        Ok(Self {
            store,
            codec: TokenCodec::new(&config.jwt_secret)?,
            hasher: PasswordHasher::new(&config.password_pepper),
            issuer: config.issuer.clone(),
            access_ttl: config.access_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
        })
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Registers a new user.
    ///
    /// The user and its password record are persisted as one unit.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_SERVICE,
        fields(request_id = %ctx.request_id(), username = %registration.credentials.username)
    )]
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        registration: &Registration,
    ) -> Result<User> {
        registration
            .validate()
            .map_err(|reason| Error::bad_request(format!("failed to make user: {reason}")))?;

        let user = User::new(&registration.credentials.username, &registration.email);
        let password = self.hasher.hash_password(&registration.credentials)?;

        self.store.insert_account(ctx, &user, &password).await?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            user_id = %user.id,
            "User registered"
        );

        Ok(user)
    }

    /// Verifies `credentials` and opens a new session.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_SERVICE,
        fields(request_id = %ctx.request_id(), username = %credentials.username)
    )]
    pub async fn login(&self, ctx: &RequestContext, credentials: &Credentials) -> Result<Session> {
        let user = self
            .store
            .find_user_by_name(ctx, &credentials.username)
            .await?;
        let password = self
            .store
            .find_password_by_username(ctx, &credentials.username)
            .await?;

        if let Err(error) = self.hasher.verify(&password, &credentials.password) {
            tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                user_id = %user.id,
                "Login rejected"
            );
            return Err(error);
        }

        let session = self.make_session(ctx, user.id, None).await?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            user_id = %session.user.id,
            session_id = %session.tokens.session_id(),
            "User logged in"
        );

        Ok(session)
    }

    /// Ends every session of the user.
    ///
    /// Clears the session list and deletes all refresh tokens of the user. A
    /// caller without a resolvable user is a no-op.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SERVICE, fields(request_id = %ctx.request_id()))]
    pub async fn logout(&self, ctx: &RequestContext, user_id: Option<Uuid>) -> Result<()> {
        let Some(user_id) = user_id else {
            tracing::debug!(target: TRACING_TARGET_SERVICE, "Logout without user, nothing to do");
            return Ok(());
        };

        self.store.clear_sessions(ctx, user_id).await?;
        let deleted = self.store.delete_refresh_tokens_by_user(ctx, user_id).await?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            user_id = %user_id,
            refresh_tokens_deleted = deleted,
            "User logged out of all sessions"
        );

        Ok(())
    }

    /// Exchanges a refresh token for a new session.
    ///
    /// Consuming the token is the linearization point: of several concurrent
    /// refreshes with the same token only one succeeds, every other fails
    /// with `session has expired`.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_SERVICE,
        fields(request_id = %ctx.request_id(), session_id = %refresh.session_id)
    )]
    pub async fn refresh_access(
        &self,
        ctx: &RequestContext,
        refresh: &RefreshToken,
    ) -> Result<Session> {
        if let Err(error) = self
            .store
            .consume_refresh_token(ctx, refresh.session_id)
            .await
        {
            tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                user_id = %refresh.user_id,
                error = %error,
                "Refresh token rejected"
            );
            return Err(error);
        }

        let session = self
            .make_session(ctx, refresh.user_id, Some(refresh.session_id))
            .await?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            user_id = %session.user.id,
            previous_session_id = %refresh.session_id,
            session_id = %session.tokens.session_id(),
            "Session rotated"
        );

        Ok(session)
    }

    /// Resolves the caller from its already verified access and user tokens.
    ///
    /// Fails with `must authenticate` if either token is missing and with
    /// `invalid session` if the access token's session is no longer active.
    /// On success the user token is re-signed from the current record.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SERVICE, fields(request_id = %ctx.request_id()))]
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        access: Option<&AccessToken>,
        user_token: Option<&UserToken>,
    ) -> Result<Authenticated> {
        let (Some(access), Some(user_token)) = (access, user_token) else {
            return Err(Error::must_authenticate());
        };

        if access.user_id != user_token.id {
            tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                user_id = %access.user_id,
                "Access token and user token belong to different users"
            );
            return Err(Error::invalid_session());
        }

        let user = self.store.find_user_by_id(ctx, user_token.id).await?;
        if !user.has_session(access.session_id) {
            tracing::debug!(
                target: TRACING_TARGET_SERVICE,
                user_id = %user.id,
                session_id = %access.session_id,
                "Session is not active"
            );
            return Err(Error::invalid_session());
        }

        let claims = UserToken::new(&user, Timestamp::now());
        let signed = self.codec.sign(&claims)?;

        Ok(Authenticated {
            user,
            user_token: signed,
            user_expires_at: claims.expires_at,
        })
    }

    /// Ensures the refresh token is still unconsumed.
    pub async fn check_refresh(&self, ctx: &RequestContext, refresh: &RefreshToken) -> Result<()> {
        if !self
            .store
            .check_refresh_token(ctx, refresh.session_id)
            .await?
        {
            return Err(Error::invalid_session());
        }
        Ok(())
    }

    /// Verifies a signed token and validates its claims.
    pub fn parse_token<C: Claims>(&self, token: &str) -> Result<C> {
        self.codec.verify(token)
    }

    /// Signs token claims.
    pub fn sign_token<C: Claims>(&self, claims: &C) -> Result<String> {
        self.codec.sign(claims)
    }

    /// Signs the access, refresh and user token of a session.
    pub fn sign_session(&self, session: &Session) -> Result<SignedSession> {
        let user = UserToken::new(&session.user, session.tokens.access.issued_at);

        Ok(SignedSession {
            access_token: self.codec.sign(&session.tokens.access)?,
            access_expires_at: session.tokens.access.expires_at,
            refresh_token: self.codec.sign(&session.tokens.refresh)?,
            refresh_expires_at: session.tokens.refresh.expires_at,
            user_token: self.codec.sign(&user)?,
            user_expires_at: user.expires_at,
        })
    }

    /// Issues a new token pair and records its session on the user.
    ///
    /// The new session is added before the previous one is removed. A failure
    /// in between leaves both sessions listed, the previous one being
    /// unusable for refresh because its token is already consumed.
    async fn make_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        previous_session_id: Option<Uuid>,
    ) -> Result<Session> {
        let session_id = Uuid::now_v7();
        let access = AccessToken::new(
            session_id,
            user_id,
            &self.issuer,
            Timestamp::now(),
            self.access_ttl,
        );
        let refresh = RefreshToken::new(&access, self.refresh_ttl);

        self.store.insert_refresh_token(ctx, &refresh).await?;
        let mut user = self.store.add_session(ctx, user_id, session_id).await?;

        if let Some(previous_session_id) = previous_session_id {
            user = self
                .store
                .remove_session(ctx, user_id, previous_session_id)
                .await?;
        }

        Ok(Session {
            user,
            tokens: SessionTokens { access, refresh },
        })
    }
}
