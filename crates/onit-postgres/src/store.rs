//! `onit-core` store traits backed by PostgreSQL.

use diesel_async::scoped_futures::ScopedFutureExt;
use onit_core::password::Password;
use onit_core::store::{AuthStore, PasswordStore, RefreshTokenStore, UserStore};
use onit_core::token::RefreshToken;
use onit_core::user::User;
use onit_core::{Error, RequestContext, Result};
use uuid::Uuid;

use crate::model::{NewPassword, NewRefreshToken, NewUser, UpdatePassword};
use crate::query::{PasswordRepository, RefreshTokenRepository, UserRepository};
use crate::types::ConstraintViolation;
use crate::{PgClient, PgConn, PgError, TRACING_TARGET_QUERY};

const FIND_USER: &str = "failed to find user";
const CREATE_USER: &str = "failed to create user";
const ADD_SESSION: &str = "failed to add user session";
const REMOVE_SESSION: &str = "failed to remove user session";
const CLEAR_SESSIONS: &str = "failed to clear user sessions";
const FIND_PASSWORD: &str = "failed to find password";
const CREATE_PASSWORD: &str = "failed to create password";
const UPDATE_PASSWORD: &str = "failed to update password";
const FIND_REFRESH_TOKEN: &str = "failed to find refresh token";
const CREATE_SESSION: &str = "failed to create session";
const REFRESH_SESSION: &str = "failed to refresh session";
const DELETE_SESSIONS: &str = "failed to delete sessions";

/// Wraps a database failure with the operation that failed.
fn failed(operation: &'static str) -> impl FnOnce(PgError) -> Error {
    move |error| {
        tracing::error!(target: TRACING_TARGET_QUERY, error = %error, operation, "Store operation failed");
        Error::from(error).context(operation)
    }
}

/// Maps an insert failure, reporting duplicate keys as conflicts.
fn insert_failed(operation: &'static str) -> impl FnOnce(PgError) -> Error {
    move |error| match error.constraint_violation() {
        Some(violation @ ConstraintViolation::User(_)) if violation.is_uniqueness() => {
            Error::bad_request("failed to create user: user already exists")
        }
        Some(violation @ ConstraintViolation::Password(_)) if violation.is_uniqueness() => {
            Error::bad_request("failed to create password: password already exists")
        }
        Some(violation @ ConstraintViolation::RefreshToken(_)) if violation.is_uniqueness() => {
            Error::server("failed to create session: session already exists")
        }
        _ => failed(operation)(error),
    }
}

impl PgClient {
    async fn connection(&self, operation: &'static str) -> Result<PgConn> {
        self.get_connection().await.map_err(failed(operation))
    }

    /// Loads a user together with its ordered session list.
    async fn load_user(&self, conn: &mut PgConn, user_id: Uuid) -> Result<User> {
        let user = conn
            .find_user_by_id(user_id)
            .await
            .map_err(failed(FIND_USER))?
            .ok_or_else(Error::user_not_found)?;
        let sessions = conn
            .list_user_sessions(user_id)
            .await
            .map_err(failed(FIND_USER))?;

        Ok(user.into_domain(sessions))
    }
}

impl UserStore for PgClient {
    async fn find_user_by_id(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User> {
        ctx.run(async {
            let mut conn = self.connection(FIND_USER).await?;
            self.load_user(&mut conn, user_id).await
        })
        .await
    }

    async fn find_user_by_name(&self, ctx: &RequestContext, name: &str) -> Result<User> {
        ctx.run(async {
            let mut conn = self.connection(FIND_USER).await?;
            let user = conn
                .find_user_by_name(name)
                .await
                .map_err(failed(FIND_USER))?
                .ok_or_else(Error::user_not_found)?;
            let sessions = conn
                .list_user_sessions(user.id)
                .await
                .map_err(failed(FIND_USER))?;

            Ok(user.into_domain(sessions))
        })
        .await
    }

    async fn insert_user(&self, ctx: &RequestContext, user: &User) -> Result<()> {
        ctx.run(async {
            let mut conn = self.connection(CREATE_USER).await?;
            conn.create_user(NewUser::from(user))
                .await
                .map_err(insert_failed(CREATE_USER))?;
            Ok(())
        })
        .await
    }

    async fn add_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<User> {
        ctx.run(async {
            let mut conn = self.connection(ADD_SESSION).await?;
            // The foreign key would reject the insert anyway, this keeps the
            // miss a not-found error.
            conn.find_user_by_id(user_id)
                .await
                .map_err(failed(ADD_SESSION))?
                .ok_or_else(Error::user_not_found)?;
            conn.add_user_session(user_id, session_id)
                .await
                .map_err(failed(ADD_SESSION))?;

            self.load_user(&mut conn, user_id).await
        })
        .await
    }

    async fn remove_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<User> {
        ctx.run(async {
            let mut conn = self.connection(REMOVE_SESSION).await?;
            conn.remove_user_session(user_id, session_id)
                .await
                .map_err(failed(REMOVE_SESSION))?;

            self.load_user(&mut conn, user_id).await
        })
        .await
    }

    async fn clear_sessions(&self, ctx: &RequestContext, user_id: Uuid) -> Result<()> {
        ctx.run(async {
            let mut conn = self.connection(CLEAR_SESSIONS).await?;
            conn.clear_user_sessions(user_id)
                .await
                .map_err(failed(CLEAR_SESSIONS))?;
            Ok(())
        })
        .await
    }
}

impl PasswordStore for PgClient {
    async fn find_password_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<Password> {
        ctx.run(async {
            let mut conn = self.connection(FIND_PASSWORD).await?;
            conn.find_password_by_username(username)
                .await
                .map_err(failed(FIND_PASSWORD))?
                .ok_or_else(|| Error::not_found("must register first"))?
                .into_domain()
                .map_err(failed(FIND_PASSWORD))
        })
        .await
    }

    async fn insert_password(&self, ctx: &RequestContext, password: &Password) -> Result<()> {
        ctx.run(async {
            let new_password = NewPassword::try_from(password).map_err(failed(CREATE_PASSWORD))?;
            let mut conn = self.connection(CREATE_PASSWORD).await?;
            conn.create_password(new_password)
                .await
                .map_err(insert_failed(CREATE_PASSWORD))?;
            Ok(())
        })
        .await
    }

    async fn update_password(
        &self,
        ctx: &RequestContext,
        username: &str,
        salt: &[u8],
        hashed_password: &[u8],
    ) -> Result<()> {
        ctx.run(async {
            let mut conn = self.connection(UPDATE_PASSWORD).await?;
            conn.update_password(username, UpdatePassword::new(salt, hashed_password))
                .await
                .map_err(failed(UPDATE_PASSWORD))?
                .ok_or_else(|| Error::not_found("must register first"))?;
            Ok(())
        })
        .await
    }
}

impl RefreshTokenStore for PgClient {
    async fn check_refresh_token(&self, ctx: &RequestContext, session_id: Uuid) -> Result<bool> {
        ctx.run(async {
            let mut conn = self.connection(FIND_REFRESH_TOKEN).await?;
            let token = conn
                .find_refresh_token(session_id)
                .await
                .map_err(failed(FIND_REFRESH_TOKEN))?;

            Ok(token.is_some_and(|token| !token.consumed))
        })
        .await
    }

    async fn insert_refresh_token(&self, ctx: &RequestContext, token: &RefreshToken) -> Result<()> {
        ctx.run(async {
            let mut conn = self.connection(CREATE_SESSION).await?;
            conn.create_refresh_token(NewRefreshToken::from(token))
                .await
                .map_err(insert_failed(CREATE_SESSION))?;
            Ok(())
        })
        .await
    }

    async fn consume_refresh_token(&self, ctx: &RequestContext, session_id: Uuid) -> Result<()> {
        ctx.run(async {
            let mut conn = self.connection(REFRESH_SESSION).await?;
            let consumed = conn
                .consume_refresh_token(session_id)
                .await
                .map_err(failed(REFRESH_SESSION))?;

            if !consumed {
                tracing::debug!(
                    target: TRACING_TARGET_QUERY,
                    session_id = %session_id,
                    "Refresh token missing or already consumed"
                );
                return Err(Error::session_expired());
            }
            Ok(())
        })
        .await
    }

    async fn delete_refresh_tokens_by_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<u64> {
        ctx.run(async {
            let mut conn = self.connection(DELETE_SESSIONS).await?;
            let deleted = conn
                .delete_refresh_tokens_by_user(user_id)
                .await
                .map_err(failed(DELETE_SESSIONS))?;
            Ok(deleted as u64)
        })
        .await
    }
}

impl AuthStore for PgClient {
    async fn insert_account(
        &self,
        ctx: &RequestContext,
        user: &User,
        password: &Password,
    ) -> Result<()> {
        ctx.run(async {
            let new_user = NewUser::from(user);
            let new_password = NewPassword::try_from(password).map_err(failed(CREATE_PASSWORD))?;

            let mut conn = self.connection(CREATE_USER).await?;
            conn.transaction(|conn| {
                async move {
                    conn.create_user(new_user).await?;
                    conn.create_password(new_password).await?;
                    Ok::<_, PgError>(())
                }
                .scope_boxed()
            })
            .await
            .map_err(insert_failed(CREATE_USER))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use onit_core::ErrorKind;

    use super::*;

    #[test]
    fn failures_carry_the_operation() {
        let error = failed(FIND_REFRESH_TOKEN)(PgError::Unexpected("boom".into()));
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(
            error.message(),
            "failed to find refresh token: unexpected error: boom"
        );
    }

    #[test]
    fn unknown_insert_failures_are_server_errors() {
        let error = insert_failed(CREATE_SESSION)(PgError::Unexpected("boom".into()));
        assert_eq!(error.kind(), ErrorKind::Server);
        assert!(error.message().starts_with(CREATE_SESSION));
    }
}
