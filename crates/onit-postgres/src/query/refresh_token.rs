//! Refresh token repository for single-use session renewal.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewRefreshToken, RefreshToken};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for refresh token database operations.
pub trait RefreshTokenRepository {
    /// Stores a newly issued refresh token.
    fn create_refresh_token(
        &mut self,
        new_token: NewRefreshToken,
    ) -> impl Future<Output = PgResult<RefreshToken>> + Send;

    /// Finds the refresh token of a session.
    fn find_refresh_token(
        &mut self,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<RefreshToken>>> + Send;

    /// Marks the token of a session as consumed.
    ///
    /// The update only matches an unconsumed row, so among concurrent callers
    /// exactly one observes `true`.
    fn consume_refresh_token(
        &mut self,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Deletes every refresh token issued to a user, returning the count.
    fn delete_refresh_tokens_by_user(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl RefreshTokenRepository for PgConnection {
    async fn create_refresh_token(&mut self, new_token: NewRefreshToken) -> PgResult<RefreshToken> {
        use schema::refresh_tokens;

        diesel::insert_into(refresh_tokens::table)
            .values(&new_token)
            .returning(RefreshToken::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_refresh_token(&mut self, session_id: Uuid) -> PgResult<Option<RefreshToken>> {
        use schema::refresh_tokens::{self, dsl};

        refresh_tokens::table
            .filter(dsl::session_id.eq(session_id))
            .select(RefreshToken::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn consume_refresh_token(&mut self, session_id: Uuid) -> PgResult<bool> {
        use schema::refresh_tokens::{self, dsl};

        let updated = diesel::update(
            refresh_tokens::table
                .filter(dsl::session_id.eq(session_id))
                .filter(dsl::consumed.eq(false)),
        )
        .set(dsl::consumed.eq(true))
        .execute(self)
        .await
        .map_err(PgError::from)?;

        Ok(updated == 1)
    }

    async fn delete_refresh_tokens_by_user(&mut self, user_id: Uuid) -> PgResult<usize> {
        use schema::refresh_tokens::{self, dsl};

        diesel::delete(refresh_tokens::table.filter(dsl::user_id.eq(user_id)))
            .execute(self)
            .await
            .map_err(PgError::from)
    }
}
