//! User repository for managing users and their session lists.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewUser, NewUserSession, User};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for user and user session database operations.
pub trait UserRepository {
    /// Creates a new user.
    fn create_user(&mut self, new_user: NewUser) -> impl Future<Output = PgResult<User>> + Send;

    /// Finds a user by its ID.
    fn find_user_by_id(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Finds a user by its unique name.
    fn find_user_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Lists the session ids of a user in insertion order.
    fn list_user_sessions(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Uuid>>> + Send;

    /// Appends a session to the user's list.
    ///
    /// Returns `false` if the session was already listed.
    fn add_user_session(
        &mut self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Removes a session from the user's list.
    ///
    /// Returns `false` if the session was not listed.
    fn remove_user_session(
        &mut self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Removes every session of the user, returning the count.
    fn clear_user_sessions(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl UserRepository for PgConnection {
    async fn create_user(&mut self, new_user: NewUser) -> PgResult<User> {
        use schema::users;

        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_user_by_id(&mut self, user_id: Uuid) -> PgResult<Option<User>> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::id.eq(user_id))
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_user_by_name(&mut self, name: &str) -> PgResult<Option<User>> {
        use schema::users::{self, dsl};

        users::table
            .filter(dsl::name.eq(name))
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn list_user_sessions(&mut self, user_id: Uuid) -> PgResult<Vec<Uuid>> {
        use schema::user_sessions::{self, dsl};

        user_sessions::table
            .filter(dsl::user_id.eq(user_id))
            .order(dsl::position.asc())
            .select(dsl::session_id)
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn add_user_session(&mut self, user_id: Uuid, session_id: Uuid) -> PgResult<bool> {
        use schema::user_sessions;

        let new_session = NewUserSession {
            user_id,
            session_id,
        };

        let inserted = diesel::insert_into(user_sessions::table)
            .values(&new_session)
            .on_conflict_do_nothing()
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(inserted > 0)
    }

    async fn remove_user_session(&mut self, user_id: Uuid, session_id: Uuid) -> PgResult<bool> {
        use schema::user_sessions::{self, dsl};

        let removed = diesel::delete(
            user_sessions::table
                .filter(dsl::user_id.eq(user_id))
                .filter(dsl::session_id.eq(session_id)),
        )
        .execute(self)
        .await
        .map_err(PgError::from)?;

        Ok(removed > 0)
    }

    async fn clear_user_sessions(&mut self, user_id: Uuid) -> PgResult<usize> {
        use schema::user_sessions::{self, dsl};

        diesel::delete(user_sessions::table.filter(dsl::user_id.eq(user_id)))
            .execute(self)
            .await
            .map_err(PgError::from)
    }
}
