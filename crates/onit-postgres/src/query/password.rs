//! Password repository for managing stored password records.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewPassword, Password, UpdatePassword};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for password database operations.
pub trait PasswordRepository {
    /// Creates a new password record.
    fn create_password(
        &mut self,
        new_password: NewPassword,
    ) -> impl Future<Output = PgResult<Password>> + Send;

    /// Finds the password record of a user.
    fn find_password_by_username(
        &mut self,
        username: &str,
    ) -> impl Future<Output = PgResult<Option<Password>>> + Send;

    /// Replaces the salt and hash of a user's password record.
    ///
    /// Returns `None` if the user has no password record.
    fn update_password(
        &mut self,
        username: &str,
        changes: UpdatePassword,
    ) -> impl Future<Output = PgResult<Option<Password>>> + Send;
}

impl PasswordRepository for PgConnection {
    async fn create_password(&mut self, new_password: NewPassword) -> PgResult<Password> {
        use schema::passwords;

        diesel::insert_into(passwords::table)
            .values(&new_password)
            .returning(Password::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_password_by_username(&mut self, username: &str) -> PgResult<Option<Password>> {
        use schema::passwords::{self, dsl};

        passwords::table
            .filter(dsl::username.eq(username))
            .select(Password::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn update_password(
        &mut self,
        username: &str,
        changes: UpdatePassword,
    ) -> PgResult<Option<Password>> {
        use schema::passwords::{self, dsl};

        diesel::update(passwords::table.filter(dsl::username.eq(username)))
            .set(&changes)
            .returning(Password::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)
    }
}
