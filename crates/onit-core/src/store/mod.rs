//! Persistence capabilities consumed by [`AuthService`].
//!
//! Every operation takes the caller's [`RequestContext`] and must abort with a
//! server-class error once its deadline passes or the request is cancelled.
//! Lookup misses are reported as not-found errors, persistence failures as
//! server errors prefixed with the failing operation.
//!
//! [`AuthService`]: crate::AuthService

mod memory;

use std::future::Future;

pub use memory::MemoryStore;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::password::Password;
use crate::token::RefreshToken;
use crate::user::User;
use crate::Result;

/// Storage of user records and their session lists.
pub trait UserStore: Send + Sync {
    /// Finds a user by id, failing with `cannot find user` on a miss.
    fn find_user_by_id(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Finds a user by its unique name, failing with `cannot find user` on a miss.
    fn find_user_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Inserts a new user.
    fn insert_user(
        &self,
        ctx: &RequestContext,
        user: &User,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Appends a session to the user's session list and returns the updated user.
    fn add_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Removes a session from the user's session list and returns the updated user.
    fn remove_session(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Empties the user's session list.
    fn clear_sessions(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Storage of password records, one per username.
pub trait PasswordStore: Send + Sync {
    /// Finds the password of `username`, failing with `must register first`
    /// on a miss.
    fn find_password_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> impl Future<Output = Result<Password>> + Send;

    /// Inserts a new password record.
    fn insert_password(
        &self,
        ctx: &RequestContext,
        password: &Password,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Replaces the salt and hash of an existing password record.
    fn update_password(
        &self,
        ctx: &RequestContext,
        username: &str,
        salt: &[u8],
        hashed_password: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Storage of issued refresh tokens.
pub trait RefreshTokenStore: Send + Sync {
    /// Returns whether the token of `session_id` exists and is unconsumed.
    fn check_refresh_token(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Inserts a newly issued refresh token.
    fn insert_refresh_token(
        &self,
        ctx: &RequestContext,
        token: &RefreshToken,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Marks the token of `session_id` as consumed.
    ///
    /// The transition happens only if the token is currently unconsumed, and
    /// at most one of any number of concurrent callers succeeds. Every other
    /// caller fails with `session has expired`.
    fn consume_refresh_token(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deletes every refresh token issued to `user_id`, returning the count.
    fn delete_refresh_tokens_by_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> impl Future<Output = Result<u64>> + Send;
}

/// All stores required by [`AuthService`], plus atomic account creation.
///
/// [`AuthService`]: crate::AuthService
pub trait AuthStore: UserStore + PasswordStore + RefreshTokenStore {
    /// Inserts a user together with its password record.
    ///
    /// Either both records are persisted or neither is.
    fn insert_account(
        &self,
        ctx: &RequestContext,
        user: &User,
        password: &Password,
    ) -> impl Future<Output = Result<()>> + Send;
}
