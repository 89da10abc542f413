//! Database models for all tables.
//!
//! Tables read back as rows have a queryable type next to their insertable
//! `New*` type. `user_sessions` is only ever read as a list of session ids.

mod password;
mod refresh_token;
mod user;
mod user_session;

pub use password::{NewPassword, Password, UpdatePassword};
pub use refresh_token::{NewRefreshToken, RefreshToken};
pub use user::{NewUser, User};
pub use user_session::NewUserSession;
