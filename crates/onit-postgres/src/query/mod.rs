//! Database query repositories for all tables.
//!
//! Repositories are implemented directly on [`PgConnection`], so they are
//! available on pooled connections and inside transactions alike.
//!
//! [`PgConnection`]: crate::PgConnection

pub mod password;
pub mod refresh_token;
pub mod user;

pub use password::PasswordRepository;
pub use refresh_token::RefreshTokenRepository;
pub use user::UserRepository;
