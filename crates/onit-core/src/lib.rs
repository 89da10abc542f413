#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for session lifecycle operations.
pub const TRACING_TARGET_SERVICE: &str = "onit_core::service";

/// Tracing target for password derivation and verification.
pub const TRACING_TARGET_PASSWORD: &str = "onit_core::password";

/// Tracing target for token signing and verification.
pub const TRACING_TARGET_TOKEN: &str = "onit_core::token";

/// Tracing target for store implementations.
pub const TRACING_TARGET_STORE: &str = "onit_core::store";

mod config;
mod context;
mod error;
pub mod password;
mod service;
pub mod store;
pub mod token;
pub mod user;

pub use crate::config::{AuthConfig, base_url};
pub use crate::context::RequestContext;
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::service::{AuthService, Authenticated, Session, SignedSession};

/// Commonly used items.
pub mod prelude {
    pub use crate::password::{Password, PasswordHasher};
    pub use crate::store::{AuthStore, MemoryStore, PasswordStore, RefreshTokenStore, UserStore};
    pub use crate::token::{AccessToken, RefreshToken, SessionTokens, TokenCodec, UserToken};
    pub use crate::user::{Credentials, Registration, User, UserStatus, UserType};
    pub use crate::{AuthConfig, AuthService, Error, ErrorKind, RequestContext, Result};
}
