//! Session token claims and their signed encoding.

mod claims;
mod codec;

pub use claims::{
    AccessToken, Claims, RefreshToken, SessionTokens, TOKEN_AUDIENCE, USER_TOKEN_LIFETIME,
    UserToken,
};
pub use codec::{TOKEN_ALGORITHM, TokenCodec};

/// Cookie carrying the signed access token.
pub const COOKIE_ACCESS_TOKEN: &str = "access-token";

/// Cookie carrying the signed refresh token.
pub const COOKIE_REFRESH_TOKEN: &str = "refresh-token";

/// Cookie carrying the signed user-identity token.
pub const COOKIE_USER_TOKEN: &str = "user-token";
