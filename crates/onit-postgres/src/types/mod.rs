//! Contains constraints, enumerations and other custom types.

mod constraint;
mod enums;

pub use constraint::{
    ConstraintCategory, ConstraintViolation, PasswordConstraints, RefreshTokenConstraints,
    UserConstraints, UserSessionConstraints,
};
pub use enums::{UserStatus, UserType};
