//! Enumerations mirroring PostgreSQL enum types.

mod user_status;
mod user_type;

pub use user_status::UserStatus;
pub use user_type::UserType;
