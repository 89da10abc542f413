//! Database errors and how they surface as [`onit_core::Error`].

use std::borrow::Cow;

pub use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::Error as QueryError;
use diesel_async::pooled_connection::PoolError as ManagerError;
pub use diesel_async::pooled_connection::deadpool::PoolError;

use crate::TRACING_TARGET_CONNECTION;
use crate::types::ConstraintViolation;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type PgResult<T, E = PgError> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[must_use = "database errors must be handled or converted"]
pub enum PgError {
    #[error("configuration error: {0}")]
    Config(String),

    /// No connection could be created, handed out or recycled in time.
    #[error("database operation timed out")]
    Timeout(TimeoutType),

    #[error("database connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("database migration error: {0}")]
    Migration(BoxError),

    /// The statement failed, including constraint violations.
    #[error("database query error: {0}")]
    Query(#[from] QueryError),

    /// A stored row does not decode into its domain record.
    #[error("corrupted record: {0}")]
    Corrupted(Cow<'static, str>),

    #[error("unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Name of the violated constraint, if the database reported one.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            PgError::Query(QueryError::DatabaseError(_, info)) => info.constraint_name(),
            _ => None,
        }
    }

    /// The violated constraint, if it belongs to this crate's schema.
    pub fn constraint_violation(&self) -> Option<ConstraintViolation> {
        self.constraint().and_then(ConstraintViolation::new)
    }

    /// Returns whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_) | PgError::Connection(ConnectionError::BadConnection(_))
        )
    }

    #[inline]
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

fn timeout_stage(timeout: &TimeoutType) -> &'static str {
    match timeout {
        TimeoutType::Wait => "waiting for a free connection",
        TimeoutType::Create => "opening a connection",
        TimeoutType::Recycle => "recycling a connection",
    }
}

impl From<PoolError> for PgError {
    fn from(value: PoolError) -> Self {
        match value {
            PoolError::Timeout(timeout) => Self::Timeout(timeout),
            PoolError::Backend(ManagerError::ConnectionError(error)) => Self::Connection(error),
            PoolError::Backend(ManagerError::QueryError(error)) => Self::Query(error),
            PoolError::Closed => Self::Connection(ConnectionError::BadConnection(
                "connection pool is closed".to_owned(),
            )),
            PoolError::NoRuntimeSpecified => Self::Config("connection pool has no runtime".to_owned()),
            PoolError::PostCreateHook(error) => Self::Unexpected(error.to_string().into()),
        }
    }
}

/// Timeouts and connection failures become `server_unavailable`, anything
/// else is a `server` error. The database error is kept as the source.
impl From<PgError> for onit_core::Error {
    fn from(value: PgError) -> Self {
        let error = match &value {
            PgError::Timeout(timeout) => {
                tracing::warn!(
                    target: TRACING_TARGET_CONNECTION,
                    stage = timeout_stage(timeout),
                    "Database operation timed out"
                );
                onit_core::Error::server_unavailable(value.to_string())
            }
            PgError::Connection(_) => onit_core::Error::server_unavailable(value.to_string()),
            _ => onit_core::Error::server(value.to_string()),
        };

        error.with_source(value)
    }
}

#[cfg(test)]
mod tests {
    use onit_core::ErrorKind;

    use super::*;

    #[test]
    fn timeouts_are_unavailable() {
        let error = onit_core::Error::from(PgError::Timeout(TimeoutType::Wait));
        assert_eq!(error.kind(), ErrorKind::ServerUnavailable);
        assert_eq!(error.message(), "database operation timed out");
        assert!(PgError::Timeout(TimeoutType::Create).is_transient());
    }

    #[test]
    fn closed_pool_is_unavailable() {
        let error = onit_core::Error::from(PgError::from(PoolError::Closed));
        assert_eq!(error.kind(), ErrorKind::ServerUnavailable);
    }

    #[test]
    fn query_failures_keep_the_operation() {
        let error = onit_core::Error::from(PgError::Query(QueryError::NotFound))
            .context("failed to find user");
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(
            error.message(),
            "failed to find user: database query error: Record not found"
        );
    }

    #[test]
    fn corrupted_rows_are_permanent() {
        let error = PgError::Corrupted("unsupported digest type".into());
        assert!(error.is_permanent());
        assert_eq!(error.constraint(), None);
    }
}
