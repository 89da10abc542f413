//! Embedded schema migrations.
//!
//! Migrations are compiled into the crate and applied through
//! [`PgClientMigrationExt`].

mod harness;

use std::future::Future;
use std::time::Duration;

pub use harness::{migration_status, run_pending_migrations, verify_schema_integrity};

use crate::{PgClient, PgResult};

/// Applied and pending versions of the embedded migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Versions recorded in the database, oldest first.
    pub applied: Vec<String>,
    /// Embedded versions the database has not seen yet.
    pub pending: Vec<String>,
}

impl MigrationStatus {
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the most recently applied version.
    pub fn current_version(&self) -> Option<&str> {
        self.applied.last().map(String::as_str)
    }
}

/// Versions applied by a single migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub elapsed: Duration,
}

impl MigrationReport {
    /// Returns whether the schema was already up to date.
    #[inline]
    pub fn is_no_op(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Migration operations on a [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every pending migration. An up-to-date schema is left untouched.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationReport>> + Send;

    /// Compares the embedded migrations with those recorded in the database.
    fn migration_status(&self) -> impl Future<Output = PgResult<MigrationStatus>> + Send;

    /// Fails unless the database was migrated and nothing is pending.
    fn verify_schema_integrity(&self) -> impl Future<Output = PgResult<()>> + Send;
}

impl PgClientMigrationExt for PgClient {
    async fn run_pending_migrations(&self) -> PgResult<MigrationReport> {
        run_pending_migrations(self).await
    }

    async fn migration_status(&self) -> PgResult<MigrationStatus> {
        let mut conn = self.get_connection().await?;
        migration_status(&mut conn).await
    }

    async fn verify_schema_integrity(&self) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        verify_schema_integrity(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tracks_pending_versions() {
        let status = MigrationStatus {
            applied: vec!["20250101000000".to_owned()],
            pending: vec!["20250201000000".to_owned()],
        };
        assert!(!status.is_up_to_date());
        assert_eq!(status.current_version(), Some("20250101000000"));

        let fresh = MigrationStatus::default();
        assert_eq!(fresh.current_version(), None);
        assert!(fresh.is_up_to_date());
    }

    #[test]
    fn empty_report_is_a_no_op() {
        let report = MigrationReport {
            applied: Vec::new(),
            elapsed: Duration::from_millis(3),
        };
        assert!(report.is_no_op());
    }
}
