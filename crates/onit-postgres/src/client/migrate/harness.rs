//! diesel's migration harness is synchronous, so migrations run on the
//! blocking pool over a wrapped pooled connection. Status queries stay async.

use std::time::Instant;

use diesel::migration::{Migration, MigrationName, MigrationSource};
use diesel::pg::Pg;
use diesel::sql_types::{Bool, Text};
use diesel::{QueryableByName, sql_query};
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::PoolableConnection;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use super::{MigrationReport, MigrationStatus};
use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

#[derive(QueryableByName)]
struct AppliedVersion {
    #[diesel(sql_type = Text)]
    version: String,
}

#[derive(QueryableByName)]
struct TableExists {
    #[diesel(sql_type = Bool)]
    exists: bool,
}

/// Applies every pending embedded migration.
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<MigrationReport> {
    let start = Instant::now();
    let mut conn = pg.get_pooled_connection().await?;

    let status = migration_status(&mut conn).await?;
    if status.is_up_to_date() {
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            current_version = status.current_version(),
            "Database schema is up to date"
        );
        return Ok(MigrationReport {
            applied: Vec::new(),
            elapsed: start.elapsed(),
        });
    }

    if conn.is_broken() {
        return Err(PgError::Migration(
            "connection is broken before migrations".into(),
        ));
    }

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        pending = status.pending.len(),
        "Applying pending migrations"
    );

    let mut conn: AsyncConnectionWrapper<_> = conn.into();
    let applied = tokio::task::spawn_blocking(move || {
        conn.run_pending_migrations(MIGRATIONS).map(|versions| {
            versions
                .into_iter()
                .map(|version| version.to_string())
                .collect::<Vec<_>>()
        })
    })
    .await
    .map_err(|e| PgError::Migration(e.into()))?
    .map_err(|e| {
        tracing::error!(target: TRACING_TARGET_MIGRATION, error = %e, "Database migration failed");
        PgError::Migration(e)
    })?;

    let elapsed = start.elapsed();
    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        elapsed = ?elapsed,
        applied = applied.len(),
        "Database migrations applied"
    );

    Ok(MigrationReport { applied, elapsed })
}

/// Compares the embedded migrations with those recorded in the database.
///
/// A database that was never migrated reports every migration as pending.
pub async fn migration_status(conn: &mut AsyncPgConnection) -> PgResult<MigrationStatus> {
    let applied = applied_versions(conn).await?;

    let embedded = <EmbeddedMigrations as MigrationSource<Pg>>::migrations(&MIGRATIONS)
        .map_err(PgError::Migration)?;
    let pending = embedded
        .iter()
        .map(|migration| migration.name().version().to_string())
        .filter(|version| !applied.contains(version))
        .collect();

    Ok(MigrationStatus { applied, pending })
}

/// Fails unless the database was migrated and nothing is pending.
pub async fn verify_schema_integrity(conn: &mut AsyncPgConnection) -> PgResult<()> {
    if !migration_table_exists(conn).await? {
        tracing::warn!(target: TRACING_TARGET_MIGRATION, "Database has never been migrated");
        return Err(PgError::Migration("database has never been migrated".into()));
    }

    let status = migration_status(conn).await?;
    if !status.is_up_to_date() {
        return Err(PgError::Migration(
            format!("{} migrations are pending", status.pending.len()).into(),
        ));
    }

    Ok(())
}

async fn applied_versions(conn: &mut AsyncPgConnection) -> PgResult<Vec<String>> {
    if !migration_table_exists(conn).await? {
        return Ok(Vec::new());
    }

    let rows: Vec<AppliedVersion> =
        sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version")
            .get_results(conn)
            .await?;

    Ok(rows.into_iter().map(|row| row.version).collect())
}

async fn migration_table_exists(conn: &mut AsyncPgConnection) -> PgResult<bool> {
    let row: TableExists =
        sql_query("SELECT to_regclass('__diesel_schema_migrations') IS NOT NULL AS exists")
            .get_result(conn)
            .await?;

    Ok(row.exists)
}
