#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Schema migrations compiled into the crate from `./migrations`.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

/// Tracing target for client construction and pool setup.
pub const TRACING_TARGET_CLIENT: &str = "onit_postgres::client";

/// Tracing target for store operations and the queries behind them.
pub const TRACING_TARGET_QUERY: &str = "onit_postgres::queries";

/// Tracing target for migration runs and status checks.
pub const TRACING_TARGET_MIGRATION: &str = "onit_postgres::migrations";

/// Tracing target for connection establishment and pool health.
pub const TRACING_TARGET_CONNECTION: &str = "onit_postgres::connection";

mod client;
pub mod error;
pub mod model;
pub mod query;
mod schema;
mod store;
pub mod types;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, MigrationReport, MigrationStatus, PgClient, PgClientMigrationExt, PgConfig,
    PgConn, PgPoolStatus, PooledConnection, migration_status, run_pending_migrations,
    verify_schema_integrity,
};
pub use crate::error::{PgError, PgResult};
