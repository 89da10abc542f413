//! Connection setup and pool hooks.

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::TRACING_TARGET_CONNECTION;
use crate::client::PgConfig;

/// Opens a new pooled connection, logging how long it took.
///
/// Installed as the [`ManagerConfig::custom_setup`] of the pool.
///
/// [`ManagerConfig::custom_setup`]: diesel_async::pooled_connection::ManagerConfig
pub fn establish(url: &str) -> BoxFuture<'_, ConnectionResult<AsyncPgConnection>> {
    async move {
        let start = Instant::now();
        let conn = AsyncPgConnection::establish(url).await;

        match &conn {
            Ok(_) => tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                elapsed_ms = start.elapsed().as_millis(),
                "Opened database connection"
            ),
            Err(err) => tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                url = %PgConfig::mask_url(url),
                error = %err,
                "Failed to open database connection"
            ),
        }

        conn
    }
    .boxed()
}

/// Logs connections that come back broken.
///
/// The pool manager drops broken connections on its next recycle, so the
/// hook never fails.
pub fn report_broken(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            age = ?metrics.age(),
            recycle_count = metrics.recycle_count,
            "Pooled connection is broken"
        );
    }

    Ok(())
}
