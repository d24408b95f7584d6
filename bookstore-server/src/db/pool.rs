//! Database connection pool
//!
//! Every store call checks a connection out and hands it back when the call
//! completes. A request that finds the pool exhausted waits up to
//! `ACQUIRE_TIMEOUT` and then fails with `sqlx::Error::PoolTimedOut`.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pool settings for a given connection cap. A cap of zero is raised to one.
fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Connect with [`DEFAULT_MAX_CONNECTIONS`].
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/bookstore").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Connect with an explicit connection cap (`--max-connections`).
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(max_connections, "Connecting to database");
    pool_options(max_connections).connect(database_url).await
}
