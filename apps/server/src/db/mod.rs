use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;

use crate::config::DatabaseConfig;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Advisory lock key shared by every sweep process ("TAPPTRAK" as ASCII)
pub const SWEEP_LOCK_KEY: i64 = 0x5441_5050_5452_414B;

/// Creates a new database connection pool with the provided configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Set timezone to UTC for all connections
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    log::info!(
        "Database connection pool established (max: {}, min: {})",
        config.max_connections,
        config.min_connections
    );

    Ok(pool)
}

/// Runs all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    log::info!("Database migrations completed successfully");
    Ok(())
}

/// Performs a health check on the database connection
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Session-level advisory lock that serializes sweeps across processes.
///
/// The lock lives on one pooled connection, so the pool needs at least
/// [`MIN_POOL_CONNECTIONS`](crate::config::MIN_POOL_CONNECTIONS). Call [`SweepLock::release`] when
/// the run ends. If the guard is dropped without releasing (panic, timeout),
/// the connection is detached from the pool and closed so Postgres frees the
/// lock with the session.
pub struct SweepLock {
    conn: Option<PoolConnection<Postgres>>,
}

impl SweepLock {
    /// Tries to take the sweep lock without waiting.
    /// Returns `None` when another sweep holds it.
    pub async fn try_acquire(pool: &DbPool) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(SWEEP_LOCK_KEY)
            .fetch_one(&mut *conn)
            .await?;

        if acquired {
            Ok(Some(Self { conn: Some(conn) }))
        } else {
            Ok(None)
        }
    }

    /// Releases the lock and returns the connection to the pool.
    ///
    /// If the unlock fails the connection is closed instead, since it may
    /// still hold the lock.
    pub async fn release(mut self) -> Result<(), sqlx::Error> {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
                .bind(SWEEP_LOCK_KEY)
                .execute(&mut *conn)
                .await
            {
                drop(conn.detach());
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Drop for SweepLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            log::warn!("Sweep lock dropped without release, closing its connection");
            // Detached connections are closed instead of recycled, ending the session
            drop(conn.detach());
        }
    }
}
