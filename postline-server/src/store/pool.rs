//! Postgres pool creation with a startup retry loop
//!
//! Only the raw-SQL backend retries. A database that is still down after the
//! last attempt is reported to the caller, which decides whether to fall back.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How long a request waits for a pooled connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Single connection attempt with the default pool size
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    open_pool(database_url, DEFAULT_MAX_CONNECTIONS).await
}

async fn open_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Connect, retrying up to `attempts` times with a fixed `delay` in between.
///
/// Returns the last error once all attempts have failed.
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    attempts: u32,
    delay: Duration,
) -> Result<PgPool, sqlx::Error> {
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match open_pool(database_url, max_connections).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database connection was successful");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                tracing::error!(attempt, error = %e, "Database connection attempt failed");
                tracing::info!(delay_secs = delay.as_secs_f64(), "Retrying database connection");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempts, error = %e, "Max retries reached, could not connect to database");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retries_with_fixed_delay_then_fails() {
        let started = tokio::time::Instant::now();

        let result = connect_with_retry("not-a-database-url", 1, 3, Duration::from_secs(2)).await;

        assert!(result.is_err());
        // Three attempts, two pauses between them
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let started = tokio::time::Instant::now();

        let result = connect_with_retry("not-a-database-url", 1, 0, Duration::from_secs(2)).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    // Run with: DATABASE_URL=postgres://... cargo test -p postline-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn first_attempt_succeeds_against_live_database() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let started = tokio::time::Instant::now();

        let pool = connect_with_retry(&url, 2, 3, Duration::from_secs(2))
            .await
            .expect("connect failed");

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(pool.size() <= 2);
        pool.close().await;
    }
}
