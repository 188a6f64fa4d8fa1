//! Database connection management
//!
//! One shared PgPool backs both repositories. Pool sizing comes from
//! settings; the timeouts are fixed policy sized for a small request-driven
//! service with a background sweeper attached.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::DatabaseSettings;
use crate::utils::errors::Result;

pub type DatabasePool = Pool<Postgres>;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Open the connection pool and verify the server is reachable.
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabasePool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(&settings.url)
        .await?;

    // Fail at startup, not on the first booking request
    sqlx::query("SELECT 1").execute(&pool).await?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Database connection pool ready"
    );
    Ok(pool)
}

/// Apply pending SQL migrations from `migrations/`.
pub async fn run_migrations(pool: &DatabasePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations up to date");
    Ok(())
}

/// Liveness ping used by the health endpoint.
pub async fn health_check(pool: &DatabasePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
