//! Connection pool construction, migrations and health probing.

use crate::error::{ModelError, ModelResult};
use bookstore_core::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};

/// Embedded schema migrations under `crates/orm/migrations`
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}

/// Open a pool and verify that at least one connection can be established
pub async fn connect(config: &DatabaseConfig) -> ModelResult<PgPool> {
    let pool = pool_options(config)
        .connect(&config.url)
        .await
        .map_err(|e| ModelError::Connection(format!("Failed to connect to database: {}", e)))?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database pool established"
    );
    Ok(pool)
}

/// Build a pool without connecting; connections are opened on first use
pub fn connect_lazy(config: &DatabaseConfig) -> ModelResult<PgPool> {
    pool_options(config)
        .connect_lazy(&config.url)
        .map_err(|e| ModelError::Connection(format!("Invalid database url: {}", e)))
}

/// Apply pending migrations
pub async fn migrate(pool: &PgPool) -> ModelResult<()> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Result of a `SELECT 1` round trip
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub healthy: bool,
    pub latency: Duration,
    pub pool_size: u32,
    pub idle_connections: usize,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn status(&self) -> &'static str {
        if self.healthy {
            "up"
        } else {
            "down"
        }
    }
}

pub async fn health_check(pool: &PgPool) -> HealthReport {
    let started = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let report = HealthReport {
        healthy: result.is_ok(),
        latency: started.elapsed(),
        pool_size: pool.size(),
        idle_connections: pool.num_idle(),
        error: result.err().map(|e| e.to_string()),
    };

    if let Some(error) = &report.error {
        tracing::warn!(error = %error, "Database health check failed");
    }
    report
}
