//! Postgres persistence for the cellblock back office.
//!
//! - [`config::DbConfig`] describes the pool (size and timeouts).
//! - [`models`] holds row structs, create/update DTOs, and list filters.
//! - [`repositories`] holds one zero-sized repository per table.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod config;
pub mod models;
pub mod repositories;
pub mod unique;

use config::DbConfig;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from configuration.
///
/// Every connection gets a server-side `statement_timeout`, and checkouts
/// give up after `acquire_timeout_secs`, so no call blocks indefinitely.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    let options: PgConnectOptions = config.database_url.parse()?;
    let options = options.options([(
        "statement_timeout",
        format!("{}ms", config.statement_timeout_ms),
    )]);

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
