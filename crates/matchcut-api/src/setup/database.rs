//! Database pool setup and migrations

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use matchcut_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn setup_database(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load database migrations")?
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected and migrations applied"
    );

    Ok(pool)
}
