// src/config/db.rs
// DOCUMENTATION: Database connection pool initialization
// PURPOSE: Setup the SQLite pool backing the local place cache

use crate::config::Config;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Initialize SQLite connection pool
/// DOCUMENTATION: Called once during application startup in main.rs.
/// Creates the database file when it does not exist yet.
pub async fn init_db_pool(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    log::info!("Initializing database pool: {}", config.database_url);

    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    let pool = if config.database_url.contains(":memory:") {
        // In-memory databases are private to one connection and vanish with it
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(Option::<Duration>::None)
            .max_lifetime(Option::<Duration>::None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.db_max_connections)
            // Connection idle timeout (5 minutes)
            .idle_timeout(Duration::from_secs(300))
    }
    .acquire_timeout(Duration::from_secs(config.db_connection_timeout))
    .connect_with(options)
    .await?;

    // Verify connection works
    sqlx::query("SELECT 1").execute(&pool).await?;

    log::info!("Database pool initialized successfully");
    Ok(pool)
}
