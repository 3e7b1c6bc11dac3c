//! SQLite connection pool with WAL mode enabled.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::domain::models::DatabaseConfig;
use crate::domain::ports::errors::StoreError;

/// Database connection pool manager.
///
/// WAL journal mode for concurrent readers during trial writes, NORMAL
/// synchronous, foreign keys on.
pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Create a pool from a database URL, e.g. `sqlite:.crucible/crucible.db`
    /// or `sqlite::memory:`.
    ///
    /// # Errors
    /// Fails on an invalid URL or when the pool cannot be created.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::ConnectionPoolError(format!("invalid database URL: {e}")))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        // An in-memory database exists per connection, so it must be pinned
        // to a single connection that never gets recycled.
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(10)
                .idle_timeout(Duration::from_secs(30))
                .max_lifetime(Duration::from_secs(1800))
        };
        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::ConnectionPoolError(format!("failed to create connection pool: {e}"))
            })?;

        Ok(Self { pool })
    }

    /// Create a pool from configuration, creating the parent directory of
    /// the database file when needed.
    ///
    /// # Errors
    /// Fails when the directory cannot be created or the pool cannot open.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::ConnectionPoolError(format!(
                        "failed to create database directory: {e}"
                    ))
                })?;
            }
        }
        Self::new(&format!("sqlite:{}", config.path)).await
    }

    /// Apply pending migrations. Safe to call repeatedly.
    ///
    /// # Errors
    /// Fails when a migration cannot be applied.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationError(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
