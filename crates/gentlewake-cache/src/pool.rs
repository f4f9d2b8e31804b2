//! SQLite connection pool for the preference database
//!
//! Wraps SQLx's `SqlitePool`. Opening a file-backed pool creates the parent
//! directory and the database file as needed, switches to WAL and applies
//! the schema. [`DatabasePool::in_memory`] gives tests a private database.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// Writers wait this long for a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The CLI and the daemon may share the file; two connections suffice for either
const MAX_FILE_CONNECTIONS: u32 = 2;

/// Pool of SQLite connections holding the preferences table
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if missing) the preference database at `db_path`
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the directory cannot be
    /// created or the database cannot be opened, and
    /// `CacheError::MigrationFailed` if the schema cannot be applied.
    pub async fn open(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_FILE_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to open preference database {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::apply_schema(&pool).await?;

        tracing::info!(path = %db_path.display(), "Preference database opened");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database
    ///
    /// Limited to one connection: every SQLite in-memory connection is a
    /// separate database.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("In-memory database: {e}")))?;

        Self::apply_schema(&pool).await?;

        tracing::debug!("In-memory preference database opened");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every connection, waiting for in-flight queries
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Creates the preferences table if it does not exist yet
    async fn apply_schema(pool: &SqlitePool) -> Result<(), CacheError> {
        sqlx::raw_sql(include_str!("migrations/001_preferences.sql"))
            .execute(pool)
            .await
            .map_err(|e| {
                CacheError::MigrationFailed(format!("Failed to create preferences table: {e}"))
            })?;
        Ok(())
    }
}
