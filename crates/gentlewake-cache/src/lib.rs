//! GentleWake Cache - Local preference persistence
//!
//! SQLite-backed storage for the preferences the synchronizer reads and
//! writes: device marker, light group name, transition length, schedule
//! base name and the three remembered schedule ids.
//!
//! ## Architecture
//!
//! This crate implements the `IPreferenceStore` port from `gentlewake-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with schema setup
//! - [`SqlitePreferenceStore`] - `IPreferenceStore` implementation
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use gentlewake_cache::{DatabasePool, SqlitePreferenceStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::open(Path::new("/home/user/.local/share/gentlewake/preferences.db")).await?;
//! let store = SqlitePreferenceStore::new(pool.pool().clone());
//! // Use store as IPreferenceStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod preferences;

pub use pool::DatabasePool;
pub use preferences::SqlitePreferenceStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to open the database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema setup failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
