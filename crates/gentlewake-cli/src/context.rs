//! Shared wiring for CLI commands
//!
//! Every command starts from the same configuration file and, where needed,
//! the same preference database and alarm source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use gentlewake_cache::{DatabasePool, SqlitePreferenceStore};
use gentlewake_core::config::Config;
use gentlewake_core::ports::IAlarmSource;
use gentlewake_sync::{FileAlarmSource, FixedAlarmSource};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global options resolved once in `main`
pub struct CliContext {
    pub format: OutputFormat,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(format: OutputFormat, config_path: Option<PathBuf>) -> Self {
        Self {
            format,
            config_path: config_path.unwrap_or_else(Config::default_path),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.is_json())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the configuration, falling back to defaults if the file is absent
    pub fn load_config(&self) -> Config {
        let config = Config::load_or_default(&self.config_path);
        info!(config_path = %self.config_path.display(), "Loaded configuration");
        config
    }

    /// Opens the preference database named by the configuration
    pub async fn open_store(&self, config: &Config) -> Result<Arc<SqlitePreferenceStore>> {
        let pool = DatabasePool::open(&config.database.path)
            .await
            .context("Failed to open preference database")?;
        Ok(Arc::new(SqlitePreferenceStore::new(pool.pool().clone())))
    }
}

/// Picks the alarm source: explicit override, then `alarm.value`, then the file
pub fn alarm_source(config: &Config, alarm_override: Option<&str>) -> Arc<dyn IAlarmSource> {
    match alarm_override.or(config.alarm.value.as_deref()) {
        Some(value) => Arc::new(FixedAlarmSource::new(Some(value.to_string()))),
        None => Arc::new(FileAlarmSource::new(&config.alarm.source_file)),
    }
}
