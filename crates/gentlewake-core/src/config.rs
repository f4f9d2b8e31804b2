//! Configuration module for GentleWake.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for GentleWake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub alarm: AlarmConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

/// Hue bridge connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host name or IP address of the bridge. `None` until paired.
    pub address: Option<String>,
    /// Whitelisted API user name issued by the bridge. `None` until paired.
    pub username: Option<String>,
    /// HTTP port of the bridge API.
    pub port: u16,
    /// Milliseconds to wait for the reachability probe.
    pub reachability_timeout_ms: u64,
    /// Seconds before a single bridge request times out.
    pub request_timeout_secs: u64,
}

/// Where the next-alarm string comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// File holding the next-alarm string, e.g. `Fri 6:30 AM`.
    pub source_file: PathBuf,
    /// Fixed next-alarm string; takes precedence over `source_file`.
    pub value: Option<String>,
}

/// Synchronization trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic synchronizations.
    pub poll_interval: u64,
    /// Seconds to wait after a trigger before syncing (settle delay).
    pub debounce_delay: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Preference database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite preference store.
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/gentlewake/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("gentlewake")
            .join("config.yaml")
    }

    /// Base URL of the bridge, e.g. `http://192.168.1.2:80`, if configured.
    pub fn bridge_base_url(&self) -> Option<String> {
        self.bridge
            .address
            .as_ref()
            .map(|addr| format!("http://{}:{}", addr, self.bridge.port))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("gentlewake")
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: None,
            username: None,
            port: 80,
            reachability_timeout_ms: 2000,
            request_timeout_secs: 10,
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            source_file: data_dir().join("next-alarm"),
            value: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: 900,
            debounce_delay: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("preferences.db"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.poll_interval"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. A missing bridge
    /// address or username is not an error here; commands that need the
    /// bridge report it when they run.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- bridge ---
        if let Some(address) = &self.bridge.address {
            if address.trim().is_empty() || address.contains('/') {
                errors.push(ValidationError {
                    field: "bridge.address".into(),
                    message: format!("not a host name or IP address: '{address}'"),
                });
            }
        }
        if let Some(username) = &self.bridge.username {
            if username.trim().is_empty() || username.contains('/') {
                errors.push(ValidationError {
                    field: "bridge.username".into(),
                    message: "must be a non-empty API user name without '/'".into(),
                });
            }
        }
        if self.bridge.port == 0 {
            errors.push(ValidationError {
                field: "bridge.port".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.bridge.reachability_timeout_ms == 0 {
            errors.push(ValidationError {
                field: "bridge.reachability_timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.bridge.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "bridge.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- alarm ---
        if self.alarm.value.is_none() && self.alarm.source_file.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "alarm.source_file".into(),
                message: "must be set when alarm.value is not".into(),
            });
        }

        // --- sync ---
        if self.sync.poll_interval == 0 {
            errors.push(ValidationError {
                field: "sync.poll_interval".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.debounce_delay == 0 {
            errors.push(ValidationError {
                field: "sync.debounce_delay".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.debounce_delay >= self.sync.poll_interval && self.sync.poll_interval > 0 {
            errors.push(ValidationError {
                field: "sync.debounce_delay".into(),
                message: format!(
                    "debounce_delay ({}) must be less than poll_interval ({})",
                    self.sync.debounce_delay, self.sync.poll_interval
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- database ---
        if self.database.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "database.path".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use gentlewake_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .bridge_address("192.168.1.20")
///     .bridge_username("x1y2z3")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- bridge ---

    pub fn bridge_address(mut self, address: impl Into<String>) -> Self {
        self.config.bridge.address = Some(address.into());
        self
    }

    pub fn bridge_username(mut self, username: impl Into<String>) -> Self {
        self.config.bridge.username = Some(username.into());
        self
    }

    pub fn bridge_port(mut self, port: u16) -> Self {
        self.config.bridge.port = port;
        self
    }

    pub fn bridge_reachability_timeout_ms(mut self, ms: u64) -> Self {
        self.config.bridge.reachability_timeout_ms = ms;
        self
    }

    pub fn bridge_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.bridge.request_timeout_secs = secs;
        self
    }

    // --- alarm ---

    pub fn alarm_source_file(mut self, path: PathBuf) -> Self {
        self.config.alarm.source_file = path;
        self
    }

    pub fn alarm_value(mut self, value: impl Into<String>) -> Self {
        self.config.alarm.value = Some(value.into());
        self
    }

    // --- sync ---

    pub fn sync_poll_interval(mut self, seconds: u64) -> Self {
        self.config.sync.poll_interval = seconds;
        self
    }

    pub fn sync_debounce_delay(mut self, seconds: u64) -> Self {
        self.config.sync.debounce_delay = seconds;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- database ---

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
