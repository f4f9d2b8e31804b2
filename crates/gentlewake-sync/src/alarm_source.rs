//! Next-alarm sources
//!
//! [`FileAlarmSource`] reads the raw next-alarm string from a file, the way
//! the daemon receives it. [`FixedAlarmSource`] returns a configured value and
//! backs the `alarm.value` setting and `gentlewake sync --alarm`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use gentlewake_core::ports::IAlarmSource;

/// Reads the next-alarm string from a file
///
/// Surrounding whitespace is trimmed. A missing or blank file means no
/// alarm is set.
#[derive(Debug, Clone)]
pub struct FileAlarmSource {
    path: PathBuf,
}

impl FileAlarmSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl IAlarmSource for FileAlarmSource {
    async fn next_alarm_raw(&self) -> Result<Option<String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Alarm file absent, no alarm set");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read alarm file: {}", self.path.display())
                })
            }
        };

        let trimmed = raw.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

/// Always returns the same next-alarm string
#[derive(Debug, Clone, Default)]
pub struct FixedAlarmSource {
    value: Option<String>,
}

impl FixedAlarmSource {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }
}

#[async_trait::async_trait]
impl IAlarmSource for FixedAlarmSource {
    async fn next_alarm_raw(&self) -> Result<Option<String>> {
        Ok(self.value.clone())
    }
}
