//! Alarm time resolution use case
//!
//! Reads the raw next-alarm string from an [`IAlarmSource`] and turns it
//! into an absolute local instant. Malformed strings are logged and treated
//! as "no alarm"; they never fail the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use crate::{domain::resolve_next_alarm, ports::IAlarmSource};

/// Use case resolving the device's next alarm
pub struct AlarmTimeResolver {
    source: Arc<dyn IAlarmSource>,
}

impl AlarmTimeResolver {
    /// Creates a resolver reading from the given source
    pub fn new(source: Arc<dyn IAlarmSource>) -> Self {
        Self { source }
    }

    /// Resolves the next alarm relative to the current local time
    ///
    /// # Errors
    /// Returns an error only if the alarm source itself cannot be read
    pub async fn resolve(&self) -> Result<Option<NaiveDateTime>> {
        self.resolve_at(Local::now().naive_local()).await
    }

    /// Resolves the next alarm relative to `now`
    ///
    /// # Errors
    /// Returns an error only if the alarm source itself cannot be read
    pub async fn resolve_at(&self, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        let raw = self
            .source
            .next_alarm_raw()
            .await
            .context("Failed to read next alarm")?;

        let resolved = resolve_next_alarm(raw.as_deref(), now);
        match resolved {
            Some(instant) => tracing::debug!(alarm = %instant, "Resolved next alarm"),
            None => tracing::debug!(raw = ?raw, "No alarm to schedule"),
        }
        Ok(resolved)
    }
}
