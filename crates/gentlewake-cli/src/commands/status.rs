//! Status command - Show stored preferences and the next alarm
//!
//! Provides the `gentlewake status` CLI command which shows, without
//! changing anything:
//! 1. The configuration file and bridge in use
//! 2. Every stored preference, or its default when unset
//! 3. The next alarm as the synchronizer would resolve it

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use tracing::warn;

use gentlewake_core::domain::{ScheduleSlot, TransitionMinutes, MESSAGE_DATE_FORMAT};
use gentlewake_core::ports::IPreferenceStore;
use gentlewake_core::preferences::{
    ALL_KEYS, DEFAULT_LIGHT_GROUP_NAME, DEFAULT_SCHEDULE_BASE_NAME, KEY_DEVICE_MARKER,
    KEY_LIGHT_GROUP_NAME, KEY_SCHEDULE_BASE_NAME, KEY_TRANSITION_MINUTES,
};
use gentlewake_core::usecases::AlarmTimeResolver;

use crate::context::{alarm_source, CliContext};

#[derive(Debug, Args)]
pub struct StatusCommand {}

/// Value shown for a key that has never been written
fn default_display(key: &str) -> Option<String> {
    match key {
        KEY_LIGHT_GROUP_NAME => Some(DEFAULT_LIGHT_GROUP_NAME.to_string()),
        KEY_SCHEDULE_BASE_NAME => Some(DEFAULT_SCHEDULE_BASE_NAME.to_string()),
        KEY_TRANSITION_MINUTES => Some(TransitionMinutes::DEFAULT.to_string()),
        _ => None,
    }
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();

        // Opening would create the database; status must not
        let stored: BTreeMap<String, String> = if config.database.path.exists() {
            let store = ctx.open_store(&config).await?;
            store.entries().await?.into_iter().collect()
        } else {
            BTreeMap::new()
        };

        let resolver = AlarmTimeResolver::new(alarm_source(&config, None));
        let next_alarm = match resolver.resolve().await {
            Ok(alarm) => alarm,
            Err(e) => {
                warn!(error = %e, "Failed to read the next alarm");
                formatter.warn(&format!("Failed to read the next alarm: {e:#}"));
                None
            }
        };

        if ctx.is_json() {
            let preferences: BTreeMap<&str, Option<String>> = ALL_KEYS
                .iter()
                .map(|key| (*key, stored.get(*key).cloned()))
                .collect();
            let json = serde_json::json!({
                "config_path": ctx.config_path().display().to_string(),
                "bridge": config.bridge_base_url(),
                "database": config.database.path.display().to_string(),
                "preferences": preferences,
                "next_alarm": next_alarm,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Configuration ({})", ctx.config_path().display()));
        formatter.info(&format!(
            "Bridge:        {}",
            config
                .bridge_base_url()
                .unwrap_or_else(|| "(not configured)".to_string())
        ));
        formatter.info(&format!(
            "Next alarm:    {}",
            next_alarm
                .map(|t| t.format(MESSAGE_DATE_FORMAT).to_string())
                .unwrap_or_else(|| "(none)".to_string())
        ));
        formatter.info("");

        formatter.success("Preferences");
        for key in ALL_KEYS {
            let shown = match (stored.get(key), default_display(key)) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => format!("{default} (default)"),
                (None, None) if key == KEY_DEVICE_MARKER => "(generated on first sync)".to_string(),
                (None, None) => "(unset)".to_string(),
            };
            formatter.info(&format!("{key:<22} {shown}"));
        }

        let remembered = ScheduleSlot::ALL
            .iter()
            .filter(|slot| stored.contains_key(slot.preference_key()))
            .count();
        formatter.info("");
        formatter.info(&format!("{remembered} of 3 schedules remembered"));

        Ok(())
    }
}
