//! Prefs command - Read and edit stored preferences
//!
//! Values are validated before they are written, so the synchronizer never
//! reads a value it would reject. Resetting a schedule id makes the next
//! sync create a fresh schedule for that slot.

use anyhow::{bail, Result};
use clap::Subcommand;
use tracing::info;

use gentlewake_core::ports::IPreferenceStore;
use gentlewake_core::preferences::{validate_entry, ALL_KEYS};

use crate::context::CliContext;

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// List every stored preference
    List,
    /// Print one preference
    Get {
        /// Preference key (e.g. "transition_minutes")
        key: String,
    },
    /// Store a preference
    Set {
        /// Preference key
        key: String,
        /// New value
        value: String,
    },
    /// Delete a stored preference, restoring its default
    Reset {
        /// Preference key
        key: String,
    },
}

fn ensure_known(key: &str) -> Result<()> {
    if !ALL_KEYS.contains(&key) {
        bail!(
            "Unknown preference key '{}'. Known keys: {}",
            key,
            ALL_KEYS.join(", ")
        );
    }
    Ok(())
}

impl PrefsCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();
        let store = ctx.open_store(&config).await?;

        match self {
            PrefsCommand::List => {
                let entries = store.entries().await?;
                if ctx.is_json() {
                    let map: serde_json::Map<String, serde_json::Value> = entries
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect();
                    formatter.print_json(&serde_json::Value::Object(map));
                } else if entries.is_empty() {
                    formatter.success("No preferences stored");
                } else {
                    formatter.success(&format!("{} preferences stored", entries.len()));
                    for (key, value) in entries {
                        formatter.info(&format!("{key:<22} {value}"));
                    }
                }
            }
            PrefsCommand::Get { key } => {
                ensure_known(key)?;
                let value = store.get(key).await?;
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({ "key": key, "value": value }));
                } else {
                    match value {
                        Some(value) => println!("{value}"),
                        None => formatter.warn(&format!("'{key}' is not set")),
                    }
                }
            }
            PrefsCommand::Set { key, value } => {
                ensure_known(key)?;
                validate_entry(key, value)?;
                store.set(key, value).await?;
                info!(key = %key, value = %value, "Preference set");
                formatter.success(&format!("Set {key} = {value}"));
            }
            PrefsCommand::Reset { key } => {
                ensure_known(key)?;
                store.remove(key).await?;
                info!(key = %key, "Preference reset");
                formatter.success(&format!("Reset {key}"));
            }
        }

        Ok(())
    }
}
