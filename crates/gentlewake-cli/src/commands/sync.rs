//! Sync command - Reconcile the wake-up schedules with the next alarm
//!
//! Provides the `gentlewake sync` CLI command which:
//! 1. Loads configuration and opens the preference database
//! 2. Probes the bridge (unless `--skip-probe`) and loads its resource cache
//! 3. Runs one synchronization, relaying every status message
//! 4. Prints a summary of what happened to each slot

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use gentlewake_core::domain::MESSAGE_DATE_FORMAT;
use gentlewake_core::ports::IReachabilityProbe;
use gentlewake_hue::{BridgeProbe, HueBridgeGateway, HueClient};
use gentlewake_sync::{ScheduleSynchronizer, SlotOutcome, SyncReport};

use crate::context::{alarm_source, CliContext};
use crate::output::OutputFormatter;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Use this next-alarm string instead of the configured source
    /// (e.g. "Fri 06:30" or "Mon 6:45 am")
    #[arg(long)]
    pub alarm: Option<String>,

    /// Do not check that the bridge is reachable first
    #[arg(long)]
    pub skip_probe: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();

        if !self.skip_probe {
            let probe = BridgeProbe::from_config(&config.bridge)?;
            if !probe.is_reachable().await {
                bail!(
                    "Hue bridge at {} is not reachable",
                    config.bridge_base_url().unwrap_or_default()
                );
            }
        }

        let client = HueClient::from_config(&config.bridge)?;
        let gateway = HueBridgeGateway::connect(client)
            .await
            .context("Failed to connect to the Hue bridge")?;
        let store = ctx.open_store(&config).await?;
        let source = alarm_source(&config, self.alarm.as_deref());

        let synchronizer = ScheduleSynchronizer::new(Arc::new(gateway), store, source);

        let messages = Mutex::new(Vec::new());
        let sink = |message: &str| {
            if let Ok(mut messages) = messages.lock() {
                messages.push(message.to_string());
            }
        };

        info!("Starting synchronization");
        let report = synchronizer.synchronize(&sink).await?;
        let messages = messages.into_inner().unwrap_or_else(|e| e.into_inner());

        if ctx.is_json() {
            let json = serde_json::json!({
                "success": report.is_success(),
                "messages": messages,
                "report": report,
            });
            formatter.print_json(&json);
        } else {
            for message in &messages {
                formatter.relay(message);
            }
            print_summary(&report, &*formatter);
        }

        Ok(())
    }
}

fn print_summary(report: &SyncReport, formatter: &dyn OutputFormatter) {
    match report.alarm {
        Some(alarm) => formatter.success(&format!(
            "Wake-up schedules in '{}' set for {}",
            report.group,
            alarm.format(MESSAGE_DATE_FORMAT)
        )),
        None if report.slots.is_empty() => formatter.success("No alarm set, nothing to remove"),
        None => formatter.success("No alarm set, wake-up schedules removed"),
    }

    for slot in report.failures() {
        if let SlotOutcome::Failed(reason) = &slot.outcome {
            formatter.warn(&format!("{} schedule: {}", slot.slot, reason));
        }
    }

    formatter.info(&format!("Completed in {}ms", report.duration_ms));
}
