//! GentleWake Daemon - Background schedule synchronization service
//!
//! This binary runs as a systemd user service and handles:
//! - Re-synchronizing the wake-up schedules when the next alarm changes
//! - Re-synchronizing when the Hue bridge becomes reachable
//! - Periodic re-synchronization
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! Three producers feed one trigger channel: the alarm-file watcher, the
//! reachability monitor and the scheduler's own periodic timer. The
//! [`SyncScheduler`] coalesces bursts of triggers and runs one
//! synchronization per burst. Everything is stopped by a
//! `CancellationToken` that is cancelled on SIGTERM or SIGINT.

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use gentlewake_cache::{DatabasePool, SqlitePreferenceStore};
use gentlewake_core::{
    config::Config,
    ports::{IAlarmSource, IMessageSink},
};
use gentlewake_hue::{BridgeProbe, HueBridgeGateway, HueClient};
use gentlewake_sync::{
    watch_reachability, AlarmFileWatcher, FileAlarmSource, FixedAlarmSource,
    ScheduleSynchronizer, SyncScheduler,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the bridge is probed for reachability
const REACHABILITY_INTERVAL: Duration = Duration::from_secs(30);

/// Capacity of the trigger channel
const TRIGGER_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// DaemonService
// ============================================================================

/// Main daemon service that wires the synchronizer to its triggers
struct DaemonService {
    /// Application configuration loaded from YAML
    config: Config,
    /// Database pool, closed on shutdown
    db_pool: DatabasePool,
    synchronizer: Arc<ScheduleSynchronizer>,
    probe: Arc<BridgeProbe>,
    /// Token for signalling graceful shutdown to all async tasks
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService
    ///
    /// Opens the preference database and builds the bridge adapter. The
    /// bridge is not contacted here; its resources are loaded before each
    /// cycle.
    async fn new(config: Config, shutdown: CancellationToken) -> Result<Self> {
        let db_pool = DatabasePool::open(&config.database.path)
            .await
            .context("Failed to open preference database")?;
        let store = Arc::new(SqlitePreferenceStore::new(db_pool.pool().clone()));

        let client = HueClient::from_config(&config.bridge)?;
        let gateway = Arc::new(HueBridgeGateway::new(client));
        let probe = Arc::new(BridgeProbe::from_config(&config.bridge)?);

        let synchronizer = Arc::new(ScheduleSynchronizer::new(
            gateway,
            store,
            alarm_source(&config),
        ));

        Ok(Self {
            config,
            db_pool,
            synchronizer,
            probe,
            shutdown,
        })
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// 1. Starts the alarm-file watcher (unless a fixed alarm is configured)
    /// 2. Spawns the reachability monitor
    /// 3. Runs the sync scheduler on the current task
    async fn run(&self) -> Result<()> {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);

        // Dropping the watcher stops it, so it lives as long as `run`
        let _watcher = if self.config.alarm.value.is_none() {
            let watcher = AlarmFileWatcher::new(&self.config.alarm.source_file, trigger_tx.clone())
                .context("Failed to watch the alarm file")?;
            info!(path = %watcher.path().display(), "Watching alarm file");
            Some(watcher)
        } else {
            info!("Fixed alarm configured, alarm file not watched");
            None
        };

        let monitor = tokio::spawn(watch_reachability(
            self.probe.clone(),
            trigger_tx,
            REACHABILITY_INTERVAL,
            self.shutdown.child_token(),
        ));

        let mut scheduler = SyncScheduler::new(
            trigger_rx,
            Arc::clone(&self.synchronizer),
            status_sink(),
            Duration::from_secs(self.config.sync.debounce_delay),
            Duration::from_secs(self.config.sync.poll_interval),
        )
        .with_probe(self.probe.clone());

        scheduler.run(self.shutdown.clone()).await;

        if let Err(e) = monitor.await {
            warn!(error = %e, "Reachability monitor ended abnormally");
        }
        self.db_pool.close().await;

        info!("Daemon service stopped");
        Ok(())
    }
}

/// Loads and validates the configuration
///
/// A missing file means defaults. A file that does not parse or fails
/// validation is an error.
fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)?
    } else {
        Config::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!(
            "Invalid configuration in {}: {}",
            path.display(),
            details.join("; ")
        );
    }

    Ok(config)
}

/// Picks the alarm source: `alarm.value` if set, else the alarm file
fn alarm_source(config: &Config) -> Arc<dyn IAlarmSource> {
    match &config.alarm.value {
        Some(value) => Arc::new(FixedAlarmSource::new(Some(value.clone()))),
        None => Arc::new(FileAlarmSource::new(&config.alarm.source_file)),
    }
}

/// Status messages go to the log
fn status_sink() -> Arc<dyn IMessageSink> {
    Arc::new(|message: &str| info!(status = %message, "Schedule status"))
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and cancels the token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = Config::default_path();
    let config = load_config(&config_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!(config_path = %config_path.display(), "GentleWake daemon starting (gentlewaked)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token.clone()).await?;
    let result = service.run().await;

    match &result {
        Ok(()) => info!("GentleWake daemon shut down gracefully"),
        Err(e) => error!(error = %e, "GentleWake daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gentlewake_core::config::ConfigBuilder;

    fn test_config(dir: &std::path::Path) -> Config {
        ConfigBuilder::new()
            .bridge_address("127.0.0.1")
            .bridge_username("testuser")
            .bridge_port(9)
            .bridge_reachability_timeout_ms(100)
            .alarm_source_file(dir.join("next-alarm"))
            .database_path(dir.join("prefs.db"))
            .build()
    }

    #[tokio::test]
    async fn test_new_requires_bridge_address() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new()
            .database_path(dir.path().join("prefs.db"))
            .build();

        let result = DaemonService::new(config, CancellationToken::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let service = DaemonService::new(test_config(dir.path()), token.clone())
            .await
            .unwrap();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(10), service.run()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sync:\n  poll_interval: 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("sync.poll_interval"));
    }

    #[test]
    fn test_unparseable_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sync: [not, a, map]\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.sync.poll_interval, Config::default().sync.poll_interval);
    }

    #[tokio::test]
    async fn test_fixed_alarm_skips_file_source() {
        let config = ConfigBuilder::new()
            .alarm_source_file(std::path::PathBuf::from("/nonexistent/next-alarm"))
            .alarm_value("Mon 07:00")
            .build();

        let source = alarm_source(&config);
        assert_eq!(
            source.next_alarm_raw().await.unwrap().as_deref(),
            Some("Mon 07:00")
        );
    }

    #[test]
    fn test_status_sink_accepts_messages() {
        let sink = status_sink();
        sink.on_message("'GentleWake On' scheduled for Mon Jan 01 06:50:00 2024");
    }
}
