//! Alarm file watching
//!
//! The next-alarm string lives in a plain file written by whatever tracks
//! the device alarm. [`AlarmFileWatcher`] wraps the `notify` crate to
//! observe that file and raises [`SyncTrigger::AlarmChanged`] whenever it is
//! created, rewritten, replaced or deleted.
//!
//! ## Architecture
//!
//! ```text
//! inotify
//!    │
//!    ▼
//! AlarmFileWatcher ──→ mpsc::Sender<SyncTrigger> ──→ SyncScheduler
//! ```
//!
//! The parent directory is watched rather than the file itself, so editors
//! and tools that replace the file through a rename are still noticed and
//! the file may be absent when watching starts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::scheduler::SyncTrigger;

// ============================================================================
// AlarmFileWatcher
// ============================================================================

/// Watches the next-alarm file using the OS-native mechanism
///
/// Watching stops when the value is dropped.
///
/// ## Usage
///
/// ```ignore
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// let watcher = AlarmFileWatcher::new("/home/user/.local/share/gentlewake/next-alarm", tx)?;
/// // rx.recv().await yields SyncTrigger::AlarmChanged
/// drop(watcher); // stops watching
/// ```
pub struct AlarmFileWatcher {
    /// The underlying notify watcher instance
    _watcher: RecommendedWatcher,
    /// The alarm file being observed
    path: PathBuf,
}

impl AlarmFileWatcher {
    /// Starts watching the given alarm file
    ///
    /// # Arguments
    /// * `path` - The alarm file; its parent directory must exist
    /// * `trigger_tx` - Receives an [`SyncTrigger::AlarmChanged`] per relevant event
    ///
    /// # Errors
    /// Returns an error if the OS watcher cannot be created or the parent
    /// directory cannot be watched
    pub fn new(path: impl Into<PathBuf>, trigger_tx: mpsc::Sender<SyncTrigger>) -> Result<Self> {
        let path = path.into();
        let directory = watched_directory(&path);
        let target = path.clone();

        info!(path = %path.display(), "Initializing alarm file watcher");

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if is_alarm_change(&event, &target) {
                        if let Err(e) = trigger_tx.blocking_send(SyncTrigger::AlarmChanged) {
                            warn!(error = %e, "Failed to send alarm trigger (receiver dropped)");
                        }
                    }
                }
                Err(err) => {
                    error!(error = %err, "Alarm file watcher error");
                }
            },
            notify::Config::default(),
        )
        .context("Failed to create alarm file watcher")?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", directory.display()))?;

        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    /// Returns the alarm file being observed
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Directory to hand to `notify` for the given file
fn watched_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ============================================================================
// Event filtering - notify::Event → alarm change
// ============================================================================

/// Returns true if the event touches the alarm file
///
/// Create, modify (data, metadata, rename) and remove events count; access
/// events are ignored. Paths are compared by file name because only the
/// parent directory is watched, non-recursively.
fn is_alarm_change(event: &notify::Event, target: &Path) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    if !relevant_kind {
        debug!(kind = ?event.kind, "Ignoring event kind");
        return false;
    }

    let Some(file_name) = target.file_name() else {
        return false;
    };

    let touches = event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name));
    if touches {
        debug!(kind = ?event.kind, path = %target.display(), "Alarm file changed");
    }
    touches
}

// ============================================================================
// Unit tests
// ============================================================================
