//! GentleWake Sync - keeps the wake-up schedules on the Hue bridge current
//!
//! Provides:
//! - Light group resolution (find or create the target group)
//! - Three-slot schedule synchronization against the next alarm
//! - Trigger scheduling with a settle window
//! - Alarm file watching
//!
//! ## Modules
//!
//! - [`engine`] - The schedule synchronizer and its per-slot report
//! - [`group`] - Light group lookup and creation
//! - [`scheduler`] - Trigger queue, scheduler loop and reachability monitor
//! - [`watcher`] - `notify`-based alarm file watcher
//! - [`alarm_source`] - File and fixed next-alarm sources

pub mod alarm_source;
pub mod engine;
pub mod group;
pub mod scheduler;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use alarm_source::{FileAlarmSource, FixedAlarmSource};
pub use engine::{ScheduleSynchronizer, SlotOutcome, SlotReport, SyncReport};
pub use group::LightGroupResolver;
pub use scheduler::{watch_reachability, SyncScheduler, SyncTrigger, TriggerQueue};
pub use watcher::AlarmFileWatcher;

use thiserror::Error;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// The light group is still missing after an attempt to create it
    #[error("Light group '{0}' could not be ensured on the bridge")]
    GroupUnavailable(String),

    /// A domain-level error propagated from gentlewake-core
    #[error("Domain error: {0}")]
    DomainError(#[from] gentlewake_core::domain::DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_unavailable_message() {
        let err = SyncError::GroupUnavailable("GentleWake".to_string());
        assert_eq!(
            err.to_string(),
            "Light group 'GentleWake' could not be ensured on the bridge"
        );
    }

    #[test]
    fn test_domain_error_converts() {
        let err: SyncError = gentlewake_core::domain::DomainError::UnknownSlot("dim".to_string()).into();
        assert!(matches!(err, SyncError::DomainError(_)));
    }
}
