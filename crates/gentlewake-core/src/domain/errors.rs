//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation and alarm-string parsing failures.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid schedule identifier
    #[error("Invalid schedule ID: {0}")]
    InvalidScheduleId(String),

    /// Invalid light identifier
    #[error("Invalid light ID: {0}")]
    InvalidLightId(String),

    /// Invalid group identifier
    #[error("Invalid group ID: {0}")]
    InvalidGroupId(String),

    /// Invalid light group name
    #[error("Invalid group name: {0}")]
    InvalidGroupName(String),

    /// Invalid per-device ownership marker
    #[error("Invalid device marker: {0}")]
    InvalidDeviceMarker(String),

    /// The next-alarm string could not be parsed
    #[error("Unparseable alarm string: {0}")]
    InvalidAlarm(String),

    /// Unknown schedule slot name
    #[error("Unknown schedule slot: {0}")]
    UnknownSlot(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
