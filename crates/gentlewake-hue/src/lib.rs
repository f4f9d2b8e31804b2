//! GentleWake Hue - Philips Hue bridge adapter
//!
//! Provides:
//! - A typed client for the bridge's v1 REST API (lights, groups, schedules)
//! - A cached [`IBridgeGateway`](gentlewake_core::ports::IBridgeGateway) implementation
//! - A TCP reachability probe
//!
//! ## Modules
//!
//! - [`client`] - HTTP client and wire types for the bridge API
//! - [`gateway`] - Resource cache and gateway port implementation
//! - [`probe`] - Bridge reachability check

pub mod client;
pub mod gateway;
pub mod probe;

pub use client::HueClient;
pub use gateway::HueBridgeGateway;
pub use probe::BridgeProbe;

use thiserror::Error;

/// Bridge error type for "resource not available"
pub const ERROR_RESOURCE_NOT_AVAILABLE: u32 = 3;

/// Errors that can occur when communicating with a Hue bridge
#[derive(Debug, Error)]
pub enum HueError {
    /// The bridge answered with an error object
    #[error("Bridge error {code} at {address}: {description}")]
    Bridge {
        /// Hue error type
        code: u32,
        /// Resource address the error refers to
        address: String,
        /// Human-readable description from the bridge
        description: String,
    },

    /// The bridge answered with a non-success HTTP status
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A schedule refers to a group the bridge does not know
    #[error("Unknown light group: {0}")]
    UnknownGroup(String),

    /// Address or username missing from the configuration
    #[error("Bridge not configured: {0}")]
    NotConfigured(&'static str),
}

impl HueError {
    /// Hue error type, if the bridge reported one
    pub fn code(&self) -> Option<u32> {
        match self {
            HueError::Bridge { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the bridge reported the resource as missing
    pub fn is_not_available(&self) -> bool {
        self.code() == Some(ERROR_RESOURCE_NOT_AVAILABLE)
    }
}
