//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IBridgeGateway`] - Hue bridge groups, lights and schedules
//! - [`IPreferenceStore`] - Persistent key-value preferences
//! - [`IAlarmSource`] - The device's next-alarm string
//! - [`IMessageSink`] - Human-readable status messages
//! - [`IReachabilityProbe`] - Quick bridge reachability check

pub mod alarm_source;
pub mod bridge_gateway;
pub mod message_sink;
pub mod preference_store;
pub mod reachability;

pub use alarm_source::IAlarmSource;
pub use bridge_gateway::IBridgeGateway;
pub use message_sink::{IMessageSink, NullSink};
pub use preference_store::IPreferenceStore;
pub use reachability::IReachabilityProbe;
