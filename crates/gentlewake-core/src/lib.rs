//! GentleWake Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `ScheduleSlot`, `RemoteSchedule`, `LightGroup`, `DeviceMarker`, alarm parsing
//! - **Use cases** - `AlarmTimeResolver`
//! - **Port definitions** - Traits for adapters: `IBridgeGateway`, `IPreferenceStore`, `IAlarmSource`, `IMessageSink`
//! - **Preferences** - Typed access to stored preference values with defaults
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain functions through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod preferences;
pub mod usecases;
