//! Domain entities and business logic
//!
//! This module contains the core domain types for GentleWake:
//! - Newtypes for bridge identifiers, group names and the device marker
//! - Next-alarm parsing and resolution
//! - Light and light-group entities
//! - Schedule slots, light states and slot planning
//! - Domain-specific error types

pub mod alarm;
pub mod errors;
pub mod group;
pub mod newtypes;
pub mod schedule;

// Re-export commonly used types
pub use alarm::{parse_alarm, resolve_next_alarm, AlarmTime};
pub use errors::DomainError;
pub use group::{Light, LightGroup};
pub use newtypes::*;
pub use schedule::{
    plan_slots, LightState, NewSchedule, RemoteSchedule, ScheduleSlot, SlotPlan,
    TransitionMinutes, MESSAGE_DATE_FORMAT,
};
