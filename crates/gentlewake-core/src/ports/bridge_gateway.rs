//! Bridge gateway port (driven/secondary port)
//!
//! This module defines the interface for talking to a Hue bridge: reading
//! its groups, lights and schedules, and mutating groups and schedules.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations keep a resource cache. `get_schedule` reads that cache
//!   and never goes to the network; mutations keep the cache current.

use crate::domain::{
    GroupName, Light, LightGroup, LightId, NewSchedule, RemoteSchedule, ScheduleId,
};

/// Port trait for Hue bridge operations
///
/// Every method is asynchronous; callers may issue several requests
/// concurrently with no ordering guarantee between their completions.
#[async_trait::async_trait]
pub trait IBridgeGateway: Send + Sync {
    /// Reloads groups, lights and schedules into the resource cache
    async fn refresh(&self) -> anyhow::Result<()>;

    /// Returns all light groups in the resource cache
    async fn list_groups(&self) -> anyhow::Result<Vec<LightGroup>>;

    /// Returns all lights in the resource cache
    async fn list_lights(&self) -> anyhow::Result<Vec<Light>>;

    /// Creates a light group with the given members
    ///
    /// # Arguments
    /// * `name` - Name of the new group
    /// * `lights` - Lights that make up the group
    async fn create_group(&self, name: &GroupName, lights: &[LightId])
        -> anyhow::Result<LightGroup>;

    /// Looks up a schedule in the resource cache
    ///
    /// Returns `Ok(None)` if no schedule with that identifier is cached.
    async fn get_schedule(&self, id: &ScheduleId) -> anyhow::Result<Option<RemoteSchedule>>;

    /// Creates a schedule and returns it with its bridge-assigned identifier
    async fn create_schedule(&self, schedule: &NewSchedule) -> anyhow::Result<RemoteSchedule>;

    /// Overwrites an existing schedule
    async fn update_schedule(&self, schedule: &RemoteSchedule) -> anyhow::Result<()>;

    /// Deletes a schedule
    ///
    /// Succeeds if the schedule is already absent from the bridge.
    async fn remove_schedule(&self, id: &ScheduleId) -> anyhow::Result<()>;
}
