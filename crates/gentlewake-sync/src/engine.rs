//! Alarm-to-schedule synchronization engine
//!
//! The [`ScheduleSynchronizer`] reconciles the device's next alarm with the
//! three wake-up schedules on the bridge.
//!
//! ## Sync Flow
//!
//! 1. **Group**: make sure the configured light group exists, creating it once
//!    if needed
//! 2. **Alarm**: resolve the next alarm to an absolute local instant
//! 3. **Reconcile**:
//!    - alarm present: create or update the `On`, `Brighten` and `Off` schedules
//!    - alarm absent: remove every schedule this device remembers
//!
//! ## Per-slot states
//!
//! ```text
//!   Absent ─────────────► Creating ──► Created   (id persisted)
//!   Present(ours) ──────► Updating ──► Updated
//!   Present(foreign) ───► Creating ──► Created   (stale id overwritten)
//!   Stored ─────────────► Removing ──► Removed   (id cleared)
//! ```
//!
//! The three slot requests run concurrently. A bridge error on one slot is
//! logged and recorded in the [`SyncReport`]; it never aborts the others and
//! is not retried.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use gentlewake_core::domain::{
    plan_slots, DeviceMarker, GroupName, NewSchedule, RemoteSchedule, ScheduleId, ScheduleSlot,
    SlotPlan,
};
use gentlewake_core::ports::{IAlarmSource, IBridgeGateway, IMessageSink, IPreferenceStore};
use gentlewake_core::preferences::Preferences;
use gentlewake_core::usecases::AlarmTimeResolver;

use crate::group::LightGroupResolver;
use crate::SyncError;

// ============================================================================
// SyncReport
// ============================================================================

/// What happened to one slot during a synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SlotOutcome {
    /// A new schedule was created and its id persisted
    Created(ScheduleId),
    /// The remembered schedule was overwritten
    Updated(ScheduleId),
    /// The remembered schedule was deleted and its id cleared
    Removed(ScheduleId),
    /// The bridge (or the preference store) rejected the operation
    Failed(String),
}

impl SlotOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SlotOutcome::Failed(_))
    }
}

/// Outcome for a single slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub slot: ScheduleSlot,
    #[serde(flatten)]
    pub outcome: SlotOutcome,
}

/// Summary of a completed synchronization
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Resolved alarm instant, `None` if no alarm is configured
    pub alarm: Option<NaiveDateTime>,
    /// Light group the schedules act on
    pub group: GroupName,
    /// One entry per slot that was acted upon
    pub slots: Vec<SlotReport>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Slots whose operation failed
    pub fn failures(&self) -> impl Iterator<Item = &SlotReport> {
        self.slots.iter().filter(|s| s.outcome.is_failure())
    }

    /// Returns true if no slot failed
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Outcome for a given slot, if it was acted upon
    pub fn outcome(&self, slot: ScheduleSlot) -> Option<&SlotOutcome> {
        self.slots
            .iter()
            .find(|s| s.slot == slot)
            .map(|s| &s.outcome)
    }
}

// ============================================================================
// ScheduleSynchronizer
// ============================================================================

/// Reconciles the next alarm with the wake-up schedules on the bridge
///
/// ## Dependencies
///
/// - `gateway`: bridge resource cache and mutations
/// - `preferences`: remembered schedule ids, group name, transition, marker
/// - `alarm_resolver`: next-alarm instant
///
/// Concurrent calls to [`synchronize`](Self::synchronize) are serialized.
pub struct ScheduleSynchronizer {
    gateway: Arc<dyn IBridgeGateway>,
    preferences: Preferences,
    alarm_resolver: AlarmTimeResolver,
    groups: LightGroupResolver,
    /// Held for the whole of one synchronization
    in_flight: Mutex<()>,
}

impl ScheduleSynchronizer {
    /// Creates a new `ScheduleSynchronizer` with the given dependencies
    ///
    /// # Arguments
    /// * `gateway` - Bridge operations (IBridgeGateway)
    /// * `store` - Preference persistence (IPreferenceStore)
    /// * `alarm_source` - Next-alarm string (IAlarmSource)
    pub fn new(
        gateway: Arc<dyn IBridgeGateway>,
        store: Arc<dyn IPreferenceStore>,
        alarm_source: Arc<dyn IAlarmSource>,
    ) -> Self {
        Self {
            groups: LightGroupResolver::new(gateway.clone()),
            gateway,
            preferences: Preferences::new(store),
            alarm_resolver: AlarmTimeResolver::new(alarm_source),
            in_flight: Mutex::new(()),
        }
    }

    /// Typed view of the preference store used by this synchronizer
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Reloads the bridge resource cache
    ///
    /// Long-running callers do this before each cycle so that changes made
    /// on the bridge by other clients are seen.
    ///
    /// # Errors
    /// Returns an error if the bridge cannot be read
    pub async fn refresh_bridge(&self) -> Result<()> {
        self.gateway
            .refresh()
            .await
            .context("Failed to refresh bridge resources")
    }

    /// Runs one synchronization relative to the current local time
    ///
    /// # Errors
    /// See [`synchronize_at`](Self::synchronize_at)
    pub async fn synchronize(&self, sink: &dyn IMessageSink) -> Result<SyncReport> {
        self.synchronize_at(Local::now().naive_local(), sink).await
    }

    /// Runs one synchronization relative to `now`
    ///
    /// Status messages for successful creates, updates and removals, and for
    /// failed removals, are passed to `sink` as they happen.
    ///
    /// # Errors
    /// Returns an error if a precondition fails: the preference store cannot
    /// be read, the alarm source cannot be read, or the light group cannot be
    /// ensured. Per-slot bridge errors are reported in the [`SyncReport`].
    #[tracing::instrument(skip(self, sink))]
    pub async fn synchronize_at(
        &self,
        now: NaiveDateTime,
        sink: &dyn IMessageSink,
    ) -> Result<SyncReport> {
        let _guard = self.in_flight.lock().await;
        let start = Instant::now();

        info!("Syncing alarm");

        let group = self.resolve_group().await?;
        let alarm = self
            .alarm_resolver
            .resolve_at(now)
            .await
            .context("Failed to resolve next alarm")?;

        let slots = match alarm {
            Some(alarm) => {
                debug!(alarm = %alarm, "Creating / updating all three schedules");
                self.schedule_all(alarm, &group, sink).await?
            }
            None => {
                debug!("No alarm configured, removing remembered schedules");
                self.remove_all(sink).await?
            }
        };

        let report = SyncReport {
            alarm,
            group,
            slots,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            alarm = ?report.alarm,
            slots = report.slots.len(),
            failures = report.failures().count(),
            duration_ms = report.duration_ms,
            "Sync completed"
        );

        Ok(report)
    }

    /// Returns the configured group, creating it once if it is missing
    async fn resolve_group(&self) -> Result<GroupName> {
        let name = self
            .preferences
            .light_group_name()
            .await
            .context("Failed to read light group name")?;

        if !self.groups.group_exists(&name).await? {
            self.groups.ensure_group(&name).await?;
            // One re-check only; a bridge that keeps losing the group is an error
            if !self.groups.group_exists(&name).await? {
                return Err(SyncError::GroupUnavailable(name.to_string()).into());
            }
        }

        Ok(name)
    }

    async fn schedule_all(
        &self,
        alarm: NaiveDateTime,
        group: &GroupName,
        sink: &dyn IMessageSink,
    ) -> Result<Vec<SlotReport>> {
        let marker = self
            .preferences
            .device_marker()
            .await
            .context("Failed to read device marker")?;
        let transition = self
            .preferences
            .transition_minutes()
            .await
            .context("Failed to read transition minutes")?;
        let base_name = self
            .preferences
            .schedule_base_name()
            .await
            .context("Failed to read schedule base name")?;

        let [on, brighten, off] = plan_slots(alarm, transition, &base_name);

        let (on, brighten, off) = tokio::join!(
            self.create_or_update(&on, group, &marker, sink),
            self.create_or_update(&brighten, group, &marker, sink),
            self.create_or_update(&off, group, &marker, sink),
        );

        Ok(vec![on, brighten, off])
    }

    async fn remove_all(&self, sink: &dyn IMessageSink) -> Result<Vec<SlotReport>> {
        let on = self.preferences.schedule_id(ScheduleSlot::On).await?;
        let brighten = self.preferences.schedule_id(ScheduleSlot::Brighten).await?;
        let off = self.preferences.schedule_id(ScheduleSlot::Off).await?;

        let (on, brighten, off) = tokio::join!(
            self.remove_if_stored(ScheduleSlot::On, on, sink),
            self.remove_if_stored(ScheduleSlot::Brighten, brighten, sink),
            self.remove_if_stored(ScheduleSlot::Off, off, sink),
        );

        Ok([on, brighten, off].into_iter().flatten().collect())
    }

    /// Creates the slot's schedule, or updates it if the remembered one is ours
    #[tracing::instrument(skip(self, plan, marker, sink), fields(slot = %plan.slot))]
    async fn create_or_update(
        &self,
        plan: &SlotPlan,
        group: &GroupName,
        marker: &DeviceMarker,
        sink: &dyn IMessageSink,
    ) -> SlotReport {
        let outcome = match self.existing_schedule(plan.slot, marker).await {
            Ok(Some(schedule)) => self.update(plan, group, schedule, sink).await,
            Ok(None) => self.create(plan, group, marker, sink).await,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to look up remembered schedule");
                SlotOutcome::Failed(format!("{e:#}"))
            }
        };

        SlotReport {
            slot: plan.slot,
            outcome,
        }
    }

    /// The remembered schedule for a slot, if it still exists and is ours
    async fn existing_schedule(
        &self,
        slot: ScheduleSlot,
        marker: &DeviceMarker,
    ) -> Result<Option<RemoteSchedule>> {
        let Some(id) = self.preferences.schedule_id(slot).await? else {
            return Ok(None);
        };

        let cached = self
            .gateway
            .get_schedule(&id)
            .await
            .with_context(|| format!("Failed to read schedule {id} from cache"))?;

        match cached {
            Some(schedule) if marker.is_marked(&schedule.description) => Ok(Some(schedule)),
            Some(schedule) => {
                debug!(
                    schedule_id = %id,
                    description = %schedule.description,
                    "Remembered schedule is not ours, creating a new one"
                );
                Ok(None)
            }
            None => {
                debug!(schedule_id = %id, "Remembered schedule not found, creating a new one");
                Ok(None)
            }
        }
    }

    async fn create(
        &self,
        plan: &SlotPlan,
        group: &GroupName,
        marker: &DeviceMarker,
        sink: &dyn IMessageSink,
    ) -> SlotOutcome {
        let new_schedule = NewSchedule {
            name: plan.name.clone(),
            description: marker.schedule_description(),
            localtime: plan.localtime,
            light_state: plan.light_state.clone(),
            group: group.clone(),
        };

        let created = match self.gateway.create_schedule(&new_schedule).await {
            Ok(created) => created,
            Err(e) => {
                error!(
                    schedule = %new_schedule.name,
                    error = %format!("{e:#}"),
                    "Error while creating schedule"
                );
                return SlotOutcome::Failed(format!("{e:#}"));
            }
        };

        if let Err(e) = self
            .preferences
            .set_schedule_id(plan.slot, &created.id)
            .await
        {
            error!(
                schedule_id = %created.id,
                error = %format!("{e:#}"),
                "Schedule created but its id could not be remembered"
            );
            return SlotOutcome::Failed(format!("{e:#}"));
        }

        let msg = created.scheduled_message();
        info!(schedule_id = %created.id, "{msg}");
        sink.on_message(&msg);

        SlotOutcome::Created(created.id)
    }

    async fn update(
        &self,
        plan: &SlotPlan,
        group: &GroupName,
        mut schedule: RemoteSchedule,
        sink: &dyn IMessageSink,
    ) -> SlotOutcome {
        if &schedule.group != group {
            warn!(
                schedule = %schedule.name,
                found = %schedule.group,
                expected = %group,
                "Light group on schedule differs, overwriting"
            );
            schedule.group = group.clone();
        }
        schedule.light_state = plan.light_state.clone();
        schedule.localtime = plan.localtime;

        match self.gateway.update_schedule(&schedule).await {
            Ok(()) => {
                let msg = schedule.updated_message();
                info!(schedule_id = %schedule.id, "{msg}");
                sink.on_message(&msg);
                SlotOutcome::Updated(schedule.id)
            }
            Err(e) => {
                error!(
                    schedule_id = %schedule.id,
                    error = %format!("{e:#}"),
                    "Error while updating schedule"
                );
                SlotOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    async fn remove_if_stored(
        &self,
        slot: ScheduleSlot,
        id: Option<ScheduleId>,
        sink: &dyn IMessageSink,
    ) -> Option<SlotReport> {
        let id = id?;
        debug!(slot = %slot, schedule_id = %id, "Removing schedule");

        let outcome = match self.gateway.remove_schedule(&id).await {
            Ok(()) => match self.preferences.clear_schedule_id(slot).await {
                Ok(()) => {
                    let msg = format!("'{id}' removed from Hue bridge.");
                    info!(slot = %slot, "{msg}");
                    sink.on_message(&msg);
                    SlotOutcome::Removed(id)
                }
                Err(e) => {
                    error!(slot = %slot, error = %format!("{e:#}"), "Schedule removed but id not cleared");
                    SlotOutcome::Failed(format!("{e:#}"))
                }
            },
            Err(e) => {
                let msg = format!("Error while removing schedule '{id}': {e}");
                error!(slot = %slot, "{msg}");
                sink.on_message(&msg);
                SlotOutcome::Failed(format!("{e:#}"))
            }
        };

        Some(SlotReport { slot, outcome })
    }
}

// ============================================================================
// Tests
// ============================================================================
