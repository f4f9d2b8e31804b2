//! Typed access to stored preferences
//!
//! [`Preferences`] wraps an [`IPreferenceStore`] and knows every key
//! GentleWake uses, their defaults and their types. Defaults are written
//! back on first read so later runs see a stable value; the device marker
//! is generated the first time it is requested.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::{
    DeviceMarker, DomainError, GroupName, ScheduleId, ScheduleSlot, TransitionMinutes,
    MAX_NAME_LEN,
};
use crate::ports::IPreferenceStore;

/// Preference key: per-device ownership marker
pub const KEY_DEVICE_MARKER: &str = "device_marker";
/// Preference key: name of the light group the schedules act on
pub const KEY_LIGHT_GROUP_NAME: &str = "light_group_name";
/// Preference key: wake-up ramp length in minutes
pub const KEY_TRANSITION_MINUTES: &str = "transition_minutes";
/// Preference key: prefix of every schedule name
pub const KEY_SCHEDULE_BASE_NAME: &str = "schedule_base_name";

/// Default light group name
pub const DEFAULT_LIGHT_GROUP_NAME: &str = "GentleWake";
/// Default schedule base name
pub const DEFAULT_SCHEDULE_BASE_NAME: &str = "GentleWake";

/// Every key the application reads or writes
pub const ALL_KEYS: [&str; 7] = [
    KEY_DEVICE_MARKER,
    KEY_LIGHT_GROUP_NAME,
    KEY_TRANSITION_MINUTES,
    KEY_SCHEDULE_BASE_NAME,
    "schedule_id_on",
    "schedule_id_brighten",
    "schedule_id_off",
];

/// Longest base name whose slot names still fit the bridge's name limit
pub fn max_base_name_len() -> usize {
    let longest_suffix = ScheduleSlot::ALL
        .iter()
        .map(|s| s.name_suffix().len())
        .max()
        .unwrap_or(0);
    MAX_NAME_LEN - longest_suffix
}

/// Validates a value before it is written under `key`
///
/// # Errors
/// Returns [`DomainError`] if the key is unknown or the value is invalid
pub fn validate_entry(key: &str, value: &str) -> Result<(), DomainError> {
    match key {
        KEY_DEVICE_MARKER => DeviceMarker::new(value.to_string()).map(drop),
        KEY_LIGHT_GROUP_NAME => GroupName::new(value.to_string()).map(drop),
        KEY_TRANSITION_MINUTES => value.parse::<TransitionMinutes>().map(drop),
        KEY_SCHEDULE_BASE_NAME => validate_base_name(value),
        _ if ScheduleSlot::ALL.iter().any(|s| s.preference_key() == key) => {
            ScheduleId::new(value.to_string()).map(drop)
        }
        _ => Err(DomainError::ValidationFailed(format!(
            "unknown preference key: {key}"
        ))),
    }
}

fn validate_base_name(value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::ValidationFailed(
            "schedule base name cannot be blank".to_string(),
        ));
    }
    let max = max_base_name_len();
    if value.chars().count() > max {
        return Err(DomainError::ValidationFailed(format!(
            "schedule base name exceeds {max} characters: {value}"
        )));
    }
    Ok(())
}

/// Typed facade over the preference store
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn IPreferenceStore>,
}

impl Preferences {
    /// Creates a facade over the given store
    pub fn new(store: Arc<dyn IPreferenceStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn IPreferenceStore> {
        &self.store
    }

    /// Returns the device marker, generating and persisting one if unset
    ///
    /// A stored marker that fails validation is replaced the same way. The
    /// new marker does not match the descriptions of schedules created
    /// under the old one, so the next sync recreates all three schedules
    /// and the old ones stay on the bridge.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written
    pub async fn device_marker(&self) -> Result<DeviceMarker> {
        if let Some(stored) = self.store.get(KEY_DEVICE_MARKER).await? {
            match DeviceMarker::new(stored) {
                Ok(marker) => return Ok(marker),
                Err(e) => tracing::warn!(error = %e, "Stored device marker invalid, regenerating"),
            }
        }

        let marker = DeviceMarker::generate();
        self.store
            .set(KEY_DEVICE_MARKER, marker.as_str())
            .await
            .context("Failed to persist device marker")?;
        tracing::info!(marker = %marker, "Generated device marker");
        Ok(marker)
    }

    /// Returns the light group name, persisting the default if unset
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written
    pub async fn light_group_name(&self) -> Result<GroupName> {
        if let Some(stored) = self.store.get(KEY_LIGHT_GROUP_NAME).await? {
            match GroupName::new(stored) {
                Ok(name) => return Ok(name),
                Err(e) => tracing::warn!(error = %e, "Stored light group name invalid, using default"),
            }
        }

        self.store
            .set(KEY_LIGHT_GROUP_NAME, DEFAULT_LIGHT_GROUP_NAME)
            .await
            .context("Failed to persist light group name")?;
        Ok(GroupName::new(DEFAULT_LIGHT_GROUP_NAME.to_string())?)
    }

    /// Sets the light group name
    ///
    /// # Errors
    /// Returns an error if the store cannot be written
    pub async fn set_light_group_name(&self, name: &GroupName) -> Result<()> {
        self.store.set(KEY_LIGHT_GROUP_NAME, name.as_str()).await
    }

    /// Returns the transition minutes, persisting the default if unset
    ///
    /// A stored value that does not parse falls back to the default
    /// without overwriting it.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written
    pub async fn transition_minutes(&self) -> Result<TransitionMinutes> {
        match self.store.get(KEY_TRANSITION_MINUTES).await? {
            Some(stored) => Ok(stored.parse().unwrap_or_else(|e: DomainError| {
                tracing::warn!(
                    value = %stored,
                    error = %e,
                    "Stored transition minutes invalid, using default"
                );
                TransitionMinutes::DEFAULT
            })),
            None => {
                self.store
                    .set(
                        KEY_TRANSITION_MINUTES,
                        &TransitionMinutes::DEFAULT.to_string(),
                    )
                    .await
                    .context("Failed to persist transition minutes")?;
                Ok(TransitionMinutes::DEFAULT)
            }
        }
    }

    /// Sets the transition minutes
    ///
    /// # Errors
    /// Returns an error if the store cannot be written
    pub async fn set_transition_minutes(&self, minutes: TransitionMinutes) -> Result<()> {
        self.store
            .set(KEY_TRANSITION_MINUTES, &minutes.to_string())
            .await
    }

    /// Returns the schedule base name, persisting the default if unset
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written
    pub async fn schedule_base_name(&self) -> Result<String> {
        if let Some(stored) = self.store.get(KEY_SCHEDULE_BASE_NAME).await? {
            match validate_base_name(&stored) {
                Ok(()) => return Ok(stored),
                Err(e) => tracing::warn!(error = %e, "Stored schedule base name invalid, using default"),
            }
        }

        self.store
            .set(KEY_SCHEDULE_BASE_NAME, DEFAULT_SCHEDULE_BASE_NAME)
            .await
            .context("Failed to persist schedule base name")?;
        Ok(DEFAULT_SCHEDULE_BASE_NAME.to_string())
    }

    /// Returns the remembered schedule identifier for a slot
    ///
    /// An unparseable stored identifier is treated as absent.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub async fn schedule_id(&self, slot: ScheduleSlot) -> Result<Option<ScheduleId>> {
        let stored = self
            .store
            .get(slot.preference_key())
            .await
            .with_context(|| format!("Failed to read schedule id for slot {slot}"))?;

        Ok(stored.and_then(|raw| match ScheduleId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "Ignoring invalid stored schedule id");
                None
            }
        }))
    }

    /// Remembers the schedule identifier for a slot
    ///
    /// # Errors
    /// Returns an error if the store cannot be written
    pub async fn set_schedule_id(&self, slot: ScheduleSlot, id: &ScheduleId) -> Result<()> {
        self.store
            .set(slot.preference_key(), id.as_str())
            .await
            .with_context(|| format!("Failed to persist schedule id for slot {slot}"))
    }

    /// Forgets the schedule identifier for a slot
    ///
    /// # Errors
    /// Returns an error if the store cannot be written
    pub async fn clear_schedule_id(&self, slot: ScheduleSlot) -> Result<()> {
        self.store
            .remove(slot.preference_key())
            .await
            .with_context(|| format!("Failed to clear schedule id for slot {slot}"))
    }
}
