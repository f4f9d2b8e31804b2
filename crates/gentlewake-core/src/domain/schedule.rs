//! Wake-up schedule domain types
//!
//! A wake-up is materialized on the bridge as three independent schedules,
//! one per [`ScheduleSlot`]:
//!
//! ```text
//!   alarm - transition       +10s                 alarm            alarm + 1h
//!        │                    │                     │                  │
//!        ▼                    ▼                     ▼                  ▼
//!   ┌─────────┐        ┌────────────┐                            ┌─────────┐
//!   │   On    │ ─────► │  Brighten  │ ──── ramp to full ───────► │   Off   │
//!   │ bri = 1 │        │ bri = 255  │                            │ on=false│
//!   └─────────┘        └────────────┘                            └─────────┘
//! ```
//!
//! The slot plan is pure: given the alarm instant, the transition length and
//! the base name, [`plan_slots`] yields the target time and light state for
//! every slot.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;
use super::newtypes::{GroupName, ScheduleId};

/// Delay between the `On` schedule and the `Brighten` schedule
pub const BRIGHTEN_DELAY_SECS: i64 = 10;

/// Delay between the alarm and the `Off` schedule
pub const OFF_DELAY_HOURS: i64 = 1;

/// Brightness used when the light first turns on
pub const DIM_BRIGHTNESS: u8 = 1;

/// Brightness the `Brighten` schedule ramps up to
pub const FULL_BRIGHTNESS: u8 = 255;

/// Deciseconds per minute, the unit of the bridge's transition time
const DECISECONDS_PER_MINUTE: u16 = 600;

/// Human-readable format for schedule dates in status messages
pub const MESSAGE_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

// ============================================================================
// ScheduleSlot
// ============================================================================

/// The three roles a wake-up schedule can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSlot {
    /// Turns the group on at minimum brightness
    On,
    /// Ramps the group to full brightness
    Brighten,
    /// Turns the group off after the alarm
    Off,
}

impl ScheduleSlot {
    /// All slots in firing order
    pub const ALL: [ScheduleSlot; 3] = [
        ScheduleSlot::On,
        ScheduleSlot::Brighten,
        ScheduleSlot::Off,
    ];

    /// Lowercase slot name
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleSlot::On => "on",
            ScheduleSlot::Brighten => "brighten",
            ScheduleSlot::Off => "off",
        }
    }

    /// Suffix appended to the base name to form the schedule name
    pub fn name_suffix(&self) -> &'static str {
        match self {
            ScheduleSlot::On => " On",
            ScheduleSlot::Brighten => " Brighten",
            ScheduleSlot::Off => " Off",
        }
    }

    /// Preference key holding the remembered schedule identifier
    pub fn preference_key(&self) -> &'static str {
        match self {
            ScheduleSlot::On => "schedule_id_on",
            ScheduleSlot::Brighten => "schedule_id_brighten",
            ScheduleSlot::Off => "schedule_id_off",
        }
    }

    /// Full schedule name for the given base name
    pub fn schedule_name(&self, base_name: &str) -> String {
        format!("{base_name}{}", self.name_suffix())
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(ScheduleSlot::On),
            "brighten" => Ok(ScheduleSlot::Brighten),
            "off" => Ok(ScheduleSlot::Off),
            _ => Err(DomainError::UnknownSlot(s.to_string())),
        }
    }
}

// ============================================================================
// TransitionMinutes
// ============================================================================

/// Length of the wake-up ramp in minutes
///
/// Also controls how long before the alarm the `On` schedule fires. The
/// bridge stores transition time as 16-bit deciseconds, which caps the
/// value at [`TransitionMinutes::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct TransitionMinutes(u16);

impl TransitionMinutes {
    /// Default ramp length
    pub const DEFAULT: TransitionMinutes = TransitionMinutes(10);

    /// Largest value whose decisecond form fits the bridge's field
    pub const MAX: u16 = u16::MAX / DECISECONDS_PER_MINUTE;

    /// Create a new TransitionMinutes
    ///
    /// # Errors
    /// Returns error if the value is zero or above [`TransitionMinutes::MAX`]
    pub fn new(minutes: u16) -> Result<Self, DomainError> {
        if minutes == 0 || minutes > Self::MAX {
            return Err(DomainError::ValidationFailed(format!(
                "transition minutes must be between 1 and {}, got {minutes}",
                Self::MAX
            )));
        }
        Ok(Self(minutes))
    }

    /// Minutes value
    pub fn minutes(&self) -> u16 {
        self.0
    }

    /// Ramp length in the bridge's decisecond unit
    pub fn deciseconds(&self) -> u16 {
        self.0 * DECISECONDS_PER_MINUTE
    }

    /// Ramp length as a chrono duration
    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl Default for TransitionMinutes {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TransitionMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransitionMinutes {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s.trim().parse::<u16>().map_err(|_| {
            DomainError::ValidationFailed(format!("transition minutes is not a number: {s}"))
        })?;
        Self::new(minutes)
    }
}

impl TryFrom<u16> for TransitionMinutes {
    type Error = DomainError;

    fn try_from(minutes: u16) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<TransitionMinutes> for u16 {
    fn from(t: TransitionMinutes) -> Self {
        t.0
    }
}

// ============================================================================
// LightState
// ============================================================================

/// Light-state payload a schedule applies to its group
///
/// Unset fields are left untouched by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(rename = "bri", skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// Transition in deciseconds
    #[serde(rename = "transitiontime", skip_serializing_if = "Option::is_none")]
    pub transition_time: Option<u16>,
}

impl LightState {
    /// Turn on at minimum brightness
    pub fn dim_on() -> Self {
        Self {
            on: Some(true),
            brightness: Some(DIM_BRIGHTNESS),
            transition_time: None,
        }
    }

    /// Ramp to full brightness over the transition
    pub fn brighten(transition: TransitionMinutes) -> Self {
        Self {
            on: None,
            brightness: Some(FULL_BRIGHTNESS),
            transition_time: Some(transition.deciseconds()),
        }
    }

    /// Turn off
    pub fn off() -> Self {
        Self {
            on: Some(false),
            brightness: None,
            transition_time: None,
        }
    }
}

// ============================================================================
// RemoteSchedule / NewSchedule
// ============================================================================

/// A schedule resource as held by the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSchedule {
    pub id: ScheduleId,
    pub name: String,
    pub description: String,
    /// Target local date and time
    pub localtime: NaiveDateTime,
    pub light_state: LightState,
    /// Group the schedule acts on, referenced by name
    pub group: GroupName,
}

impl RemoteSchedule {
    /// Status message reported after a successful update
    pub fn updated_message(&self) -> String {
        format!(
            "'{}' updated for {}",
            self.name,
            self.localtime.format(MESSAGE_DATE_FORMAT)
        )
    }

    /// Status message reported after a successful creation
    pub fn scheduled_message(&self) -> String {
        format!(
            "'{}' scheduled for {}",
            self.name,
            self.localtime.format(MESSAGE_DATE_FORMAT)
        )
    }
}

/// A schedule about to be created on the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchedule {
    pub name: String,
    pub description: String,
    pub localtime: NaiveDateTime,
    pub light_state: LightState,
    pub group: GroupName,
}

impl NewSchedule {
    /// Attach the identifier the bridge assigned
    pub fn into_remote(self, id: ScheduleId) -> RemoteSchedule {
        RemoteSchedule {
            id,
            name: self.name,
            description: self.description,
            localtime: self.localtime,
            light_state: self.light_state,
            group: self.group,
        }
    }
}

// ============================================================================
// Slot planning
// ============================================================================

/// Target time and light state for one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    pub slot: ScheduleSlot,
    pub name: String,
    pub localtime: NaiveDateTime,
    pub light_state: LightState,
}

/// Computes the three slot plans for an alarm
///
/// - `On` fires `transition` minutes before the alarm
/// - `Brighten` fires [`BRIGHTEN_DELAY_SECS`] after `On`
/// - `Off` fires [`OFF_DELAY_HOURS`] after the alarm
pub fn plan_slots(
    alarm: NaiveDateTime,
    transition: TransitionMinutes,
    base_name: &str,
) -> [SlotPlan; 3] {
    let on_at = alarm - transition.as_duration();
    let brighten_at = on_at + Duration::seconds(BRIGHTEN_DELAY_SECS);
    let off_at = alarm + Duration::hours(OFF_DELAY_HOURS);

    [
        SlotPlan {
            slot: ScheduleSlot::On,
            name: ScheduleSlot::On.schedule_name(base_name),
            localtime: on_at,
            light_state: LightState::dim_on(),
        },
        SlotPlan {
            slot: ScheduleSlot::Brighten,
            name: ScheduleSlot::Brighten.schedule_name(base_name),
            localtime: brighten_at,
            light_state: LightState::brighten(transition),
        },
        SlotPlan {
            slot: ScheduleSlot::Off,
            name: ScheduleSlot::Off.schedule_name(base_name),
            localtime: off_at,
            light_state: LightState::off(),
        },
    ]
}
