//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for bridge resource
//! identifiers and other validated values. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Maximum length the bridge accepts for group and schedule names
pub const MAX_NAME_LEN: usize = 32;

/// Prefix of every generated device marker
const DEVICE_MARKER_PREFIX: &str = "GentleWake-";

/// Number of random characters appended to a generated device marker
const DEVICE_MARKER_KEY_LEN: usize = 12;

/// Checks that a bridge resource identifier can be embedded in a URL path
fn check_resource_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("identifier cannot be empty".to_string());
    }
    if id.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(format!("identifier contains invalid characters: {id}"));
    }
    Ok(())
}

// ============================================================================
// Bridge resource identifiers
// ============================================================================

/// Identifier of a schedule resource on the bridge
///
/// Hue bridges hand out short numeric strings ("1", "12"), but the value is
/// treated as opaque. Only URL-safety is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleId(String);

impl ScheduleId {
    /// Create a new ScheduleId
    ///
    /// # Errors
    /// Returns error if the identifier is empty or not URL-safe
    pub fn new(id: String) -> Result<Self, DomainError> {
        check_resource_id(&id).map_err(DomainError::InvalidScheduleId)?;
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ScheduleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScheduleId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for ScheduleId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ScheduleId> for String {
    fn from(id: ScheduleId) -> Self {
        id.0
    }
}

/// Identifier of a light resource on the bridge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LightId(String);

impl LightId {
    /// Create a new LightId
    ///
    /// # Errors
    /// Returns error if the identifier is empty or not URL-safe
    pub fn new(id: String) -> Result<Self, DomainError> {
        check_resource_id(&id).map_err(DomainError::InvalidLightId)?;
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LightId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LightId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for LightId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LightId> for String {
    fn from(id: LightId) -> Self {
        id.0
    }
}

/// Identifier of a group resource on the bridge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

impl GroupId {
    /// Create a new GroupId
    ///
    /// # Errors
    /// Returns error if the identifier is empty or not URL-safe
    pub fn new(id: String) -> Result<Self, DomainError> {
        check_resource_id(&id).map_err(DomainError::InvalidGroupId)?;
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for GroupId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<GroupId> for String {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

// ============================================================================
// Names and markers
// ============================================================================

/// Name of a light group
///
/// Group names are the matching key for existence checks, so they are
/// compared exactly (case-sensitive, no trimming).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Create a new GroupName
    ///
    /// # Errors
    /// Returns error if the name is blank or longer than [`MAX_NAME_LEN`]
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidGroupName(
                "Group name cannot be blank".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::InvalidGroupName(format!(
                "Group name exceeds {MAX_NAME_LEN} characters: {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GroupName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for GroupName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<GroupName> for String {
    fn from(name: GroupName) -> Self {
        name.0
    }
}

/// Per-device ownership marker written into schedule descriptions
///
/// A schedule belongs to this device only if its description contains the
/// marker. The check is a plain substring match, so two markers where one
/// is a substring of the other would collide. Generated markers share a
/// fixed prefix and a fixed-length random key, which keeps that from
/// happening between GentleWake installations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceMarker(String);

impl DeviceMarker {
    /// Create a DeviceMarker from a stored value
    ///
    /// # Errors
    /// Returns error if the marker is blank
    pub fn new(marker: String) -> Result<Self, DomainError> {
        if marker.trim().is_empty() {
            return Err(DomainError::InvalidDeviceMarker(
                "Device marker cannot be blank".to_string(),
            ));
        }
        Ok(Self(marker))
    }

    /// Generate a fresh random marker, e.g. `GentleWake-3f9a0c1d7b2e`
    #[must_use]
    pub fn generate() -> Self {
        let key = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{DEVICE_MARKER_PREFIX}{}",
            &key[..DEVICE_MARKER_KEY_LEN]
        ))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Description stored on every schedule this device creates
    #[must_use]
    pub fn schedule_description(&self) -> String {
        format!("Schedule of: {}", self.0)
    }

    /// Returns true if the description carries this marker
    #[must_use]
    pub fn is_marked(&self, description: &str) -> bool {
        description.contains(self.0.as_str())
    }
}

impl Display for DeviceMarker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceMarker {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for DeviceMarker {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceMarker> for String {
    fn from(marker: DeviceMarker) -> Self {
        marker.0
    }
}

// ============================================================================
// Unit tests
// ============================================================================
