//! Light and light-group entities

use serde::{Deserialize, Serialize};

use super::newtypes::{GroupId, GroupName, LightId};

/// A light known to the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub id: LightId,
    pub name: String,
}

/// A named collection of lights on the bridge
///
/// Membership is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightGroup {
    pub id: GroupId,
    pub name: GroupName,
    pub lights: Vec<LightId>,
}

impl LightGroup {
    /// Returns true if the group carries exactly this name
    pub fn has_name(&self, name: &GroupName) -> bool {
        &self.name == name
    }
}

/// Find a group by exact name
pub fn find_by_name<'a>(groups: &'a [LightGroup], name: &GroupName) -> Option<&'a LightGroup> {
    groups.iter().find(|g| g.has_name(name))
}
