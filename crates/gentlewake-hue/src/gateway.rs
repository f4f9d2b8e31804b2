//! HueBridgeGateway - IBridgeGateway implementation for the Hue v1 API
//!
//! Wraps a [`HueClient`] and keeps a resource cache of lights, groups and
//! schedules, so [`get_schedule`](IBridgeGateway::get_schedule) never goes to
//! the network.
//!
//! ## Design Notes
//!
//! - The cache is loaded by [`HueBridgeGateway::connect`] and
//!   [`refresh`](IBridgeGateway::refresh); every successful mutation updates
//!   it in place.
//! - Schedules reference their group through the command address
//!   (`/api/<user>/groups/<id>/action`). The cache translates between that id
//!   and the group name used by the domain. Schedules that do not act on a
//!   known group, or carry no parseable `localtime`, are left out of the cache.
//! - Uses `tokio::sync::RwLock` because the synchronizer issues its slot
//!   requests concurrently.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use gentlewake_core::domain::{
    GroupId, GroupName, Light, LightGroup, LightId, LightState, NewSchedule, RemoteSchedule,
    ScheduleId,
};
use gentlewake_core::ports::IBridgeGateway;

use crate::client::{
    CommandBody, GroupBody, GroupResource, HueClient, LightResource, ScheduleBody,
    ScheduleResource, LOCALTIME_FORMAT,
};
use crate::HueError;

// ============================================================================
// Resource cache
// ============================================================================

#[derive(Debug, Default)]
struct ResourceCache {
    lights: Vec<Light>,
    groups: Vec<LightGroup>,
    schedules: BTreeMap<String, RemoteSchedule>,
}

impl ResourceCache {
    fn group_by_name(&self, name: &GroupName) -> Option<&LightGroup> {
        self.groups.iter().find(|g| g.has_name(name))
    }

    fn group_by_id(&self, id: &str) -> Option<&LightGroup> {
        self.groups.iter().find(|g| g.id.as_str() == id)
    }
}

/// Extracts the group id from `/api/<user>/groups/<id>/action`
fn group_id_from_address(address: &str) -> Option<&str> {
    let rest = address.strip_prefix("/api/")?;
    let (_user, rest) = rest.split_once('/')?;
    let rest = rest.strip_prefix("groups/")?;
    let id = rest.strip_suffix("/action")?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

fn convert_lights(lights: BTreeMap<String, LightResource>) -> Vec<Light> {
    lights
        .into_iter()
        .filter_map(|(id, light)| match LightId::new(id.clone()) {
            Ok(id) => Some(Light {
                id,
                name: light.name,
            }),
            Err(e) => {
                warn!(light_id = %id, error = %e, "Skipping light with invalid id");
                None
            }
        })
        .collect()
}

fn convert_groups(groups: BTreeMap<String, GroupResource>) -> Vec<LightGroup> {
    groups
        .into_iter()
        .filter_map(|(id, group)| {
            let converted = GroupId::new(id.clone()).and_then(|gid| {
                Ok(LightGroup {
                    id: gid,
                    name: GroupName::new(group.name)?,
                    lights: group
                        .lights
                        .into_iter()
                        .map(LightId::new)
                        .collect::<std::result::Result<_, _>>()?,
                })
            });
            match converted {
                Ok(group) => Some(group),
                Err(e) => {
                    debug!(group_id = %id, error = %e, "Skipping group");
                    None
                }
            }
        })
        .collect()
}

/// Converts a bridge schedule into the domain form
///
/// Returns `None` for schedules this adapter cannot represent.
fn convert_schedule(
    id: String,
    schedule: ScheduleResource,
    groups: &[LightGroup],
) -> Option<RemoteSchedule> {
    let group_id = group_id_from_address(&schedule.command.address)?;
    let group = groups.iter().find(|g| g.id.as_str() == group_id)?;
    let localtime =
        NaiveDateTime::parse_from_str(schedule.localtime.as_deref()?, LOCALTIME_FORMAT).ok()?;
    let light_state: LightState = serde_json::from_value(schedule.command.body).ok()?;

    Some(RemoteSchedule {
        id: ScheduleId::new(id).ok()?,
        name: schedule.name,
        description: schedule.description,
        localtime,
        light_state,
        group: group.name.clone(),
    })
}

// ============================================================================
// HueBridgeGateway
// ============================================================================

/// Cached gateway to one Hue bridge
pub struct HueBridgeGateway {
    client: HueClient,
    cache: RwLock<ResourceCache>,
}

impl HueBridgeGateway {
    /// Creates a gateway with an empty cache
    ///
    /// Call [`refresh`](IBridgeGateway::refresh) before use, or use
    /// [`connect`](Self::connect).
    pub fn new(client: HueClient) -> Self {
        Self {
            client,
            cache: RwLock::new(ResourceCache::default()),
        }
    }

    /// Creates a gateway and loads its resource cache
    ///
    /// # Errors
    /// Returns an error if any resource collection cannot be read
    pub async fn connect(client: HueClient) -> Result<Self> {
        let gateway = Self::new(client);
        gateway.refresh().await?;
        Ok(gateway)
    }

    pub fn client(&self) -> &HueClient {
        &self.client
    }

    /// Builds the request body for a schedule acting on `group`
    async fn schedule_body(
        &self,
        name: &str,
        description: &str,
        localtime: &NaiveDateTime,
        light_state: &LightState,
        group: &GroupName,
    ) -> std::result::Result<ScheduleBody, HueError> {
        let cache = self.cache.read().await;
        let group = cache
            .group_by_name(group)
            .ok_or_else(|| HueError::UnknownGroup(group.to_string()))?;

        Ok(ScheduleBody {
            name: name.to_string(),
            description: description.to_string(),
            command: CommandBody {
                address: self.client.group_action_address(&group.id),
                method: "PUT",
                body: light_state.clone(),
            },
            localtime: localtime.format(LOCALTIME_FORMAT).to_string(),
            status: "enabled",
        })
    }
}

#[async_trait::async_trait]
impl IBridgeGateway for HueBridgeGateway {
    #[tracing::instrument(skip(self))]
    async fn refresh(&self) -> Result<()> {
        let (lights, groups, schedules) = tokio::try_join!(
            self.client.get_lights(),
            self.client.get_groups(),
            self.client.get_schedules(),
        )
        .context("Failed to load bridge resources")?;

        let lights = convert_lights(lights);
        let groups = convert_groups(groups);
        let total_schedules = schedules.len();
        let schedules: BTreeMap<String, RemoteSchedule> = schedules
            .into_iter()
            .filter_map(|(id, s)| {
                convert_schedule(id.clone(), s, &groups).map(|schedule| (id, schedule))
            })
            .collect();

        info!(
            lights = lights.len(),
            groups = groups.len(),
            schedules = schedules.len(),
            skipped_schedules = total_schedules - schedules.len(),
            "Bridge resource cache loaded"
        );

        *self.cache.write().await = ResourceCache {
            lights,
            groups,
            schedules,
        };
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<LightGroup>> {
        Ok(self.cache.read().await.groups.clone())
    }

    async fn list_lights(&self) -> Result<Vec<Light>> {
        Ok(self.cache.read().await.lights.clone())
    }

    async fn create_group(&self, name: &GroupName, lights: &[LightId]) -> Result<LightGroup> {
        let body = GroupBody::light_group(
            name.as_str(),
            lights.iter().map(ToString::to_string).collect(),
        );
        let id = self
            .client
            .create_group(&body)
            .await
            .with_context(|| format!("Failed to create group '{name}'"))?;

        let group = LightGroup {
            id: GroupId::new(id)?,
            name: name.clone(),
            lights: lights.to_vec(),
        };

        let mut cache = self.cache.write().await;
        if cache.group_by_id(group.id.as_str()).is_none() {
            cache.groups.push(group.clone());
        }
        Ok(group)
    }

    async fn get_schedule(&self, id: &ScheduleId) -> Result<Option<RemoteSchedule>> {
        Ok(self.cache.read().await.schedules.get(id.as_str()).cloned())
    }

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<RemoteSchedule> {
        let body = self
            .schedule_body(
                &schedule.name,
                &schedule.description,
                &schedule.localtime,
                &schedule.light_state,
                &schedule.group,
            )
            .await?;

        let id = self
            .client
            .create_schedule(&body)
            .await
            .with_context(|| format!("Failed to create schedule '{}'", schedule.name))?;

        let created = schedule.clone().into_remote(ScheduleId::new(id)?);
        self.cache
            .write()
            .await
            .schedules
            .insert(created.id.to_string(), created.clone());
        Ok(created)
    }

    async fn update_schedule(&self, schedule: &RemoteSchedule) -> Result<()> {
        let body = self
            .schedule_body(
                &schedule.name,
                &schedule.description,
                &schedule.localtime,
                &schedule.light_state,
                &schedule.group,
            )
            .await?;

        self.client
            .update_schedule(schedule.id.as_str(), &body)
            .await
            .with_context(|| format!("Failed to update schedule '{}'", schedule.id))?;

        self.cache
            .write()
            .await
            .schedules
            .insert(schedule.id.to_string(), schedule.clone());
        Ok(())
    }

    async fn remove_schedule(&self, id: &ScheduleId) -> Result<()> {
        match self.client.delete_schedule(id.as_str()).await {
            Ok(()) => {}
            // One-time schedules delete themselves after firing
            Err(e) if e.is_not_available() => {
                debug!(schedule_id = %id, "Schedule already gone from bridge");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove schedule '{id}'"));
            }
        }

        self.cache.write().await.schedules.remove(id.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, name: &str) -> LightGroup {
        LightGroup {
            id: GroupId::new(id.to_string()).unwrap(),
            name: GroupName::new(name.to_string()).unwrap(),
            lights: vec![],
        }
    }

    fn resource(address: &str, localtime: Option<&str>) -> ScheduleResource {
        ScheduleResource {
            name: "GentleWake On".to_string(),
            description: "Schedule of: GentleWake-abc".to_string(),
            command: crate::client::CommandResource {
                address: address.to_string(),
                method: "PUT".to_string(),
                body: serde_json::json!({"on": true, "bri": 1}),
            },
            localtime: localtime.map(str::to_string),
        }
    }

    #[test]
    fn test_group_id_from_address() {
        assert_eq!(group_id_from_address("/api/user/groups/3/action"), Some("3"));
        assert_eq!(group_id_from_address("/api/user/lights/3/state"), None);
        assert_eq!(group_id_from_address("/api/user/groups//action"), None);
        assert_eq!(group_id_from_address("/groups/3/action"), None);
    }

    #[test]
    fn test_convert_schedule_resolves_group_name() {
        let groups = vec![group("3", "GentleWake")];
        let converted = convert_schedule(
            "7".to_string(),
            resource("/api/u/groups/3/action", Some("2026-10-16T06:50:00")),
            &groups,
        )
        .unwrap();

        assert_eq!(converted.id.as_str(), "7");
        assert_eq!(converted.group.as_str(), "GentleWake");
        assert_eq!(converted.light_state, LightState::dim_on());
        assert_eq!(
            converted.localtime.format(LOCALTIME_FORMAT).to_string(),
            "2026-10-16T06:50:00"
        );
    }

    #[test]
    fn test_convert_schedule_skips_unrepresentable() {
        let groups = vec![group("3", "GentleWake")];
        // Unknown group
        assert!(convert_schedule(
            "1".to_string(),
            resource("/api/u/groups/9/action", Some("2026-10-16T06:50:00")),
            &groups
        )
        .is_none());
        // Light command
        assert!(convert_schedule(
            "1".to_string(),
            resource("/api/u/lights/1/state", Some("2026-10-16T06:50:00")),
            &groups
        )
        .is_none());
        // Recurring time pattern
        assert!(convert_schedule(
            "1".to_string(),
            resource("/api/u/groups/3/action", Some("W124/T06:00:00")),
            &groups
        )
        .is_none());
        // No localtime
        assert!(convert_schedule("1".to_string(), resource("/api/u/groups/3/action", None), &groups)
            .is_none());
    }

    #[test]
    fn test_convert_groups_skips_invalid_names() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "1".to_string(),
            GroupResource {
                name: "Bedroom".to_string(),
                lights: vec!["1".to_string(), "2".to_string()],
                kind: Some("Room".to_string()),
            },
        );
        raw.insert(
            "2".to_string(),
            GroupResource {
                name: "  ".to_string(),
                lights: vec![],
                kind: None,
            },
        );

        let groups = convert_groups(raw);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lights.len(), 2);
    }
}
