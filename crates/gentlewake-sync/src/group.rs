//! Light group resolution
//!
//! Schedules act on a light group identified by name. [`LightGroupResolver`]
//! checks whether that group exists on the bridge and creates it from every
//! known light when it does not.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use gentlewake_core::domain::group::find_by_name;
use gentlewake_core::domain::{GroupName, LightGroup, LightId};
use gentlewake_core::ports::IBridgeGateway;

/// Ensures the configured light group is present on the bridge
pub struct LightGroupResolver {
    gateway: Arc<dyn IBridgeGateway>,
}

impl LightGroupResolver {
    /// Creates a resolver over the given bridge gateway
    pub fn new(gateway: Arc<dyn IBridgeGateway>) -> Self {
        Self { gateway }
    }

    /// Returns the cached group with exactly this name, if any
    ///
    /// # Errors
    /// Returns an error if the group cache cannot be read
    pub async fn find_group(&self, name: &GroupName) -> Result<Option<LightGroup>> {
        let groups = self
            .gateway
            .list_groups()
            .await
            .context("Failed to list light groups")?;
        Ok(find_by_name(&groups, name).cloned())
    }

    /// Returns true iff a cached group carries exactly this name
    ///
    /// # Errors
    /// Returns an error if the group cache cannot be read
    pub async fn group_exists(&self, name: &GroupName) -> Result<bool> {
        Ok(self.find_group(name).await?.is_some())
    }

    /// Returns the named group, creating it from all known lights if absent
    ///
    /// Membership is every light known to the bridge at creation time. A
    /// bridge error is logged and returned without retry.
    ///
    /// # Errors
    /// Returns an error if the lights cannot be listed or the group cannot
    /// be created
    #[tracing::instrument(skip(self))]
    pub async fn ensure_group(&self, name: &GroupName) -> Result<LightGroup> {
        if let Some(group) = self.find_group(name).await? {
            return Ok(group);
        }

        let lights: Vec<LightId> = self
            .gateway
            .list_lights()
            .await
            .context("Failed to list lights")?
            .into_iter()
            .map(|light| light.id)
            .collect();

        info!(group = %name, lights = lights.len(), "Creating light group");

        match self.gateway.create_group(name, &lights).await {
            Ok(group) => {
                info!(group = %name, group_id = %group.id, "Light group created");
                Ok(group)
            }
            Err(e) => {
                error!(group = %name, error = %e, "Error while creating light group");
                Err(e.context(format!("Failed to create light group '{name}'")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBridge};

    fn name(s: &str) -> GroupName {
        GroupName::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_group_exists_exact_match() {
        let bridge = Arc::new(FakeBridge::with_lights(&["1"]));
        bridge.add_group("1", "GentleWake");
        let resolver = LightGroupResolver::new(bridge);

        assert!(resolver.group_exists(&name("GentleWake")).await.unwrap());
        assert!(!resolver.group_exists(&name("gentlewake")).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_creates_with_all_lights() {
        let bridge = Arc::new(FakeBridge::with_lights(&["1", "2", "5"]));
        let resolver = LightGroupResolver::new(bridge.clone());

        let group = resolver.ensure_group(&name("GentleWake")).await.unwrap();
        assert_eq!(group.name.as_str(), "GentleWake");
        assert_eq!(group.lights.len(), 3);
        assert_eq!(
            bridge.calls(),
            vec![Call::CreateGroup(
                "GentleWake".to_string(),
                vec!["1".to_string(), "2".to_string(), "5".to_string()]
            )]
        );
        assert!(resolver.group_exists(&name("GentleWake")).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_returns_existing_without_create() {
        let bridge = Arc::new(FakeBridge::with_lights(&["1"]));
        bridge.add_group("4", "Bedroom");
        let resolver = LightGroupResolver::new(bridge.clone());

        let group = resolver.ensure_group(&name("Bedroom")).await.unwrap();
        assert_eq!(group.id.as_str(), "4");
        assert!(bridge.calls().is_empty());
    }
}
