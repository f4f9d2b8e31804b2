//! In-memory port fakes shared by the unit tests of this crate

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};

use gentlewake_core::domain::{
    GroupId, GroupName, Light, LightGroup, LightId, NewSchedule, RemoteSchedule, ScheduleId,
};
use gentlewake_core::ports::{IAlarmSource, IBridgeGateway, IPreferenceStore};

/// A recorded bridge mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateGroup(String, Vec<String>),
    CreateSchedule(String),
    UpdateSchedule(String),
    RemoveSchedule(String),
}

/// Bridge fake holding groups, lights and schedules in memory
#[derive(Default)]
pub struct FakeBridge {
    pub groups: Mutex<Vec<LightGroup>>,
    pub lights: Mutex<Vec<Light>>,
    pub schedules: Mutex<BTreeMap<String, RemoteSchedule>>,
    pub calls: Mutex<Vec<Call>>,
    /// Schedule names whose create/update fails
    pub failing_names: Mutex<Vec<String>>,
    /// Schedule ids whose removal fails
    pub failing_removals: Mutex<Vec<String>>,
    /// When set, create_group succeeds but the group never appears
    pub swallow_groups: Mutex<bool>,
    next_id: AtomicU32,
}

impl FakeBridge {
    pub fn with_lights(ids: &[&str]) -> Self {
        let bridge = Self::default();
        *bridge.lights.lock().unwrap() = ids
            .iter()
            .map(|id| Light {
                id: LightId::new(id.to_string()).unwrap(),
                name: format!("Light {id}"),
            })
            .collect();
        bridge.next_id.store(100, Ordering::SeqCst);
        bridge
    }

    pub fn add_group(&self, id: &str, name: &str) {
        self.groups.lock().unwrap().push(LightGroup {
            id: GroupId::new(id.to_string()).unwrap(),
            name: GroupName::new(name.to_string()).unwrap(),
            lights: vec![],
        });
    }

    pub fn insert_schedule(&self, schedule: RemoteSchedule) {
        self.schedules
            .lock()
            .unwrap()
            .insert(schedule.id.to_string(), schedule);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl IBridgeGateway for FakeBridge {
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<LightGroup>> {
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn list_lights(&self) -> Result<Vec<Light>> {
        Ok(self.lights.lock().unwrap().clone())
    }

    async fn create_group(&self, name: &GroupName, lights: &[LightId]) -> Result<LightGroup> {
        self.calls.lock().unwrap().push(Call::CreateGroup(
            name.to_string(),
            lights.iter().map(ToString::to_string).collect(),
        ));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let group = LightGroup {
            id: GroupId::new(id).unwrap(),
            name: name.clone(),
            lights: lights.to_vec(),
        };
        if !*self.swallow_groups.lock().unwrap() {
            self.groups.lock().unwrap().push(group.clone());
        }
        Ok(group)
    }

    async fn get_schedule(&self, id: &ScheduleId) -> Result<Option<RemoteSchedule>> {
        Ok(self.schedules.lock().unwrap().get(id.as_str()).cloned())
    }

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<RemoteSchedule> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::CreateSchedule(schedule.name.clone()));
        if self.failing_names.lock().unwrap().contains(&schedule.name) {
            bail!("Bridge error 7: invalid value for parameter localtime");
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let created = schedule.clone().into_remote(ScheduleId::new(id).unwrap());
        self.insert_schedule(created.clone());
        Ok(created)
    }

    async fn update_schedule(&self, schedule: &RemoteSchedule) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::UpdateSchedule(schedule.id.to_string()));
        if self.failing_names.lock().unwrap().contains(&schedule.name) {
            bail!("Bridge error 7: invalid value for parameter localtime");
        }
        self.insert_schedule(schedule.clone());
        Ok(())
    }

    async fn remove_schedule(&self, id: &ScheduleId) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::RemoveSchedule(id.to_string()));
        if self.failing_removals.lock().unwrap().contains(&id.to_string()) {
            bail!("Bridge error 1 at /schedules/{id}: unauthorized user");
        }
        self.schedules.lock().unwrap().remove(id.as_str());
        Ok(())
    }
}

/// Preference store backed by a map
#[derive(Default)]
pub struct MemoryStore {
    pub values: Mutex<BTreeMap<String, String>>,
}

#[async_trait::async_trait]
impl IPreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .values
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Alarm source whose value can be changed between calls
#[derive(Default)]
pub struct SettableAlarm {
    pub value: Mutex<Option<String>>,
}

impl SettableAlarm {
    pub fn new(value: Option<&str>) -> Self {
        Self {
            value: Mutex::new(value.map(str::to_string)),
        }
    }

    pub fn set(&self, value: Option<&str>) {
        *self.value.lock().unwrap() = value.map(str::to_string);
    }
}

#[async_trait::async_trait]
impl IAlarmSource for SettableAlarm {
    async fn next_alarm_raw(&self) -> Result<Option<String>> {
        Ok(self.value.lock().unwrap().clone())
    }
}
