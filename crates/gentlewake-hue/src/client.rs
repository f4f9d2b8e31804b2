//! Hue bridge API client
//!
//! Provides a typed HTTP client for the bridge's v1 REST API. Every resource
//! lives under `/api/<username>`. Reads return JSON objects keyed by resource
//! id; mutations return an array of `{"success": ...}` / `{"error": ...}`
//! entries, and the bridge reports failures with HTTP 200 and an error entry.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gentlewake_hue::client::HueClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = HueClient::with_base_url("http://192.168.1.2", "my-username");
//! let groups = client.get_groups().await?;
//! println!("{} groups", groups.len());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use gentlewake_core::config::BridgeConfig;
use gentlewake_core::domain::{GroupId, LightState};

use crate::HueError;

/// Format of a schedule's `localtime` field
pub const LOCALTIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ============================================================================
// Bridge API resource types
// ============================================================================

/// Entry of `GET /lights`
#[derive(Debug, Clone, Deserialize)]
pub struct LightResource {
    #[serde(default)]
    pub name: String,
}

/// Entry of `GET /groups`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupResource {
    pub name: String,
    #[serde(default)]
    pub lights: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Entry of `GET /schedules`
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command: CommandResource,
    /// Absent for schedules that only carry the deprecated `time` field
    #[serde(default)]
    pub localtime: Option<String>,
}

/// Action a schedule performs when it fires
#[derive(Debug, Clone, Deserialize)]
pub struct CommandResource {
    pub address: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub body: Value,
}

// ============================================================================
// Request bodies
// ============================================================================

/// Body of `POST /groups`
#[derive(Debug, Clone, Serialize)]
pub struct GroupBody {
    pub name: String,
    pub lights: Vec<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl GroupBody {
    pub fn light_group(name: impl Into<String>, lights: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lights,
            kind: "LightGroup",
        }
    }
}

/// Body of `POST /schedules` and `PUT /schedules/<id>`
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleBody {
    pub name: String,
    pub description: String,
    pub command: CommandBody,
    pub localtime: String,
    pub status: &'static str,
}

/// Group action carried by a schedule
#[derive(Debug, Clone, Serialize)]
pub struct CommandBody {
    pub address: String,
    pub method: &'static str,
    pub body: LightState,
}

// ============================================================================
// Response entries
// ============================================================================

/// One element of a mutation response array
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResponseEntry {
    Success(Value),
    Error(ErrorBody),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    code: u32,
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
}

impl From<ErrorBody> for HueError {
    fn from(e: ErrorBody) -> Self {
        HueError::Bridge {
            code: e.code,
            address: e.address,
            description: e.description,
        }
    }
}

/// Splits a response array into its success payloads
///
/// The first error entry wins.
fn into_successes(value: Value) -> Result<Vec<Value>, HueError> {
    let entries: Vec<ResponseEntry> = serde_json::from_value(value)
        .map_err(|e| HueError::InvalidResponse(format!("not a response array: {e}")))?;

    let mut successes = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            ResponseEntry::Success(v) => successes.push(v),
            ResponseEntry::Error(e) => return Err(e.into()),
        }
    }
    Ok(successes)
}

/// Extracts the id from `[{"success":{"id":"2"}}]`
fn created_id(successes: &[Value]) -> Result<String, HueError> {
    successes
        .iter()
        .find_map(|v| v.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| HueError::InvalidResponse("create response without id".to_string()))
}

// ============================================================================
// HueClient
// ============================================================================

/// HTTP client for one bridge and one whitelisted username
#[derive(Debug, Clone)]
pub struct HueClient {
    /// The underlying HTTP client
    client: Client,
    /// Bridge URL without the `/api` suffix
    base_url: String,
    /// Whitelisted bridge username
    username: String,
}

impl HueClient {
    /// Creates a client from the bridge section of the configuration
    ///
    /// # Errors
    /// Returns [`HueError::NotConfigured`] if the address or username is
    /// missing, or a network error if the HTTP client cannot be built
    pub fn from_config(config: &BridgeConfig) -> Result<Self, HueError> {
        let address = config
            .address
            .as_deref()
            .ok_or(HueError::NotConfigured("bridge.address"))?;
        let username = config
            .username
            .as_deref()
            .ok_or(HueError::NotConfigured("bridge.username"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("http://{}:{}", address, config.port),
            username: username.to_string(),
        })
    }

    /// Creates a client with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `base_url` - Bridge URL, e.g. `http://127.0.0.1:8080`
    /// * `username` - Whitelisted bridge username
    pub fn with_base_url(base_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Creates a request builder for a path under `/api/<username>`
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Resource path, e.g. `/schedules/2`
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/{}{}", self.base_url, self.username, path);
        self.client.request(method, url)
    }

    /// Address a schedule command uses to act on a group
    pub fn group_action_address(&self, group: &GroupId) -> String {
        format!("/api/{}/groups/{}/action", self.username, group)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn get_lights(&self) -> Result<BTreeMap<String, LightResource>, HueError> {
        self.get_resource("/lights").await
    }

    pub async fn get_groups(&self) -> Result<BTreeMap<String, GroupResource>, HueError> {
        self.get_resource("/groups").await
    }

    pub async fn get_schedules(&self) -> Result<BTreeMap<String, ScheduleResource>, HueError> {
        self.get_resource("/schedules").await
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Creates a group and returns its bridge-assigned id
    pub async fn create_group(&self, body: &GroupBody) -> Result<String, HueError> {
        let successes = self.command(Method::POST, "/groups", Some(body)).await?;
        created_id(&successes)
    }

    /// Creates a schedule and returns its bridge-assigned id
    pub async fn create_schedule(&self, body: &ScheduleBody) -> Result<String, HueError> {
        let successes = self.command(Method::POST, "/schedules", Some(body)).await?;
        created_id(&successes)
    }

    /// Overwrites the attributes of an existing schedule
    pub async fn update_schedule(&self, id: &str, body: &ScheduleBody) -> Result<(), HueError> {
        self.command(Method::PUT, &format!("/schedules/{id}"), Some(body))
            .await
            .map(|_| ())
    }

    /// Deletes a schedule
    pub async fn delete_schedule(&self, id: &str) -> Result<(), HueError> {
        self.command::<()>(Method::DELETE, &format!("/schedules/{id}"), None)
            .await
            .map(|_| ())
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// GETs a resource collection
    ///
    /// An unauthorized username yields an error array instead of an object.
    async fn get_resource<T: DeserializeOwned>(&self, path: &str) -> Result<T, HueError> {
        debug!(path, "GET bridge resource");
        let response = self.request(Method::GET, path).send().await?;
        let value = read_json(response).await?;

        if value.is_array() {
            into_successes(value)?;
            return Err(HueError::InvalidResponse(format!(
                "expected an object from {path}"
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| HueError::InvalidResponse(format!("{path}: {e}")))
    }

    /// Sends a mutation and returns its success payloads
    async fn command<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<Value>, HueError> {
        debug!(%method, path, "Bridge command");
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        into_successes(read_json(response).await?)
    }
}

/// Reads a response body as JSON, rejecting non-success statuses
async fn read_json(response: Response) -> Result<Value, HueError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(HueError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| HueError::InvalidResponse(e.to_string()))
}
