//! Shared test helpers for Hue bridge integration tests
//!
//! Provides wiremock-based mock server setup for the bridge's v1 API. Each
//! helper mounts the necessary endpoints; [`setup_bridge_mock`] returns a
//! HueClient pointing at the mock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gentlewake_hue::client::HueClient;

/// Username every mock endpoint is mounted under
pub const USERNAME: &str = "test-user";

/// Prefix of every resource path on the mock bridge
pub fn api(resource: &str) -> String {
    format!("/api/{USERNAME}{resource}")
}

/// Starts a mock bridge and returns a (MockServer, HueClient) tuple.
pub async fn setup_bridge_mock() -> (MockServer, HueClient) {
    let server = MockServer::start().await;
    let client = HueClient::with_base_url(server.uri(), USERNAME);
    (server, client)
}

/// Mounts the three resource collections read by a cache refresh.
///
/// - Lights 1 and 2
/// - Group 1 "Living room" and group 4 "GentleWake"
/// - Schedule 2 "GentleWake On" acting on group 4, plus schedule 3 acting
///   on a light, which the gateway cannot represent
pub async fn mount_resources(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api("/lights")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "1": {"name": "Bedside", "type": "Extended color light"},
            "2": {"name": "Ceiling", "type": "Dimmable light"}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/groups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "1": {"name": "Living room", "lights": ["2"], "type": "Room"},
            "4": {"name": "GentleWake", "lights": ["1", "2"], "type": "LightGroup"}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/schedules")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "2": {
                "name": "GentleWake On",
                "description": "Schedule of: GentleWake-0123456789ab",
                "command": {
                    "address": format!("/api/{USERNAME}/groups/4/action"),
                    "method": "PUT",
                    "body": {"on": true, "bri": 1}
                },
                "localtime": "2026-10-16T06:50:00",
                "status": "enabled"
            },
            "3": {
                "name": "Night light",
                "description": "",
                "command": {
                    "address": format!("/api/{USERNAME}/lights/1/state"),
                    "method": "PUT",
                    "body": {"on": false}
                },
                "localtime": "W127/T23:00:00",
                "status": "enabled"
            }
        })))
        .mount(server)
        .await;
}

/// Mounts a mutation endpoint answering with the given response array.
pub async fn mount_command(
    server: &MockServer,
    http_method: &str,
    resource: &str,
    response: serde_json::Value,
) {
    Mock::given(method(http_method))
        .and(path(api(resource)))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}
