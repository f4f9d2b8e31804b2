//! Integration tests for HueClient request and response handling

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use gentlewake_core::domain::{LightState, TransitionMinutes};
use gentlewake_hue::client::{CommandBody, GroupBody, ScheduleBody};
use gentlewake_hue::HueError;

use crate::common::{self, api};

fn schedule_body() -> ScheduleBody {
    ScheduleBody {
        name: "GentleWake Brighten".to_string(),
        description: "Schedule of: GentleWake-0123456789ab".to_string(),
        command: CommandBody {
            address: format!("/api/{}/groups/4/action", common::USERNAME),
            method: "PUT",
            body: LightState::brighten(TransitionMinutes::DEFAULT),
        },
        localtime: "2026-10-16T06:50:10".to_string(),
        status: "enabled",
    }
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_get_groups_parses_map() {
    let (server, client) = common::setup_bridge_mock().await;
    common::mount_resources(&server).await;

    let groups = client.get_groups().await.expect("get_groups failed");

    assert_eq!(groups.len(), 2);
    assert_eq!(groups["4"].name, "GentleWake");
    assert_eq!(groups["4"].lights, vec!["1", "2"]);
}

#[tokio::test]
async fn test_unauthorized_user_is_bridge_error() {
    let (server, client) = common::setup_bridge_mock().await;

    Mock::given(method("GET"))
        .and(path(api("/lights")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"error": {"type": 1, "address": "/", "description": "unauthorized user"}}
        ])))
        .mount(&server)
        .await;

    let err = client.get_lights().await.unwrap_err();
    assert_eq!(err.code(), Some(1));
    assert!(err.to_string().contains("unauthorized user"));
}

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = common::setup_bridge_mock().await;

    Mock::given(method("GET"))
        .and(path(api("/schedules")))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let err = client.get_schedules().await.unwrap_err();
    assert!(matches!(err, HueError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let (server, client) = common::setup_bridge_mock().await;

    Mock::given(method("GET"))
        .and(path(api("/groups")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.get_groups().await.unwrap_err();
    assert!(matches!(err, HueError::InvalidResponse(_)));
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_create_schedule_returns_id() {
    let (server, client) = common::setup_bridge_mock().await;

    Mock::given(method("POST"))
        .and(path(api("/schedules")))
        .and(body_partial_json(serde_json::json!({
            "name": "GentleWake Brighten",
            "localtime": "2026-10-16T06:50:10",
            "command": {"method": "PUT", "body": {"bri": 255, "transitiontime": 6000}}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"success": {"id": "9"}}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let id = client
        .create_schedule(&schedule_body())
        .await
        .expect("create_schedule failed");
    assert_eq!(id, "9");
}

#[tokio::test]
async fn test_create_schedule_error_entry() {
    let (server, client) = common::setup_bridge_mock().await;
    common::mount_command(
        &server,
        "POST",
        "/schedules",
        serde_json::json!([{"error": {
            "type": 7,
            "address": "/schedules/localtime",
            "description": "invalid value, 2026-10-16T06:50:10, for parameter, localtime"
        }}]),
    )
    .await;

    let err = client.create_schedule(&schedule_body()).await.unwrap_err();
    assert_eq!(err.code(), Some(7));
}

#[tokio::test]
async fn test_update_schedule_puts_full_body() {
    let (server, client) = common::setup_bridge_mock().await;

    Mock::given(method("PUT"))
        .and(path(api("/schedules/2")))
        .and(body_partial_json(serde_json::json!({"status": "enabled"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"success": {"/schedules/2/name": "GentleWake Brighten"}},
            {"success": {"/schedules/2/localtime": "2026-10-16T06:50:10"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_schedule("2", &schedule_body())
        .await
        .expect("update_schedule failed");
}

#[tokio::test]
async fn test_delete_schedule() {
    let (server, client) = common::setup_bridge_mock().await;
    common::mount_command(
        &server,
        "DELETE",
        "/schedules/2",
        serde_json::json!([{"success": "/schedules/2 deleted"}]),
    )
    .await;

    client.delete_schedule("2").await.expect("delete failed");
}

#[tokio::test]
async fn test_create_group() {
    let (server, client) = common::setup_bridge_mock().await;

    Mock::given(method("POST"))
        .and(path(api("/groups")))
        .and(body_partial_json(serde_json::json!({
            "name": "GentleWake",
            "lights": ["1", "2"],
            "type": "LightGroup"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"success": {"id": "5"}}])),
        )
        .mount(&server)
        .await;

    let body = GroupBody::light_group("GentleWake", vec!["1".to_string(), "2".to_string()]);
    assert_eq!(client.create_group(&body).await.unwrap(), "5");
}
