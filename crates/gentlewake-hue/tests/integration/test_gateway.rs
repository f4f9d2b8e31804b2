//! Integration tests for the cached HueBridgeGateway

use chrono::NaiveDate;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use gentlewake_core::domain::{GroupName, LightId, LightState, NewSchedule, ScheduleId};
use gentlewake_core::ports::IBridgeGateway;
use gentlewake_hue::HueBridgeGateway;

use crate::common::{self, api};

fn schedule_id(id: &str) -> ScheduleId {
    ScheduleId::new(id.to_string()).unwrap()
}

fn group_name(name: &str) -> GroupName {
    GroupName::new(name.to_string()).unwrap()
}

fn new_schedule(group: &str) -> NewSchedule {
    NewSchedule {
        name: "GentleWake Off".to_string(),
        description: "Schedule of: GentleWake-0123456789ab".to_string(),
        localtime: NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
        light_state: LightState::off(),
        group: group_name(group),
    }
}

async fn connected() -> (wiremock::MockServer, HueBridgeGateway) {
    let (server, client) = common::setup_bridge_mock().await;
    common::mount_resources(&server).await;
    let gateway = HueBridgeGateway::connect(client)
        .await
        .expect("connect failed");
    (server, gateway)
}

// ============================================================================
// Cache loading
// ============================================================================

#[tokio::test]
async fn test_connect_loads_cache() {
    let (_server, gateway) = connected().await;

    assert_eq!(gateway.list_lights().await.unwrap().len(), 2);
    assert_eq!(gateway.list_groups().await.unwrap().len(), 2);

    let on = gateway
        .get_schedule(&schedule_id("2"))
        .await
        .unwrap()
        .expect("schedule 2 should be cached");
    assert_eq!(on.name, "GentleWake On");
    assert_eq!(on.group.as_str(), "GentleWake");
    assert_eq!(on.light_state, LightState::dim_on());

    // Acts on a light, not a group
    assert!(gateway.get_schedule(&schedule_id("3")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_schedule_is_cache_read() {
    let (server, gateway) = connected().await;
    let before = server.received_requests().await.unwrap().len();

    gateway.get_schedule(&schedule_id("2")).await.unwrap();
    gateway.get_schedule(&schedule_id("99")).await.unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_connect_fails_when_bridge_rejects_user() {
    let (server, client) = common::setup_bridge_mock().await;
    for resource in ["/lights", "/groups", "/schedules"] {
        common::mount_command(
            &server,
            "GET",
            resource,
            serde_json::json!([{"error": {"type": 1, "address": "/", "description": "unauthorized user"}}]),
        )
        .await;
    }

    assert!(HueBridgeGateway::connect(client).await.is_err());
}

// ============================================================================
// Mutations keep the cache current
// ============================================================================

#[tokio::test]
async fn test_create_schedule_targets_group_address() {
    let (server, gateway) = connected().await;

    Mock::given(method("POST"))
        .and(path(api("/schedules")))
        .and(body_partial_json(serde_json::json!({
            "command": {
                "address": format!("/api/{}/groups/4/action", common::USERNAME),
                "body": {"on": false}
            },
            "localtime": "2026-10-16T08:00:00"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"success": {"id": "11"}}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = gateway
        .create_schedule(&new_schedule("GentleWake"))
        .await
        .expect("create failed");

    assert_eq!(created.id.as_str(), "11");
    let cached = gateway.get_schedule(&schedule_id("11")).await.unwrap();
    assert_eq!(cached, Some(created));
}

#[tokio::test]
async fn test_create_schedule_for_unknown_group_fails_locally() {
    let (server, gateway) = connected().await;
    let before = server.received_requests().await.unwrap().len();

    let result = gateway.create_schedule(&new_schedule("Nowhere")).await;

    assert!(result.is_err());
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_update_schedule_refreshes_cache() {
    let (server, gateway) = connected().await;
    common::mount_command(
        &server,
        "PUT",
        "/schedules/2",
        serde_json::json!([{"success": {"/schedules/2/localtime": "2026-10-17T06:50:00"}}]),
    )
    .await;

    let mut schedule = gateway.get_schedule(&schedule_id("2")).await.unwrap().unwrap();
    schedule.localtime = NaiveDate::from_ymd_opt(2026, 10, 17)
        .unwrap()
        .and_hms_opt(6, 50, 0)
        .unwrap();
    gateway.update_schedule(&schedule).await.expect("update failed");

    let cached = gateway.get_schedule(&schedule_id("2")).await.unwrap().unwrap();
    assert_eq!(cached.localtime, schedule.localtime);
}

#[tokio::test]
async fn test_remove_schedule_drops_from_cache() {
    let (server, gateway) = connected().await;
    common::mount_command(
        &server,
        "DELETE",
        "/schedules/2",
        serde_json::json!([{"success": "/schedules/2 deleted"}]),
    )
    .await;

    gateway.remove_schedule(&schedule_id("2")).await.unwrap();
    assert!(gateway.get_schedule(&schedule_id("2")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_already_gone_schedule_succeeds() {
    let (server, gateway) = connected().await;
    common::mount_command(
        &server,
        "DELETE",
        "/schedules/2",
        serde_json::json!([{"error": {
            "type": 3,
            "address": "/schedules/2",
            "description": "resource, /schedules/2, not available"
        }}]),
    )
    .await;

    gateway.remove_schedule(&schedule_id("2")).await.unwrap();
    assert!(gateway.get_schedule(&schedule_id("2")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_error_keeps_cached_schedule() {
    let (server, gateway) = connected().await;
    common::mount_command(
        &server,
        "DELETE",
        "/schedules/2",
        serde_json::json!([{"error": {
            "type": 1,
            "address": "/schedules/2",
            "description": "unauthorized user"
        }}]),
    )
    .await;

    let err = gateway.remove_schedule(&schedule_id("2")).await.unwrap_err();
    assert!(format!("{err:#}").contains("unauthorized user"));
    assert!(gateway.get_schedule(&schedule_id("2")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_group_is_listed() {
    let (server, gateway) = connected().await;
    common::mount_command(
        &server,
        "POST",
        "/groups",
        serde_json::json!([{"success": {"id": "6"}}]),
    )
    .await;

    let lights = vec![LightId::new("1".to_string()).unwrap()];
    let group = gateway
        .create_group(&group_name("Wake"), &lights)
        .await
        .expect("create_group failed");

    assert_eq!(group.id.as_str(), "6");
    let groups = gateway.list_groups().await.unwrap();
    assert!(groups.iter().any(|g| g.name.as_str() == "Wake"));
}
