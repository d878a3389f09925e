use super::*;
use crate::gateway::test_helpers::MockGateway;
use crate::storage::MemoryCredentialStore;
use serde_json::json;
use std::sync::Arc;

fn activity(id: i64, name: &str, event_type: &str, music: Option<&str>) -> Activity {
    Activity {
        id,
        name: Some(name.to_owned()),
        event_type_name: Some(event_type.to_owned()),
        music: music.map(str::to_owned),
        ..Activity::default()
    }
}

fn tonight() -> Vec<Activity> {
    vec![
        activity(1, "Vera", "Concert", Some("https://music.example/vera")),
        activity(2, "Café de Sleutel", "Bar", None),
        activity(3, "Jazz Night", "Event", Some("https://music.example/jazz")),
        Activity { id: 4, ..Activity::default() },
    ]
}

fn ids(found: &[&Activity]) -> Vec<i64> {
    found.iter().map(|a| a.id).collect()
}

// =============================================================================
// ActivityFilter
// =============================================================================

#[test]
fn empty_filter_keeps_everything() {
    let all = tonight();
    assert_eq!(ids(&ActivityFilter::default().apply(&all)), vec![1, 2, 3, 4]);
}

#[test]
fn blank_query_is_ignored() {
    let all = tonight();
    let filter = ActivityFilter { query: Some("   ".into()), event_type: None };
    assert_eq!(filter.apply(&all).len(), 4);
}

#[test]
fn query_matches_name_case_insensitively() {
    let all = tonight();
    let filter = ActivityFilter { query: Some("VERA".into()), event_type: None };
    assert_eq!(ids(&filter.apply(&all)), vec![1]);
}

#[test]
fn query_matches_event_type_and_music() {
    let all = tonight();
    let by_type = ActivityFilter { query: Some("bar".into()), event_type: None };
    assert_eq!(ids(&by_type.apply(&all)), vec![2]);
    let by_music = ActivityFilter { query: Some("music.example/jazz".into()), event_type: None };
    assert_eq!(ids(&by_music.apply(&all)), vec![3]);
}

#[test]
fn event_type_chip_filters() {
    let all = tonight();
    let filter = ActivityFilter { query: None, event_type: Some("concert".into()) };
    assert_eq!(ids(&filter.apply(&all)), vec![1]);
}

#[test]
fn query_and_chip_combine() {
    let all = tonight();
    let filter = ActivityFilter { query: Some("night".into()), event_type: Some("Bar".into()) };
    assert!(filter.apply(&all).is_empty());
}

#[test]
fn missing_fields_never_match_a_query() {
    let bare = Activity { id: 9, ..Activity::default() };
    let filter = ActivityFilter { query: Some("a".into()), event_type: None };
    assert!(!filter.matches(&bare));
}

// =============================================================================
// Activity
// =============================================================================

#[test]
fn position_requires_both_coordinates() {
    let mut a = Activity { latitude: Some(53.2194), ..Activity::default() };
    assert_eq!(a.position(), None);
    a.longitude = Some(6.5665);
    assert_eq!(a.position(), Some((53.2194, 6.5665)));
}

#[test]
fn activity_decodes_sparse_backend_rows() {
    let a: Activity = serde_json::from_value(json!({
        "id": 12,
        "name": "Simplon",
        "latitude": 53.22,
        "longitude": 6.55,
        "live": true,
        "city": null,
        "type_color": "#ff0066"
    }))
    .unwrap();
    assert_eq!(a.id, 12);
    assert!(a.live);
    assert!(a.city.is_none());
    assert_eq!(a.type_color.as_deref(), Some("#ff0066"));
}

// =============================================================================
// fetch_activities
// =============================================================================

/// Session hydrated from a persisted token; `then` scripts the replies
/// that follow the profile fetch.
async fn signed_in(then: impl FnOnce(MockGateway) -> MockGateway) -> (Arc<MockGateway>, SessionController) {
    let gw = Arc::new(then(MockGateway::new().ok(200, json!({ "id": 1, "username": "alice" }))));
    let controller = SessionController::new(gw.clone(), Arc::new(MemoryCredentialStore::with_token("T")));
    controller.restore().await;
    (gw, controller)
}

#[tokio::test]
async fn fetch_requires_authentication() {
    let gw = Arc::new(MockGateway::new());
    let controller = SessionController::new(gw.clone(), Arc::new(MemoryCredentialStore::new()));
    let err = fetch_activities(&controller).await.unwrap_err();
    assert!(matches!(err, ActivityError::NotAuthenticated));
    assert!(gw.calls().is_empty());
}

#[tokio::test]
async fn fetch_lists_with_bearer() {
    let (gw, controller) =
        signed_in(|gw| gw.ok(200, json!([{ "id": 1, "name": "Vera" }, { "id": 2, "name": "Oost" }]))).await;

    let list = fetch_activities(&controller).await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[1].name.as_deref(), Some("Oost"));
    let call = &gw.calls()[1];
    assert_eq!(call.path, ACTIVITIES_PATH);
    assert_eq!(call.method, Method::GET);
    assert_eq!(call.bearer.as_deref(), Some("T"));
}

#[tokio::test]
async fn fetch_surfaces_gateway_errors() {
    let (_gw, controller) = signed_in(|gw| gw.fail(GatewayError::Status { status: 502, body: json!(null) })).await;
    let err = fetch_activities(&controller).await.unwrap_err();
    assert!(matches!(err, ActivityError::Gateway(GatewayError::Status { status: 502, .. })));
}

#[tokio::test]
async fn fetch_rejects_non_list_payload() {
    let (_gw, controller) = signed_in(|gw| gw.ok(200, json!({ "results": [] }))).await;
    let err = fetch_activities(&controller).await.unwrap_err();
    assert!(matches!(err, ActivityError::Decode(_)));
}
