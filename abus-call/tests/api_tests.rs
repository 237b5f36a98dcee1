//! Integration tests for the call station API

use abus_call::api::{create_router, AppState};
use abus_call::CallStation;
use abus_common::audio::{AnnounceCategory, Announcer};
use abus_common::bus::NotificationBus;
use abus_common::{RouteId, RouteTable};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct RecordingAnnouncer(Mutex<Vec<(String, AnnounceCategory)>>);

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn announce(&self, route: &RouteId, category: AnnounceCategory) {
        self.0.lock().unwrap().push((route.to_string(), category));
    }
}

/// Test helper to create a router over a station with no peers
fn setup_test_server() -> (axum::Router, Arc<CallStation>, Arc<RecordingAnnouncer>) {
    let announcer = Arc::new(RecordingAnnouncer::default());
    let station = Arc::new(CallStation::new(
        RouteTable::default_site(),
        NotificationBus::new(Duration::from_millis(100)).unwrap(),
        Vec::new(),
        "test stop".to_string(),
        announcer.clone(),
    ));
    let router = create_router(AppState {
        station: Arc::clone(&station),
    });
    (router, station, announcer)
}

async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn route(id: &str) -> RouteId {
    RouteId::parse(id).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _, _) = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "abus-call");
    assert_eq!(body["backends"], env!("ABUS_BACKENDS"));
    assert!(body["build"].is_string());
}

#[tokio::test]
async fn test_press_then_release_clears_call() {
    let (app, station, announcer) = setup_test_server();

    let (status, body) = make_request(&app, Method::POST, "/press", r#"{"bus":"03"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "outcome": "called"}));
    assert!(station.calls().contains(&route("03")));

    let (_, calls) = make_request(&app, Method::GET, "/calls", "").await;
    assert_eq!(calls["calls"][0]["bus"], "03");

    let (status, body) =
        make_request(&app, Method::POST, "/release", r#"{"type":"RELEASE","bus":"03"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    assert!(station.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        announcer.0.lock().unwrap().clone(),
        vec![("03".to_string(), AnnounceCategory::Select)]
    );
}

#[tokio::test]
async fn test_release_is_always_acknowledged() {
    let (app, station, _) = setup_test_server();
    station.press(&route("47"));

    for body in [r#"{"bus":"77"}"#, r#"{"bus":"999"}"#, r#"{}"#, "garbage", ""] {
        let (status, ack) = make_request(&app, Method::POST, "/release", body).await;
        assert_eq!(status, StatusCode::OK, "body {:?}", body);
        assert_eq!(ack, json!({"ok": true}));
    }
    assert!(station.calls().contains(&route("47")));
}

#[tokio::test]
async fn test_press_rejections() {
    let (app, station, _) = setup_test_server();

    let (status, body) = make_request(&app, Method::POST, "/press", r#"{}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "no bus"}));

    let (status, body) = make_request(&app, Method::POST, "/press", r#"{"bus":"12"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "unknown bus"}));

    assert!(station.calls().is_empty());
}

#[tokio::test]
async fn test_repeated_press_reports_outcome() {
    let (app, _, _) = setup_test_server();

    let (_, first) = make_request(&app, Method::POST, "/press", r#"{"bus":177}"#).await;
    assert_eq!(first["outcome"], "called");

    let (_, bounce) = make_request(&app, Method::POST, "/press", r#"{"bus":"177"}"#).await;
    assert_eq!(bounce["outcome"], "debounced");

    tokio::time::sleep(Duration::from_millis(350)).await;
    let (_, again) = make_request(&app, Method::POST, "/press", r#"{"bus":"177"}"#).await;
    assert_eq!(again["outcome"], "already_calling");
}
