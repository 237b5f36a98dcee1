//! Integration tests for the driver terminal API

use abus_common::audio::{AnnounceCategory, Announcer};
use abus_common::{RouteId, RouteTable};
use abus_driver::api::{create_router, AppState};
use abus_driver::DriverTerminal;
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

fn setup_test_server() -> (axum::Router, Arc<RecordingAnnouncer>) {
    let announcer = Arc::new(RecordingAnnouncer::default());
    let terminal = Arc::new(DriverTerminal::new(
        RouteTable::default_site(),
        "정류장".to_string(),
        announcer.clone(),
    ));
    (create_router(AppState { terminal }), announcer)
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
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_call_creates_notice_and_alert() {
    let (app, announcer) = setup_test_server();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/call",
        r#"{"type":"CALL","bus":"03","stop":"광주대학교 정류장"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (_, list) = make_request(&app, Method::GET, "/notifications", "").await;
    let notices = list["notifications"].as_array().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["route"], "03");
    assert_eq!(notices[0]["stop"], "광주대학교 정류장");
    assert_eq!(
        notices[0]["message_en"],
        "A passenger requiring assistance will board bus 03 at 광주대학교 정류장."
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        announcer.0.lock().unwrap().clone(),
        vec![("03".to_string(), AnnounceCategory::DriverAlert)]
    );
}

#[tokio::test]
async fn test_missing_stop_uses_default() {
    let (app, _) = setup_test_server();
    make_request(&app, Method::POST, "/call", r#"{"bus":"77"}"#).await;

    let (_, list) = make_request(&app, Method::GET, "/notifications", "").await;
    assert_eq!(list["notifications"][0]["stop"], "정류장");
}

#[tokio::test]
async fn test_rejected_calls() {
    let (app, announcer) = setup_test_server();

    let (status, body) = make_request(&app, Method::POST, "/call", r#"{"stop":"x"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "no bus"}));

    let (status, body) = make_request(&app, Method::POST, "/call", r#"{"bus":"4a"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "unknown bus"}));

    let (_, list) = make_request(&app, Method::GET, "/notifications", "").await;
    assert!(list["notifications"].as_array().unwrap().is_empty());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(announcer.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_acknowledges_all() {
    let (app, _) = setup_test_server();
    make_request(&app, Method::POST, "/call", r#"{"bus":"47"}"#).await;
    make_request(&app, Method::POST, "/call", r#"{"bus":"47"}"#).await;

    let (status, body) = make_request(&app, Method::POST, "/notifications/clear", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "cleared": 2}));

    let (_, health) = make_request(&app, Method::GET, "/health", "").await;
    assert_eq!(health["notices"], 0);
}
