//! HTTP API of the driver terminal
//!
//! - `POST /call`                 - CALL from the call station
//! - `GET  /notifications`        - notices on screen
//! - `POST /notifications/clear`  - driver acknowledged
//! - `GET  /health`

pub mod handlers;

use crate::terminal::DriverTerminal;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub terminal: Arc<DriverTerminal>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/call", post(handlers::call))
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/clear", post(handlers::clear_notifications))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "abus-driver",
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("ABUS_GIT_HASH"),
        "backends": env!("ABUS_BACKENDS"),
        "notices": state.terminal.log().len(),
    }))
}
