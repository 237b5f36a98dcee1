//! HTTP API of the call station
//!
//! - `POST /release` - RELEASE from the stop station
//! - `POST /press`   - simulated button press (bench testing)
//! - `GET  /calls`   - active calls
//! - `GET  /health`

pub mod handlers;

use crate::station::CallStation;
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
    pub station: Arc<CallStation>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/release", post(handlers::release))
        .route("/press", post(handlers::press))
        .route("/calls", get(handlers::list_calls))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "abus-call",
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("ABUS_GIT_HASH"),
        "backends": env!("ABUS_BACKENDS"),
        "active_calls": state.station.calls().len(),
    }))
}
