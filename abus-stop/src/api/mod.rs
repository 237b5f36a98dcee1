//! HTTP API of the stop station
//!
//! - `POST /call`    - CALL from the call station
//! - `GET  /pending` - routes being watched for
//! - `GET  /display` - display board contents
//! - `GET  /health`

pub mod handlers;

use crate::station::StopStation;
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
    pub station: Arc<StopStation>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/call", post(handlers::call))
        .route("/pending", get(handlers::list_pending))
        .route("/display", get(handlers::display))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "abus-stop",
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("ABUS_GIT_HASH"),
        "backends": env!("ABUS_BACKENDS"),
        "pending": state.station.pending().len(),
    }))
}
