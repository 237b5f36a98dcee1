//! Request handlers

use super::AppState;
use abus_common::message::{AckResponse, RouteRequest};
use abus_common::RouteId;
use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tracing::warn;

/// POST /call
pub async fn call(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<AckResponse>) {
    let request = RouteRequest::from_body(&body);
    match request.route(state.station.routes()) {
        Ok(route) => {
            state.station.handle_call(&route, request.stop.as_deref());
            (StatusCode::OK, Json(AckResponse::ok()))
        }
        Err(rejection) => {
            warn!(bus = ?request.bus_text(), "Rejected call: {}", rejection.message());
            (
                StatusCode::BAD_REQUEST,
                Json(AckResponse::error(rejection.message())),
            )
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub pending: Vec<RouteId>,
}

/// GET /pending
pub async fn list_pending(State(state): State<AppState>) -> Json<PendingResponse> {
    Json(PendingResponse {
        pending: state.station.pending().snapshot(),
    })
}

#[derive(Debug, Serialize)]
pub struct DisplayResponse {
    pub routes: Vec<RouteId>,
    pub message: String,
}

/// GET /display
pub async fn display(State(state): State<AppState>) -> Json<DisplayResponse> {
    let board = state.station.board();
    Json(DisplayResponse {
        routes: board.routes(),
        message: board.message(),
    })
}
