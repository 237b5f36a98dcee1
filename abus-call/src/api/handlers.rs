//! Request handlers
//!
//! Bodies are taken as raw bytes and parsed leniently; see
//! [`RouteRequest::from_body`].

use super::AppState;
use crate::call_state::ActiveCall;
use crate::station::PressOutcome;
use abus_common::message::{AckResponse, RouteRequest};
use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tracing::{debug, warn};

/// POST /release
///
/// Always acknowledged. A body without a usable route, or a route that is not
/// active, is a no-op: the stop station does not act on the answer.
pub async fn release(State(state): State<AppState>, body: Bytes) -> Json<AckResponse> {
    let request = RouteRequest::from_body(&body);
    match request.route(state.station.routes()) {
        Ok(route) => {
            state.station.release(&route);
        }
        Err(rejection) => {
            debug!(bus = ?request.bus_text(), "Ignoring release: {}", rejection.message());
        }
    }
    Json(AckResponse::ok())
}

#[derive(Debug, Serialize)]
pub struct PressResponse {
    pub ok: bool,
    pub outcome: PressOutcome,
}

/// POST /press
pub async fn press(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PressResponse>, (StatusCode, Json<AckResponse>)> {
    let request = RouteRequest::from_body(&body);
    let route = request.route(state.station.routes()).map_err(|rejection| {
        warn!(bus = ?request.bus_text(), "Rejected press: {}", rejection.message());
        (
            StatusCode::BAD_REQUEST,
            Json(AckResponse::error(rejection.message())),
        )
    })?;

    let outcome = state.station.press(&route);
    Ok(Json(PressResponse { ok: true, outcome }))
}

#[derive(Debug, Serialize)]
pub struct CallsResponse {
    pub calls: Vec<ActiveCall>,
}

/// GET /calls
pub async fn list_calls(State(state): State<AppState>) -> Json<CallsResponse> {
    Json(CallsResponse {
        calls: state.station.calls().active_calls(),
    })
}
