//! Request handlers

use super::AppState;
use crate::notices::DriverNotice;
use abus_common::message::{AckResponse, RouteRequest};
use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tracing::warn;

/// POST /call
pub async fn call(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<AckResponse>) {
    let request = RouteRequest::from_body(&body);
    match request.route(state.terminal.routes()) {
        Ok(route) => {
            state.terminal.handle_call(&route, request.stop.as_deref());
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
pub struct NotificationsResponse {
    pub notifications: Vec<DriverNotice>,
}

/// GET /notifications
pub async fn list_notifications(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.terminal.log().snapshot(),
    })
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub ok: bool,
    pub cleared: usize,
}

/// POST /notifications/clear
pub async fn clear_notifications(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse {
        ok: true,
        cleared: state.terminal.acknowledge(),
    })
}
