//! Wire types exchanged between nodes
//!
//! Every node speaks small JSON bodies over HTTP POST:
//! - call station → stop/driver: `{"type": "CALL", "bus": "03", "stop": "..."}`
//! - stop → call station: `{"type": "RELEASE", "bus": "03"}`
//! - every handler answers `{"ok": true}` or `{"ok": false, "error": "..."}`
//!
//! Inbound bodies are parsed leniently (no content-type requirement, unknown
//! fields ignored, numeric `bus` accepted) because the senders are small
//! embedded scripts as often as they are other abus nodes.

use crate::route::{RouteId, RouteTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message type carried in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Call,
    Release,
}

/// Envelope posted by the notification bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub bus: RouteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
}

impl Notification {
    pub fn call(bus: RouteId, stop: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Call,
            bus,
            stop: Some(stop.into()),
        }
    }

    pub fn release(bus: RouteId) -> Self {
        Self {
            kind: NotificationKind::Release,
            bus,
            stop: None,
        }
    }
}

/// Inbound body of `POST /call`, `POST /release` and `POST /press`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub bus: Option<Value>,
    #[serde(default)]
    pub stop: Option<String>,
}

/// Why an inbound route request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRejection {
    /// Body unreadable or `bus` missing/empty
    NoBus,
    /// `bus` present but not a route served at this stop
    UnknownBus,
}

impl RouteRejection {
    pub fn message(self) -> &'static str {
        match self {
            RouteRejection::NoBus => "no bus",
            RouteRejection::UnknownBus => "unknown bus",
        }
    }
}

impl RouteRequest {
    /// Parse a raw request body; an unreadable body is treated as empty
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Raw `bus` value as text (strings as-is, integers formatted)
    pub fn bus_text(&self) -> Option<String> {
        match self.bus.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) if n.is_u64() => Some(n.to_string()),
            _ => None,
        }
    }

    /// Validate `bus` against the route table
    pub fn route(&self, table: &RouteTable) -> Result<RouteId, RouteRejection> {
        let text = self.bus_text().ok_or(RouteRejection::NoBus)?;
        table
            .lookup(&text)
            .map(|info| info.id.clone())
            .ok_or(RouteRejection::UnknownBus)
    }
}

/// Acknowledgement body returned by every inbound handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_envelope_shape() {
        let msg = Notification::call(RouteId::parse("03").unwrap(), "광주대학교 정류장");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"type": "CALL", "bus": "03", "stop": "광주대학교 정류장"})
        );
    }

    #[test]
    fn test_release_envelope_omits_stop() {
        let msg = Notification::release(RouteId::parse("47").unwrap());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "RELEASE", "bus": "47"}));
    }

    #[test]
    fn test_route_request_validation() {
        let table = RouteTable::default_site();

        let req = RouteRequest::from_body(br#"{"bus": "03", "stop": "x"}"#);
        assert_eq!(req.route(&table).unwrap().as_str(), "03");

        let req = RouteRequest::from_body(br#"{"bus": 47}"#);
        assert_eq!(req.route(&table).unwrap().as_str(), "47");

        let req = RouteRequest::from_body(br#"{"stop": "x"}"#);
        assert_eq!(req.route(&table), Err(RouteRejection::NoBus));

        let req = RouteRequest::from_body(br#"{"bus": ""}"#);
        assert_eq!(req.route(&table), Err(RouteRejection::NoBus));

        let req = RouteRequest::from_body(b"not json");
        assert_eq!(req.route(&table), Err(RouteRejection::NoBus));

        let req = RouteRequest::from_body(br#"{"bus": "999"}"#);
        assert_eq!(req.route(&table), Err(RouteRejection::UnknownBus));
    }

    #[test]
    fn test_ack_serialization() {
        assert_eq!(serde_json::to_value(AckResponse::ok()).unwrap(), json!({"ok": true}));
        assert_eq!(
            serde_json::to_value(AckResponse::error("no bus")).unwrap(),
            json!({"ok": false, "error": "no bus"})
        );
    }
}
