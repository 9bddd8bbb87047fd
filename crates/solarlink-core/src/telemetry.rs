//! Wire payload types for device telemetry and commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Telemetry record published by a device on its status topic.
///
/// Field names follow the device firmware's JSON keys. Fields the cloud does
/// not model explicitly are retained in `extra` so the in-memory snapshot
/// reflects the full reported record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(rename = "relayState")]
    pub relay_state: bool,
    #[serde(rename = "wifiRSSI")]
    pub wifi_rssi: i64,
    pub uptime: i64,
    #[serde(rename = "freeHeap")]
    pub free_heap: i64,
    #[serde(rename = "confirmationCode", skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StatusPayload {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Command record published by the cloud on a device's command topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command: String,
    pub state: Value,
}

/// Parse an online-channel payload: the literal `"true"` or `"false"`.
pub fn parse_online_literal(bytes: &[u8]) -> Option<bool> {
    match bytes {
        b"true" => Some(true),
        b"false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_status_with_code_and_extras() {
        let raw = br#"{"relayState":true,"wifiRSSI":-61,"uptime":4200,"freeHeap":18340,"confirmationCode":"123456","batteryVoltage":12.8}"#;
        let status = StatusPayload::parse(raw).unwrap();
        assert!(status.relay_state);
        assert_eq!(status.wifi_rssi, -61);
        assert_eq!(status.confirmation_code.as_deref(), Some("123456"));
        assert_eq!(status.extra["batteryVoltage"], json!(12.8));
    }

    #[test]
    fn parses_status_without_code() {
        let raw = br#"{"relayState":false,"wifiRSSI":-70,"uptime":10,"freeHeap":20000}"#;
        let status = StatusPayload::parse(raw).unwrap();
        assert!(status.confirmation_code.is_none());
        assert!(status.extra.is_empty());
    }

    #[test]
    fn rejects_malformed_status() {
        assert!(StatusPayload::parse(b"not json").is_err());
        // Missing required fields
        assert!(StatusPayload::parse(br#"{"relayState":true}"#).is_err());
    }

    #[test]
    fn command_payload_wire_shape() {
        let cmd = CommandPayload {
            command: "setRelay".to_string(),
            state: json!(true),
        };
        let wire = serde_json::to_string(&cmd).unwrap();
        assert_eq!(wire, r#"{"command":"setRelay","state":true}"#);
    }

    #[test]
    fn online_literal_is_strict() {
        assert_eq!(parse_online_literal(b"true"), Some(true));
        assert_eq!(parse_online_literal(b"false"), Some(false));
        assert_eq!(parse_online_literal(b"True"), None);
        assert_eq!(parse_online_literal(b"1"), None);
        assert_eq!(parse_online_literal(b""), None);
    }
}
