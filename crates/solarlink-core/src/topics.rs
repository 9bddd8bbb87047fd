//! MQTT topic contract for solar controller devices.
//!
//! Devices publish on `<namespace>/<deviceId>/status` and
//! `<namespace>/<deviceId>/online`; the cloud publishes commands on
//! `<namespace>/<deviceId>/command`. Topics outside this shape are ignored
//! by the ingestor.

/// Message kind carried by a device topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    /// Full telemetry record, possibly carrying a confirmation code.
    Status,
    /// Online/offline boolean literal (MQTT last-will channel).
    Online,
}

/// A parsed device topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopic {
    pub device_id: String,
    pub kind: TopicKind,
}

impl DeviceTopic {
    /// Parse `<namespace>/<deviceId>/<kind>` against the expected namespace.
    ///
    /// Returns `None` for topics that do not match the shape, use a
    /// different namespace, or carry an unknown message kind.
    pub fn parse(namespace: &str, topic: &str) -> Option<Self> {
        let mut parts = topic.split('/');
        let ns = parts.next()?;
        let device_id = parts.next()?;
        let kind = parts.next()?;
        if parts.next().is_some() || ns != namespace || device_id.is_empty() {
            return None;
        }

        let kind = match kind {
            "status" => TopicKind::Status,
            "online" => TopicKind::Online,
            _ => return None,
        };

        Some(Self {
            device_id: device_id.to_string(),
            kind,
        })
    }
}

/// Subscription filter for all device status topics in a namespace.
pub fn status_filter(namespace: &str) -> String {
    format!("{namespace}/+/status")
}

/// Subscription filter for all device online topics in a namespace.
pub fn online_filter(namespace: &str) -> String {
    format!("{namespace}/+/online")
}

/// Command topic for one device.
pub fn command_topic(namespace: &str, device_id: &str) -> String {
    format!("{namespace}/{device_id}/command")
}
