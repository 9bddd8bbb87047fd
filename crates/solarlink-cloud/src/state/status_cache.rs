//! Last-known device telemetry, keyed by device identifier.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solarlink_core::db::unix_timestamp;
use solarlink_core::telemetry::StatusPayload;
use tokio::sync::RwLock;

/// Last-reported state of one device.
///
/// Snapshots are replaced as whole values under the map lock, so a reader
/// always sees one consistent record, never a mix of two messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub relay_state: bool,
    pub wifi_rssi: i64,
    pub uptime: i64,
    pub free_heap: i64,
    /// Reported fields the cloud does not model explicitly.
    pub extra: BTreeMap<String, Value>,
    pub last_seen: i64,
    pub online: bool,
}

impl StatusSnapshot {
    fn from_status(status: &StatusPayload, now: i64) -> Self {
        Self {
            relay_state: status.relay_state,
            wifi_rssi: status.wifi_rssi,
            uptime: status.uptime,
            free_heap: status.free_heap,
            extra: status.extra.clone(),
            last_seen: now,
            online: true,
        }
    }
}

/// Whole-map-locked cache of device snapshots.
///
/// Single mutator (the ingestor) plus the staleness sweep; many concurrent
/// readers. Whole-map locking is sufficient at that write rate.
#[derive(Clone, Default)]
pub struct StatusCache {
    inner: Arc<RwLock<HashMap<String, StatusSnapshot>>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a device's snapshot from a status message.
    pub async fn record_status(&self, device_id: &str, status: &StatusPayload) {
        let snapshot = StatusSnapshot::from_status(status, unix_timestamp());
        self.inner
            .write()
            .await
            .insert(device_id.to_string(), snapshot);
    }

    /// Merge an online/offline flip into the existing snapshot, preserving
    /// other fields. A device never seen before gets a minimal entry.
    pub async fn set_online(&self, device_id: &str, online: bool) {
        let now = unix_timestamp();
        let mut map = self.inner.write().await;
        match map.get_mut(device_id) {
            Some(snapshot) => {
                snapshot.online = online;
                snapshot.last_seen = now;
            }
            None => {
                map.insert(
                    device_id.to_string(),
                    StatusSnapshot {
                        relay_state: false,
                        wifi_rssi: 0,
                        uptime: 0,
                        free_heap: 0,
                        extra: BTreeMap::new(),
                        last_seen: now,
                        online,
                    },
                );
            }
        }
    }

    pub async fn get(&self, device_id: &str) -> Option<StatusSnapshot> {
        self.inner.read().await.get(device_id).cloned()
    }

    /// Flip `online = false` for every snapshot whose `last_seen` is older
    /// than `threshold_secs`. Entries are never removed. Returns how many
    /// snapshots were flipped.
    pub async fn mark_stale(&self, threshold_secs: i64) -> usize {
        let now = unix_timestamp();
        let mut flipped = 0;
        let mut map = self.inner.write().await;
        for snapshot in map.values_mut() {
            if snapshot.online && now - snapshot.last_seen > threshold_secs {
                snapshot.online = false;
                flipped += 1;
            }
        }
        flipped
    }

    #[cfg(test)]
    pub async fn set_last_seen(&self, device_id: &str, last_seen: i64) {
        if let Some(snapshot) = self.inner.write().await.get_mut(device_id) {
            snapshot.last_seen = last_seen;
        }
    }
}
