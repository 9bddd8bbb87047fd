//! Telemetry history queries.
//!
//! History rows are append-only and written only for devices that already
//! exist in the registry; the retention purge trims rows past the window.

use solarlink_core::db::{DatabaseError, unix_timestamp};
use solarlink_core::telemetry::StatusPayload;

use super::db::CloudDatabase;
use super::models::DeviceHistoryRecord;

impl CloudDatabase {
    /// Append one telemetry record for a claimed device.
    pub async fn append_history(
        &self,
        device_identifier: &str,
        status: &StatusPayload,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO device_history (device_identifier, relay_state, wifi_rssi, uptime, free_heap, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(device_identifier)
        .bind(i64::from(status.relay_state))
        .bind(status.wifi_rssi)
        .bind(status.uptime)
        .bind(status.free_heap)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Most recent history rows for a device, newest first.
    pub async fn recent_history(
        &self,
        device_identifier: &str,
        limit: u32,
    ) -> Result<Vec<DeviceHistoryRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, DeviceHistoryRecord>(
            "SELECT * FROM device_history
             WHERE device_identifier = ?
             ORDER BY timestamp DESC
             LIMIT ?",
        )
        .bind(device_identifier)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// Delete history rows older than the cutoff timestamp. Returns the
    /// number of rows removed.
    pub async fn purge_history_before(&self, cutoff: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM device_history WHERE timestamp < ?")
            .bind(cutoff)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
