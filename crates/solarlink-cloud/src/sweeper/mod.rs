//! Maintenance sweeper: staleness marking and history retention.
//!
//! Two independent interval loops. A single scan per tick replaces
//! per-device expiration timers, so timer resources stay constant as the
//! device count grows. Failures are logged and the loop continues.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::StatusCache;
use crate::storage::CloudDatabase;

/// Spawn the staleness sweep: every `tick`, flip `online = false` on
/// snapshots not refreshed within `threshold_secs`.
pub fn spawn_staleness_sweep(
    cache: StatusCache,
    tick: Duration,
    threshold_secs: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            let flipped = cache.mark_stale(threshold_secs).await;
            if flipped > 0 {
                debug!(flipped, "Staleness sweep marked devices offline");
            }
        }
    })
}

/// Spawn the retention purge: every `tick`, delete history rows older than
/// `retention_secs`.
pub fn spawn_retention_purge(
    db: CloudDatabase,
    tick: Duration,
    retention_secs: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            let cutoff = solarlink_core::db::unix_timestamp() - retention_secs;
            match db.purge_history_before(cutoff).await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "History retention purge completed");
                }
                Err(e) => {
                    warn!(error = %e, "History retention purge failed");
                }
                _ => {}
            }
        }
    })
}
