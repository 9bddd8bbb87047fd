//! Process-wide in-memory state fed by the telemetry ingestor.
//!
//! Neither structure persists anything: after a restart every device is
//! unknown/offline until its telemetry resumes. The ingestor is the only
//! writer; request handlers and the staleness sweep read through the same
//! cloneable handles.

mod pairing;
mod status_cache;

pub use pairing::PairingLedger;
pub use status_cache::{StatusCache, StatusSnapshot};
