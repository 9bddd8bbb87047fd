//! SolarLink Cloud Service Library
//!
//! Core functionality for the SolarLink cloud:
//! - SQLite storage for users, devices, access relations, and telemetry history
//! - In-memory status cache and pairing ledger fed by the MQTT ingestor
//! - Access controller for claim/list/revoke/share/control operations
//! - Command dispatcher publishing to device command topics
//! - Maintenance sweeper loops for staleness marking and history retention

pub mod access;
pub mod dispatch;
pub mod ingest;
pub mod state;
pub mod storage;
pub mod sweeper;
pub mod transport;
