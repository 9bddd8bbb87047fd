//! SQLite storage for the SolarLink cloud.
//!
//! Provides persistence for users, devices, access relations, and device
//! telemetry history. Confirmation codes and live status snapshots are
//! deliberately not stored here; they live in [`crate::state`].

mod db;
mod models;
mod queries;
mod queries_history;

#[cfg(test)]
mod tests;

pub use db::CloudDatabase;
pub use models::*;
pub use solarlink_core::db::DatabaseError;
