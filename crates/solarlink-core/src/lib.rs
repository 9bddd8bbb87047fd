//! `SolarLink` Core Library
//!
//! Shared functionality for `SolarLink` components:
//! - MQTT topic and payload contract for solar controller devices
//! - Database helpers shared by storage layers
//! - Tracing initialization

pub mod db;
pub mod telemetry;
pub mod topics;
pub mod tracing_init;

pub use telemetry::{CommandPayload, StatusPayload};
pub use topics::{DeviceTopic, TopicKind};
