//! Access controller: transactional claim/list/revoke/share operations.
//!
//! Every mutation runs as a single `SQLite` transaction; any failure rolls
//! the whole operation back before the error surfaces, so partial effects
//! are never visible. The confirmation-code ledger is consumed only after a
//! claim commits, which makes a failed claim retryable with the same code.

mod controller;
mod error;


pub use controller::{AccessController, DeviceRecord, StatusView};
pub use error::AccessError;
