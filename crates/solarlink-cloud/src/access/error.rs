//! Error kinds for user-facing registry operations.

use solarlink_core::db::DatabaseError;

/// Failure modes of access-controller operations.
///
/// Each kind maps to one stable code string so the API layer can give
/// callers a distinct status and tell "try again" from "not allowed".
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// No outstanding code for the device, or the supplied code mismatches.
    #[error("Invalid confirmation code or device not found")]
    InvalidConfirmation,

    /// The requesting user already has a relation to this device.
    #[error("You already have access to this device")]
    AlreadyLinked,

    /// The share target already has a relation to this device.
    #[error("User already has access to this device")]
    AlreadyShared,

    /// Owner-only action attempted by a non-owner.
    #[error("Only the owner can perform this action")]
    Forbidden,

    /// Share target has never logged in, so no account exists to share with.
    #[error("User not found. They need to login first")]
    TargetNotFound,

    /// The referenced device does not exist in the registry.
    #[error("Device not found")]
    NotFound,

    /// Pool or transaction failure; the transaction was rolled back and the
    /// caller may retry.
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

impl AccessError {
    /// Stable machine-readable code for the API layer.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfirmation => "invalid_confirmation",
            Self::AlreadyLinked => "already_linked",
            Self::AlreadyShared => "already_shared",
            Self::Forbidden => "forbidden",
            Self::TargetNotFound => "target_not_found",
            Self::NotFound => "not_found",
            Self::Storage(_) => "storage_unavailable",
        }
    }

    /// Whether the caller may resubmit the identical request.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<sqlx::Error> for AccessError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<DatabaseError> for AccessError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(_) => Self::NotFound,
            other => Self::Storage(other.to_string()),
        }
    }
}
