use thiserror::Error;

/// Errors produced by a remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend cannot be reached.
    #[error("Store unavailable")]
    Unavailable,

    /// Security rules rejected the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The backend revoked a listener.
    #[error("Listener cancelled: {0}")]
    Cancelled(String),

    /// Malformed database path.
    #[error("Invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A multi-path update was rejected before being applied.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// The backend refused or lost a write.
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
