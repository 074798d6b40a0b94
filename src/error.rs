//! Error types for the sms-expense-tracker library.
//!
//! This module provides custom error types using `thiserror` for the
//! ingestion pipeline, the record store and its persistence collaborator.

use thiserror::Error;

/// Errors that can occur in the expense tracker.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Key/value storage errors (sled or any other backend)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The persisted record snapshot exists but cannot be parsed
    #[error("Corrupt snapshot under key {key}: {source}")]
    CorruptSnapshot {
        /// Storage key holding the snapshot
        key: String,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// The user refused access to the message inbox
    #[error("Permission denied: unable to read SMS messages")]
    PermissionDenied,

    /// The message source could not be read
    #[error("Message source error: {0}")]
    Source(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid user input on the command surface
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `TrackerError`
pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        TrackerError::Other(err.to_string())
    }
}

impl From<sled::Error> for TrackerError {
    fn from(err: sled::Error) -> Self {
        TrackerError::Storage(err.to_string())
    }
}

impl From<regex::Error> for TrackerError {
    fn from(err: regex::Error) -> Self {
        TrackerError::InvalidConfig(err.to_string())
    }
}
