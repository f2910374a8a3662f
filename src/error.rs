//! Error types for reelplan
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in reelplan
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Plan not found in storage
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reelplan operations
pub type Result<T> = std::result::Result<T, PlannerError>;

impl From<rusqlite::Error> for PlannerError {
    fn from(err: rusqlite::Error) -> Self {
        PlannerError::Storage(err.to_string())
    }
}
