//! Error types for loading cluster snapshots.

use thiserror::Error;

/// Result type alias for snapshot operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while loading or validating a snapshot.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read snapshot: {0}")]
    Io(String),

    #[error("failed to parse snapshot: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}
