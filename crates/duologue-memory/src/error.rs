//! Error types for the memory crate.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur in the memory crate.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record or query failed validation before reaching the database.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The table was created for a different embedding size.
    #[error("Stored embeddings have {stored} dimensions but {configured} were configured")]
    DimensionMismatch { stored: usize, configured: usize },

    /// Invalid UUID format.
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    /// Invalid data read back from storage.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Injected or backend-specific failure.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
