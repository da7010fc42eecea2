//! Error types for the agent crate.

use thiserror::Error;

/// Result type alias using the agent error type.
pub type Result<T> = std::result::Result<T, AgentError>;

/// A completion did not contain the expected `## <Label>:` marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response is missing the '{marker}' marker")]
pub struct MissingMarkerError {
    /// The marker that was searched for.
    pub marker: String,
}

impl MissingMarkerError {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

/// Error type for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Completion or embedding backend error.
    #[error("LLM error: {0}")]
    Llm(#[from] duologue_llm::LlmError),

    /// Summary store error.
    #[error("Memory error: {0}")]
    Memory(#[from] duologue_memory::MemoryError),

    /// A required response marker was absent.
    #[error("Marker error: {0}")]
    MissingMarker(#[from] MissingMarkerError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
