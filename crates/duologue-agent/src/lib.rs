//! Dialogue core for duologue.
//!
//! Two model-backed personas hold a short conversation on a generated theme;
//! the conversation is summarized, embedded, stored, and compared against
//! earlier summaries.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Pipeline                                                   │
//! │  - ThemeGenerator: "## Theme:" completion, strict           │
//! │  - DialogueAgent x2: alternate for N rounds                 │
//! │  - SummaryGenerator: "## Summary:" completion, lenient      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!       ┌──────────┐    ┌──────────┐    ┌──────────────┐
//!       │ LlmClient│    │ Embedder │    │SummaryBackend│
//!       └──────────┘    └──────────┘    └──────────────┘
//! ```

pub mod agent;
pub mod error;
pub mod generators;
pub mod marker;
pub mod pipeline;
pub mod types;

pub use agent::{AgentState, DialogueAgent};
pub use error::{AgentError, MissingMarkerError, Result};
pub use generators::{
    DEFAULT_THEME_TEMPERATURE, SUMMARY_PROMPT, Summary, SummaryGenerator, THEME_REQUEST,
    ThemeGenerator,
};
pub use marker::{SUMMARY_MARKER, THEME_MARKER, extract_marked};
pub use pipeline::{
    DEFAULT_NUM_TURNS, DEFAULT_SIMILAR_LIMIT, EventHandler, Pipeline, PipelineBuilder,
    PipelineEvent, PipelineReport,
};
pub use types::{ConversationTurn, DialoguePersona, Transcript};
