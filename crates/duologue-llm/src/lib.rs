//! Completion and embedding clients for duologue.
//!
//! # Architecture
//!
//! Completion backends implement [`LlmBackend`]; an [`LlmClient`] binds a
//! backend to one model and returns plain text. Embedders implement
//! [`Embedder`] with separate query and document encodings.
//!
//! ```text
//! ┌──────────────┐      ┌───────────────────────────┐
//! │  LlmClient   │─────▶│  LlmBackend trait         │
//! │  (model ref) │      │  - complete() -> Response │
//! └──────────────┘      └───────────────────────────┘
//!                                │
//!                      ┌─────────┴─────────┐
//!                      ▼                   ▼
//!               ┌─────────────┐     ┌─────────────┐
//!               │ OpenAiBackend│     │ MockBackend │
//!               └─────────────┘     └─────────────┘
//! ```

pub mod backend;
pub mod client;
pub mod embeddings;
pub mod error;
pub mod openai;
pub mod types;

pub use backend::{LlmBackend, MockBackend, MockResponse, SharedBackend, with_retry};
pub use client::{LlmClient, tag_turns};
pub use error::{LlmError, Result};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};

pub use embeddings::{
    Embedder, EmbedderSpec, EmbeddingMode, MockEmbedder, OpenAiEmbedder, OpenAiEmbedderConfig,
    SharedEmbedder, build_embedder, l2_normalize,
};

pub use openai::{OpenAiBackend, OpenAiConfig};

#[cfg(feature = "local-embeddings")]
pub use embeddings::local::LocalEmbedder;
