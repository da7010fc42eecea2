//! The dialogue pipeline.
//!
//! ```text
//! theme ──▶ N rounds (A, B) ──▶ summary ──▶ encode_document ──▶ insert
//!                                                                  │
//!            top-k similar ◀── encode_query(theme) ◀───────────────┘
//! ```
//!
//! Everything runs sequentially on the caller's task. A failed insert is
//! logged and reported, and the similarity query still runs.

use std::sync::Arc;

use duologue_llm::{SharedBackend, SharedEmbedder};
use duologue_memory::{ScoredSummary, SummaryBackend, SummaryId, SummaryRecord};
use tracing::{info, warn};

use crate::agent::DialogueAgent;
use crate::error::{AgentError, Result};
use crate::generators::{Summary, SummaryGenerator, ThemeGenerator};
use crate::types::{ConversationTurn, DialoguePersona, Transcript};

/// Default number of rounds.
pub const DEFAULT_NUM_TURNS: u32 = 3;

/// Default number of similar summaries returned.
pub const DEFAULT_SIMILAR_LIMIT: usize = 3;

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    ThemeGenerated { theme: String },
    RoundStarted { round: u32 },
    Turn(ConversationTurn),
    ConversationFinished { turns: usize },
    SummaryGenerated(Summary),
    SummaryStored { id: SummaryId },
    StoreFailed { id: SummaryId, error: String },
}

/// Callback receiving [`PipelineEvent`]s.
pub type EventHandler = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub theme: String,
    pub transcript: Transcript,
    pub summary: Summary,
    /// The record that was (or failed to be) inserted.
    pub record: SummaryRecord,
    /// Whether the insert succeeded.
    pub stored: bool,
    /// Summaries most similar to the theme, best first.
    pub similar: Vec<ScoredSummary>,
}

/// A configured dialogue run.
pub struct Pipeline {
    personas: [DialoguePersona; 2],
    speaker_backend: SharedBackend,
    speaker_temperature: Option<f32>,
    theme: ThemeGenerator,
    summarizer: SummaryGenerator,
    embedder: SharedEmbedder,
    store: Arc<dyn SummaryBackend>,
    num_turns: u32,
    similar_limit: usize,
    on_event: Option<EventHandler>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("personas", &[&self.personas[0].name, &self.personas[1].name])
            .field("embedder", &self.embedder.name())
            .field("num_turns", &self.num_turns)
            .field("similar_limit", &self.similar_limit)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn num_turns(&self) -> u32 {
        self.num_turns
    }

    /// Run the whole pipeline once.
    ///
    /// # Errors
    ///
    /// Fails on any completion error, a missing theme marker, an embedding
    /// error (including a dimension mismatch) or a failed similarity query.
    /// A failed insert is not an error.
    pub async fn run(&self) -> Result<PipelineReport> {
        self.store.ensure_table()?;

        let theme = self.theme.generate().await?;
        self.emit(PipelineEvent::ThemeGenerated {
            theme: theme.clone(),
        });

        let transcript = self.converse(&theme).await?;

        let summary = self.summarizer.summarize(&transcript).await?;
        self.emit(PipelineEvent::SummaryGenerated(summary.clone()));

        let embedding = self.embedder.encode_document(&summary.text).await?;
        let record = SummaryRecord::new(summary.text.clone(), embedding);

        let stored = match self.store.insert(&record) {
            Ok(()) => {
                info!(id = %record.id, "Summary stored");
                self.emit(PipelineEvent::SummaryStored { id: record.id });
                true
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "Failed to store summary, continuing without it");
                self.emit(PipelineEvent::StoreFailed {
                    id: record.id,
                    error: e.to_string(),
                });
                false
            }
        };

        let query = self.embedder.encode_query(&theme).await?;
        let similar = self.store.top_k_similar(&query, self.similar_limit)?;
        info!(found = similar.len(), "Similarity search complete");

        Ok(PipelineReport {
            theme,
            transcript,
            summary,
            record,
            stored,
            similar,
        })
    }

    /// Alternate the two personas for `num_turns` rounds, first persona first.
    async fn converse(&self, theme: &str) -> Result<Transcript> {
        let mut agents = self.personas.clone().map(|persona| {
            DialogueAgent::new(persona.with_theme(theme), self.speaker_backend.clone())
                .with_temperature(self.speaker_temperature)
        });

        let mut transcript = Transcript::new();
        for round in 1..=self.num_turns {
            self.emit(PipelineEvent::RoundStarted { round });
            for agent in agents.iter_mut() {
                let text = agent.chat(&transcript).await?;
                let turn = transcript.push(agent.name(), text).clone();
                self.emit(PipelineEvent::Turn(turn));
            }
        }

        info!(turns = transcript.len(), "Conversation finished");
        self.emit(PipelineEvent::ConversationFinished {
            turns: transcript.len(),
        });
        Ok(transcript)
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    personas: Option<[DialoguePersona; 2]>,
    speaker_backend: Option<SharedBackend>,
    speaker_temperature: Option<f32>,
    theme: Option<ThemeGenerator>,
    summarizer: Option<SummaryGenerator>,
    embedder: Option<SharedEmbedder>,
    store: Option<Arc<dyn SummaryBackend>>,
    num_turns: u32,
    similar_limit: usize,
    on_event: Option<EventHandler>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            personas: None,
            speaker_backend: None,
            speaker_temperature: None,
            theme: None,
            summarizer: None,
            embedder: None,
            store: None,
            num_turns: DEFAULT_NUM_TURNS,
            similar_limit: DEFAULT_SIMILAR_LIMIT,
            on_event: None,
        }
    }

    /// The two personas; `first` opens the conversation.
    pub fn with_personas(mut self, first: DialoguePersona, second: DialoguePersona) -> Self {
        self.personas = Some([first, second]);
        self
    }

    /// Backend both personas speak through.
    pub fn with_speaker_backend(mut self, backend: SharedBackend) -> Self {
        self.speaker_backend = Some(backend);
        self
    }

    pub fn with_speaker_temperature(mut self, temperature: Option<f32>) -> Self {
        self.speaker_temperature = temperature;
        self
    }

    pub fn with_theme_generator(mut self, theme: ThemeGenerator) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_summary_generator(mut self, summarizer: SummaryGenerator) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_embedder(mut self, embedder: SharedEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SummaryBackend>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_num_turns(mut self, num_turns: u32) -> Self {
        self.num_turns = num_turns;
        self
    }

    pub fn with_similar_limit(mut self, limit: usize) -> Self {
        self.similar_limit = limit;
        self
    }

    pub fn with_event_handler(mut self, handler: EventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Fails if a component is missing, the persona names collide, or the
    /// embedder and store disagree on dimensions.
    pub fn build(self) -> Result<Pipeline> {
        let personas = self
            .personas
            .ok_or_else(|| AgentError::config("personas are required"))?;
        if personas[0].name == personas[1].name {
            return Err(AgentError::config(format!(
                "persona names must differ, both are '{}'",
                personas[0].name
            )));
        }
        let speaker_backend = self
            .speaker_backend
            .ok_or_else(|| AgentError::config("speaker backend is required"))?;
        let theme = self
            .theme
            .ok_or_else(|| AgentError::config("theme generator is required"))?;
        let summarizer = self
            .summarizer
            .ok_or_else(|| AgentError::config("summary generator is required"))?;
        let embedder = self
            .embedder
            .ok_or_else(|| AgentError::config("embedder is required"))?;
        let store = self
            .store
            .ok_or_else(|| AgentError::config("summary store is required"))?;

        if embedder.dimensions() != store.dimensions() {
            return Err(AgentError::config(format!(
                "embedder '{}' produces {} dimensions but the store expects {}",
                embedder.name(),
                embedder.dimensions(),
                store.dimensions()
            )));
        }
        if self.num_turns == 0 {
            return Err(AgentError::config("num_turns must be at least 1"));
        }

        Ok(Pipeline {
            personas,
            speaker_backend,
            speaker_temperature: self.speaker_temperature,
            theme,
            summarizer,
            embedder,
            store,
            num_turns: self.num_turns,
            similar_limit: self.similar_limit,
            on_event: self.on_event,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
