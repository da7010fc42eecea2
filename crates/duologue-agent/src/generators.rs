//! Theme and summary generation.
//!
//! Both generators ask the model for a `## <Label>: <text>` reply. A missing
//! theme marker aborts the run; a missing summary marker falls back to the
//! raw completion text.

use duologue_llm::{LlmClient, Message};
use tracing::{info, warn};

use crate::error::Result;
use crate::marker::{SUMMARY_MARKER, THEME_MARKER, extract_marked};
use crate::types::Transcript;

/// Default theme sampling temperature.
pub const DEFAULT_THEME_TEMPERATURE: f32 = 2.0;

/// User request sent to the theme model.
pub const THEME_REQUEST: &str = "Propose a theme for a conversation between two agents. \
Think freely and come up with something unique and unusual. \
Follow the format and reply with nothing else: ## Theme: <theme>";

/// System prompt for the summary model.
pub const SUMMARY_PROMPT: &str = "You are a conversation specialist. \
Summarize the conversation the user provides. \
Follow this format: ## Summary: <summary>";

// ─────────────────────────────────────────────────────────────────────────────
// Theme
// ─────────────────────────────────────────────────────────────────────────────

/// Generates the session theme with one high-temperature completion.
#[derive(Debug, Clone)]
pub struct ThemeGenerator {
    client: LlmClient,
    system_prompt: String,
    temperature: f32,
}

impl ThemeGenerator {
    pub fn new(client: LlmClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            temperature: DEFAULT_THEME_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Ask for a theme and extract it.
    ///
    /// # Errors
    ///
    /// [`AgentError::MissingMarker`](crate::AgentError::MissingMarker) when
    /// the reply lacks `## Theme:`, or the completion error itself.
    pub async fn generate(&self) -> Result<String> {
        let text = self
            .client
            .complete(
                &self.system_prompt,
                vec![Message::user(THEME_REQUEST)],
                Some(self.temperature),
            )
            .await?;

        let theme = extract_marked(&text, THEME_MARKER)?;
        info!(theme = %theme, "Theme generated");
        Ok(theme)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Summary
// ─────────────────────────────────────────────────────────────────────────────

/// A generated summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Trimmed summary text.
    pub text: String,
    /// False when the reply lacked `## Summary:` and the raw text was used.
    pub marker_found: bool,
}

/// Summarizes a finished transcript.
#[derive(Debug, Clone)]
pub struct SummaryGenerator {
    client: LlmClient,
    system_prompt: String,
}

impl SummaryGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            system_prompt: SUMMARY_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Summarize `transcript` at the backend's default temperature.
    pub async fn summarize(&self, transcript: &Transcript) -> Result<Summary> {
        let request = format!(
            "Summarize the following conversation:\n{}",
            transcript.render()
        );
        let text = self
            .client
            .complete(&self.system_prompt, vec![Message::user(request)], None)
            .await?;

        let summary = match extract_marked(&text, SUMMARY_MARKER) {
            Ok(payload) => Summary {
                text: payload,
                marker_found: true,
            },
            Err(e) => {
                warn!(error = %e, "Unable to extract summary from response, using raw text");
                Summary {
                    text: text.trim().to_string(),
                    marker_found: false,
                }
            }
        };
        Ok(summary)
    }
}
