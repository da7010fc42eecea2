//! Conversation state: turns, transcripts and personas.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Turns
// ─────────────────────────────────────────────────────────────────────────────

/// One utterance in the dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Name of the persona that spoke.
    pub speaker: String,
    /// What they said.
    pub text: String,
    /// Zero-based position in the transcript.
    pub index: usize,
}

/// Append-only, chronologically ordered list of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn; its index is the current length.
    pub fn push(&mut self, speaker: impl Into<String>, text: impl Into<String>) -> &ConversationTurn {
        let index = self.turns.len();
        self.turns.push(ConversationTurn {
            speaker: speaker.into(),
            text: text.into(),
            index,
        });
        &self.turns[index]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns as `(speaker, text)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.turns
            .iter()
            .map(|t| (t.speaker.as_str(), t.text.as_str()))
    }

    /// Render as `[speaker]: text` lines for the summarizer.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("[{}]: {}", t.speaker, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Personas
// ─────────────────────────────────────────────────────────────────────────────

/// A named, model-backed conversational role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialoguePersona {
    pub name: String,
    pub system_prompt: String,
    /// Model the persona speaks through.
    pub model: String,
    #[serde(default)]
    themed: bool,
}

impl DialoguePersona {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model: model.into(),
            themed: false,
        }
    }

    /// Extend the system prompt with the session theme.
    ///
    /// Only the first call has an effect; a persona is themed at most once.
    pub fn with_theme(mut self, theme: &str) -> Self {
        if self.themed {
            tracing::debug!(persona = %self.name, "Persona already themed, ignoring");
            return self;
        }
        self.system_prompt = format!(
            "{} The theme is \"{}\". Keep the conversation on this theme.",
            self.system_prompt.trim_end(),
            theme
        );
        self.themed = true;
        self
    }

    /// Whether [`with_theme`](Self::with_theme) has been applied.
    pub fn is_themed(&self) -> bool {
        self.themed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_indices_are_sequential() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());
        transcript.push("A", "hello");
        let turn = transcript.push("B", "hi there");
        assert_eq!(turn.index, 1);
        assert_eq!(transcript.len(), 2);
        assert_eq!(
            transcript.pairs().collect::<Vec<_>>(),
            vec![("A", "hello"), ("B", "hi there")]
        );
    }

    #[test]
    fn test_transcript_render() {
        let mut transcript = Transcript::new();
        transcript.push("A", "Tea?");
        transcript.push("B", "Always.");
        assert_eq!(transcript.render(), "[A]: Tea?\n[B]: Always.");
        assert_eq!(Transcript::new().render(), "");
    }

    #[test]
    fn test_persona_themed_once() {
        let persona = DialoguePersona::new("A", "Be brief.", "gemma3:4b")
            .with_theme("moon gardening")
            .with_theme("ignored");
        assert!(persona.is_themed());
        assert!(persona.system_prompt.starts_with("Be brief."));
        assert!(persona.system_prompt.contains("moon gardening"));
        assert!(!persona.system_prompt.contains("ignored"));
    }
}
