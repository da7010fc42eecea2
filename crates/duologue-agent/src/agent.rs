//! A persona that speaks through a completion model.

use duologue_llm::{LlmClient, SharedBackend, tag_turns};

use crate::error::Result;
use crate::types::{DialoguePersona, Transcript};

/// Whether an agent is waiting on its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Speaking,
}

/// One side of the dialogue.
///
/// Holds no conversation memory of its own: every call to
/// [`chat`](Self::chat) receives the full transcript.
#[derive(Debug)]
pub struct DialogueAgent {
    persona: DialoguePersona,
    client: LlmClient,
    temperature: Option<f32>,
    state: AgentState,
}

impl DialogueAgent {
    /// Create an agent that speaks through `persona.model` on `backend`.
    pub fn new(persona: DialoguePersona, backend: SharedBackend) -> Self {
        let client = LlmClient::new(backend, persona.model.clone());
        Self {
            persona,
            client,
            temperature: None,
            state: AgentState::Idle,
        }
    }

    /// Override the sampling temperature (backend default otherwise).
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn persona(&self) -> &DialoguePersona {
        &self.persona
    }

    pub fn name(&self) -> &str {
        &self.persona.name
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Produce the next utterance given everything said so far.
    ///
    /// The agent's own turns are sent as assistant messages and the other
    /// persona's as user messages. An empty transcript yields an opening
    /// line from the persona prompt alone.
    pub async fn chat(&mut self, transcript: &Transcript) -> Result<String> {
        let messages = tag_turns(&self.persona.name, transcript.pairs());

        self.state = AgentState::Speaking;
        tracing::debug!(
            persona = %self.persona.name,
            history = messages.len(),
            "Agent speaking"
        );
        let result = self
            .client
            .complete(&self.persona.system_prompt, messages, self.temperature)
            .await;
        self.state = AgentState::Idle;

        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duologue_llm::{MockBackend, MockResponse, Role};
    use std::sync::Arc;

    fn persona(name: &str) -> DialoguePersona {
        DialoguePersona::new(name, "Keep it short.", "chat-model")
    }

    #[tokio::test]
    async fn test_opening_line_from_empty_transcript() {
        let mock = Arc::new(MockBackend::with_text("Hi! Lovely day."));
        let mut agent = DialogueAgent::new(persona("A"), mock.clone());

        let reply = agent.chat(&Transcript::new()).await.unwrap();
        assert_eq!(reply, "Hi! Lovely day.");
        assert_eq!(agent.state(), AgentState::Idle);

        let request = &mock.requests()[0];
        assert!(request.messages.is_empty());
        assert_eq!(request.system.as_deref(), Some("Keep it short."));
        assert_eq!(request.model, "chat-model");
    }

    #[tokio::test]
    async fn test_own_turns_are_assistant_messages() {
        let mock = Arc::new(MockBackend::with_text("Indeed."));
        let mut agent = DialogueAgent::new(persona("B"), mock.clone());

        let mut transcript = Transcript::new();
        transcript.push("A", "Hello");
        transcript.push("B", "Hi");
        transcript.push("A", "Nice weather");
        agent.chat(&transcript).await.unwrap();

        let roles: Vec<Role> = mock.requests()[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[tokio::test]
    async fn test_error_returns_agent_to_idle() {
        let mock = Arc::new(MockBackend::new(vec![MockResponse::Error("offline".into())]));
        let mut agent = DialogueAgent::new(persona("A"), mock);
        assert!(agent.chat(&Transcript::new()).await.is_err());
        assert_eq!(agent.state(), AgentState::Idle);
    }

    #[tokio::test]
    async fn test_temperature_forwarded() {
        let mock = Arc::new(MockBackend::with_text("ok"));
        let mut agent = DialogueAgent::new(persona("A"), mock.clone()).with_temperature(Some(0.3));
        agent.chat(&Transcript::new()).await.unwrap();
        assert_eq!(mock.requests()[0].temperature, Some(0.3));
    }
}
