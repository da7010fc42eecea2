//! Model completion client bound to one model reference.
//!
//! [`LlmClient`] pairs a [`SharedBackend`] with a model name and turns
//! `(system prompt, messages, temperature)` into the text of one completion.
//! Several clients can share one backend, e.g. a small chat model and a
//! larger summary model on the same Ollama instance.

use std::sync::Arc;

use crate::backend::{LlmBackend, SharedBackend};
use crate::error::Result;
use crate::types::{CompletionRequest, Message, Role};

/// A completion client for a single model.
#[derive(Clone)]
pub struct LlmClient {
    backend: SharedBackend,
    model: String,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmClient {
    /// Create a client for `model` on `backend`.
    pub fn new(backend: SharedBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens: None,
        }
    }

    /// Wrap a concrete backend.
    pub fn from_backend(backend: impl LlmBackend + 'static, model: impl Into<String>) -> Self {
        Self::new(Arc::new(backend), model)
    }

    /// Cap the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The model this client requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The underlying backend.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Run one completion and return its text.
    ///
    /// Backend errors propagate unchanged.
    pub async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        temperature: Option<f32>,
    ) -> Result<String> {
        let mut request = CompletionRequest::new(self.model.clone(), messages);
        if !system.is_empty() {
            request = request.with_system(system);
        }
        request.temperature = temperature;
        request.max_tokens = self.max_tokens;

        tracing::debug!(
            backend = %self.backend.name(),
            model = %self.model,
            messages = request.messages.len(),
            "Requesting completion"
        );

        let response = self.backend.complete(request).await?;
        Ok(response.text)
    }
}

/// Tag a chronological list of `(speaker, text)` turns from one speaker's
/// point of view: that speaker's own turns become assistant messages, every
/// other speaker's become user messages.
pub fn tag_turns<'a, I>(own_speaker: &str, turns: I) -> Vec<Message>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    turns
        .into_iter()
        .map(|(speaker, text)| Message {
            role: if speaker == own_speaker {
                Role::Assistant
            } else {
                Role::User
            },
            content: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::LlmError;

    #[tokio::test]
    async fn test_complete_returns_text_and_shapes_request() {
        let mock = Arc::new(MockBackend::with_text("hello back"));
        let client = LlmClient::new(mock.clone(), "gemma3:4b").with_max_tokens(Some(128));

        let text = client
            .complete("be nice", vec![Message::user("hello")], Some(0.7))
            .await
            .unwrap();
        assert_eq!(text, "hello back");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemma3:4b");
        assert_eq!(requests[0].system.as_deref(), Some("be nice"));
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].max_tokens, Some(128));
    }

    #[tokio::test]
    async fn test_empty_system_prompt_is_omitted() {
        let mock = Arc::new(MockBackend::with_text("ok"));
        let client = LlmClient::new(mock.clone(), "m");
        client.complete("", vec![], None).await.unwrap();
        assert!(mock.requests()[0].system.is_none());
        assert!(mock.requests()[0].temperature.is_none());
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let client = LlmClient::from_backend(MockBackend::new(vec![]), "m");
        let err = client.complete("s", vec![], None).await.unwrap_err();
        assert!(matches!(err, LlmError::Backend(_)));
    }

    #[test]
    fn test_tag_turns_by_speaker() {
        let turns = [("A", "hi"), ("B", "hello"), ("A", "how are you")];
        let tagged = tag_turns("A", turns);
        assert_eq!(
            tagged.iter().map(|m| m.role).collect::<Vec<_>>(),
            vec![Role::Assistant, Role::User, Role::Assistant]
        );

        let tagged = tag_turns("B", turns);
        assert_eq!(tagged[0].role, Role::User);
        assert_eq!(tagged[1].role, Role::Assistant);
        assert_eq!(tagged[2].content, "how are you");
    }

    #[test]
    fn test_tag_turns_empty() {
        assert!(tag_turns("A", std::iter::empty()).is_empty());
    }

    #[test]
    fn test_debug_hides_backend_internals() {
        let client = LlmClient::from_backend(MockBackend::new(vec![]), "m");
        let debug = format!("{:?}", client);
        assert!(debug.contains("mock"));
        assert!(debug.contains("\"m\""));
    }
}
