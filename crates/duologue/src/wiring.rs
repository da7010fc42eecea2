//! Turn configuration into backends, embedders and stores.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use duologue_config::{Backend, EmbeddingConfig, EmbeddingProvider, LlmConfig, StorageConfig};
use duologue_llm::{EmbedderSpec, LlmClient, OpenAiBackend, OpenAiConfig, SharedBackend, SharedEmbedder};
use duologue_memory::SummaryStore;

/// Default initial backoff when `retry_max` is set without `retry_backoff_ms`.
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Create a completion backend for a resolved LLM config.
pub fn create_backend(llm: &LlmConfig) -> Result<SharedBackend> {
    let backend = llm.effective_backend();
    let api_key = duologue_config::resolve_api_key(&backend, llm.api_key.as_deref());

    if backend.requires_api_key() && api_key.is_none() {
        anyhow::bail!(
            "{} API key required. Set {} or add api_key to the [llm] config",
            backend,
            backend.env_var()
        );
    }
    if let Some(ref secret) = api_key {
        tracing::debug!(backend = %backend, source = %secret.source, "Resolved API key");
    }

    let base = match backend {
        Backend::Ollama | Backend::Custom => OpenAiConfig::ollama(),
        Backend::Openai | Backend::Groq => OpenAiConfig::openai(""),
    };
    let mut config = base
        .with_name(backend.display_name().to_lowercase())
        .with_api_key(api_key.map(|s| s.value))
        .with_base_url(llm.effective_base_url())
        .with_retries(
            llm.retry_max.unwrap_or(0),
            Duration::from_millis(llm.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS)),
        );
    if let Some(secs) = llm.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    Ok(Arc::new(OpenAiBackend::new(config)?))
}

/// Create a client for `llm`'s model on a fresh backend.
pub fn create_client(llm: &LlmConfig) -> Result<LlmClient> {
    let backend = create_backend(llm)?;
    Ok(LlmClient::new(backend, llm.effective_model()).with_max_tokens(llm.max_tokens))
}

/// Map the embedding config onto a provider-agnostic spec.
pub fn embedder_spec(config: &EmbeddingConfig) -> EmbedderSpec {
    let dimensions = config.effective_dimensions();
    match config.provider {
        EmbeddingProvider::OpenAi => {
            let openai = config.openai.clone().unwrap_or_default();
            let api_key = duologue_config::resolve_api_key(&Backend::Openai, openai.api_key.as_deref())
                .map(|s| s.value);
            EmbedderSpec {
                provider: "openai".to_string(),
                dimensions,
                openai_model: Some(openai.model),
                openai_base_url: Some(openai.base_url),
                openai_api_key: api_key,
                timeout: Some(Duration::from_secs(openai.timeout_secs)),
                query_prefix: openai.query_prefix,
                document_prefix: openai.document_prefix,
                ..Default::default()
            }
        }
        EmbeddingProvider::Local => {
            let local = config.local.clone().unwrap_or_default();
            EmbedderSpec {
                provider: "local".to_string(),
                dimensions,
                local_model_path: local.model_path,
                local_tokenizer_path: local.tokenizer_path,
                query_prefix: local.query_prefix.unwrap_or_default(),
                document_prefix: local.document_prefix.unwrap_or_default(),
                ..Default::default()
            }
        }
        EmbeddingProvider::Mock => EmbedderSpec {
            provider: "mock".to_string(),
            dimensions,
            ..Default::default()
        },
    }
}

/// Build the configured embedder. Failure here is fatal.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<SharedEmbedder> {
    let spec = embedder_spec(config);
    let embedder = duologue_llm::build_embedder(&spec)
        .with_context(|| format!("failed to initialize '{}' embedder", spec.provider))?;
    tracing::info!(
        provider = %spec.provider,
        dimensions = embedder.dimensions(),
        "Embedder ready"
    );
    Ok(embedder)
}

/// Open the summary store and make sure its table exists.
pub fn open_store(storage: &StorageConfig, db: Option<&Path>, dimensions: usize) -> Result<SummaryStore> {
    let path = db.unwrap_or(storage.path.as_path());
    let store = SummaryStore::open(path, dimensions)
        .with_context(|| format!("failed to open database {}", path.display()))?
        .with_table(storage.table.clone())?;
    store.ensure_table()?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duologue_config::EmbeddingOpenAiConfig;
    use duologue_llm::LlmBackend;

    #[test]
    fn test_ollama_backend_needs_no_key() {
        let llm = LlmConfig {
            backend: Some(Backend::Ollama),
            ..Default::default()
        };
        let backend = create_backend(&llm).unwrap();
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn test_custom_backend_uses_configured_url() {
        let llm = LlmConfig {
            backend: Some(Backend::Custom),
            base_url: Some("http://127.0.0.1:9999/v1".to_string()),
            model: Some("tiny".to_string()),
            max_tokens: Some(32),
            ..Default::default()
        };
        let client = create_client(&llm).unwrap();
        assert_eq!(client.model(), "tiny");
        assert_eq!(client.backend().name(), "custom");
    }

    #[test]
    fn test_openai_embedder_spec_carries_prefixes() {
        let config = EmbeddingConfig {
            dimensions: Some(2048),
            openai: Some(EmbeddingOpenAiConfig::default()),
            ..Default::default()
        };
        let spec = embedder_spec(&config);
        assert_eq!(spec.provider, "openai");
        assert_eq!(spec.dimensions, 2048);
        assert_eq!(spec.openai_model.as_deref(), Some("nomic-embed-text"));
        assert_eq!(spec.query_prefix, "search_query: ");
        assert_eq!(spec.document_prefix, "search_document: ");
    }

    #[test]
    fn test_mock_embedder_from_config() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Mock,
            dimensions: Some(16),
            ..Default::default()
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.dimensions(), 16);
    }

    #[test]
    fn test_zero_dimensions_fail() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Mock,
            dimensions: Some(0),
            ..Default::default()
        };
        assert!(create_embedder(&config).is_err());
    }

    #[test]
    fn test_open_store_with_override_path() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("custom.db");
        let store = open_store(&StorageConfig::default(), Some(&db), 4).unwrap();
        assert_eq!(store.table(), "summaries");
        assert_eq!(store.count().unwrap(), 0);
        assert!(db.exists());
    }
}
