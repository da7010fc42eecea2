//! Embeddings for summary storage and similarity search.
//!
//! This module provides the [`Embedder`] trait and implementations for
//! generating fixed-length vector embeddings from text. Query and document
//! encodings are distinct operations so that asymmetric models (which
//! expect different input prefixes for each side) can be used.
//!
//! # Implementations
//!
//! - [`MockEmbedder`]: Returns deterministic embeddings for testing
//! - [`OpenAiEmbedder`]: Any OpenAI-compatible `/embeddings` endpoint (Ollama included)
//! - [`LocalEmbedder`](local::LocalEmbedder): ONNX Runtime inference (requires `local-embeddings` feature)

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Which side of an asymmetric embedding space a text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// A search query.
    Query,
    /// A document to be stored and searched over.
    Document,
}

/// Trait for generating text embeddings.
///
/// Implementors provide [`embed`](Embedder::embed); callers use
/// [`encode_query`](Embedder::encode_query) and
/// [`encode_document`](Embedder::encode_document), which reject any vector
/// whose length differs from [`dimensions`](Embedder::dimensions).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate a raw embedding for `text` in the given mode.
    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<Vec<f32>>;

    /// Get the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Get the name of this embedder.
    fn name(&self) -> &str;

    /// Encode a search query.
    async fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
        let v = self.embed(text, EmbeddingMode::Query).await?;
        check_dimensions(self.dimensions(), v)
    }

    /// Encode a document for storage.
    async fn encode_document(&self, text: &str) -> Result<Vec<f32>> {
        let v = self.embed(text, EmbeddingMode::Document).await?;
        check_dimensions(self.dimensions(), v)
    }
}

/// A shared embedder that can be used across threads.
pub type SharedEmbedder = Arc<dyn Embedder>;

fn check_dimensions(expected: usize, v: Vec<f32>) -> Result<Vec<f32>> {
    if v.len() != expected {
        return Err(LlmError::DimensionMismatch {
            expected,
            actual: v.len(),
        });
    }
    Ok(v)
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// A mock embedder for testing purposes.
///
/// Generates deterministic unit-length embeddings based on text content.
/// Query and document encodings of the same text are identical, so a
/// document is always its own nearest neighbour.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
    /// Length actually produced; differs from `dimensions` only when
    /// simulating a misbehaving provider.
    produced: usize,
}

impl MockEmbedder {
    /// Create a new mock embedder with the specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            produced: dimensions,
        }
    }

    /// A mock that advertises `dimensions` but returns vectors of `produced` length.
    pub fn misreporting(dimensions: usize, produced: usize) -> Self {
        Self {
            dimensions,
            produced,
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str, _mode: EmbeddingMode) -> Result<Vec<f32>> {
        let mut state = simple_hash(text);
        let mut embedding = Vec::with_capacity(self.produced);
        for _ in 0..self.produced {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            embedding.push(((state >> 16) as u16 as f32 / 32768.0) - 1.0);
        }
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// djb2 hash for deterministic embedding generation.
fn simple_hash(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    hash
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    /// API key (optional for local servers).
    pub api_key: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Model to use for embeddings.
    pub model: String,
    /// Expected output dimensions.
    pub dimensions: usize,
    /// Prepended to query inputs.
    pub query_prefix: String,
    /// Prepended to document inputs.
    pub document_prefix: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiEmbedderConfig {
    /// Config for `model` producing `dimensions`-length vectors on a local Ollama.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            api_key: None,
            base_url: "http://localhost:11434/v1".to_string(),
            model: model.into(),
            dimensions,
            query_prefix: String::new(),
            document_prefix: String::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_prefixes(mut self, query: impl Into<String>, document: impl Into<String>) -> Self {
        self.query_prefix = query.into();
        self.document_prefix = document.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn prefixed(&self, text: &str, mode: EmbeddingMode) -> String {
        let prefix = match mode {
            EmbeddingMode::Query => &self.query_prefix,
            EmbeddingMode::Document => &self.document_prefix,
        };
        format!("{}{}", prefix, text)
    }
}

/// OpenAI-compatible embeddings API client.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    /// Create a new embedder. Fails if the HTTP client cannot be built or the
    /// configured dimension is zero.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        if config.dimensions == 0 {
            return Err(LlmError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: vec![self.config.prefixed(text, mode)],
        };

        tracing::debug!(
            model = %self.config.model,
            ?mode,
            chars = text.len(),
            "Requesting embedding"
        );

        let mut builder = self
            .client
            .post(self.embeddings_url())
            .header("Content-Type", "application/json");
        if let Some(ref key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Backend(format!(
                "Embedding request failed: HTTP {} - {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse response: {}", e)))?;

        result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::Backend("No embedding returned".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, serde::Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, serde::Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Local Embedder (ONNX Runtime)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "local-embeddings")]
pub mod local {
    //! Local embeddings using ONNX Runtime.
    //!
    //! Requires the `local-embeddings` feature. The model must take
    //! `input_ids` and `attention_mask` (and optionally `token_type_ids`) and
    //! return token-level hidden states as its first output; sentence
    //! vectors are mean-pooled over the attention mask and L2-normalized.

    use super::*;
    use ort::session::Session;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use std::path::Path;
    use tokenizers::Tokenizer;

    /// Local embedder using ONNX Runtime.
    pub struct LocalEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        dimensions: usize,
        query_prefix: String,
        document_prefix: String,
        uses_token_types: bool,
    }

    impl LocalEmbedder {
        /// Load a local embedder from model files.
        ///
        /// Fails if either file is missing or cannot be loaded.
        pub fn load(
            model_path: impl AsRef<Path>,
            tokenizer_path: impl AsRef<Path>,
            dimensions: usize,
        ) -> Result<Self> {
            let session = Session::builder()
                .map_err(|e| LlmError::Internal(format!("Failed to create ONNX session: {}", e)))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| {
                    LlmError::Internal(format!("Failed to set optimization level: {}", e))
                })?
                .commit_from_file(model_path.as_ref())
                .map_err(|e| {
                    LlmError::Config(format!(
                        "Failed to load ONNX model from {:?}: {}",
                        model_path.as_ref(),
                        e
                    ))
                })?;

            let tokenizer = Tokenizer::from_file(tokenizer_path.as_ref()).map_err(|e| {
                LlmError::Config(format!(
                    "Failed to load tokenizer from {:?}: {}",
                    tokenizer_path.as_ref(),
                    e
                ))
            })?;

            let uses_token_types = session
                .inputs
                .iter()
                .any(|input| input.name == "token_type_ids");

            tracing::info!(
                model = %model_path.as_ref().display(),
                dimensions,
                "Loaded local embedding model"
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                dimensions,
                query_prefix: String::new(),
                document_prefix: String::new(),
                uses_token_types,
            })
        }

        /// Set the prefixes prepended to query and document inputs.
        pub fn with_prefixes(
            mut self,
            query: impl Into<String>,
            document: impl Into<String>,
        ) -> Self {
            self.query_prefix = query.into();
            self.document_prefix = document.into();
            self
        }

        fn run(&self, text: &str) -> Result<Vec<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| LlmError::Internal(format!("Tokenization failed: {}", e)))?;

            let ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&x| x as i64)
                .collect();
            let types: Vec<i64> = encoding.get_type_ids().iter().map(|&x| x as i64).collect();
            let seq_len = ids.len();

            let tensor = |data: Vec<i64>| {
                Tensor::from_array(([1usize, seq_len], data))
                    .map_err(|e| LlmError::Internal(format!("Input error: {}", e)))
            };

            let mut session = self.session.lock();
            let outputs = if self.uses_token_types {
                session.run(ort::inputs![
                    "input_ids" => tensor(ids)?,
                    "attention_mask" => tensor(mask.clone())?,
                    "token_type_ids" => tensor(types)?,
                ])
            } else {
                session.run(ort::inputs![
                    "input_ids" => tensor(ids)?,
                    "attention_mask" => tensor(mask.clone())?,
                ])
            }
            .map_err(|e| LlmError::Internal(format!("ONNX inference failed: {}", e)))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| LlmError::Internal(format!("Output extraction failed: {}", e)))?;

            // (1, seq_len, hidden_dim)
            if shape.len() != 3 {
                return Err(LlmError::Internal(format!(
                    "Unexpected output rank {}",
                    shape.len()
                )));
            }
            let hidden_dim = shape[2] as usize;
            let out_len = shape[1] as usize;

            let mut pooled = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;
            for (j, &m) in mask.iter().enumerate().take(out_len) {
                if m > 0 {
                    let row = &data[j * hidden_dim..(j + 1) * hidden_dim];
                    for (acc, v) in pooled.iter_mut().zip(row) {
                        *acc += v;
                    }
                    count += 1.0;
                }
            }
            if count > 0.0 {
                for v in &mut pooled {
                    *v /= count;
                }
            }
            l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }

    #[async_trait]
    impl Embedder for LocalEmbedder {
        async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<Vec<f32>> {
            let prefix = match mode {
                EmbeddingMode::Query => &self.query_prefix,
                EmbeddingMode::Document => &self.document_prefix,
            };
            self.run(&format!("{}{}", prefix, text))
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn name(&self) -> &str {
            "local"
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Provider-agnostic description of an embedder, populated by the binary
/// from its configuration.
#[derive(Debug, Clone, Default)]
pub struct EmbedderSpec {
    /// Provider name: "openai", "local", or "mock".
    pub provider: String,
    /// Output dimensions.
    pub dimensions: usize,
    /// Model name for the OpenAI-compatible provider.
    pub openai_model: Option<String>,
    /// Base URL for the OpenAI-compatible provider.
    pub openai_base_url: Option<String>,
    /// API key for the OpenAI-compatible provider.
    pub openai_api_key: Option<String>,
    /// Request timeout for the OpenAI-compatible provider.
    pub timeout: Option<Duration>,
    /// Local ONNX model path.
    pub local_model_path: Option<std::path::PathBuf>,
    /// Local tokenizer.json path.
    pub local_tokenizer_path: Option<std::path::PathBuf>,
    /// Prepended to query inputs.
    pub query_prefix: String,
    /// Prepended to document inputs.
    pub document_prefix: String,
}

/// Build a `SharedEmbedder` from a spec.
///
/// There is no degraded mode: if the requested provider cannot be
/// constructed, this returns an error.
pub fn build_embedder(spec: &EmbedderSpec) -> Result<SharedEmbedder> {
    if spec.dimensions == 0 {
        return Err(LlmError::Config(
            "Embedding dimensions must be greater than zero".to_string(),
        ));
    }

    match spec.provider.as_str() {
        "openai" => {
            let model = spec.openai_model.clone().ok_or_else(|| {
                LlmError::Config("OpenAI embedding provider requires a model name".to_string())
            })?;
            let mut config = OpenAiEmbedderConfig::new(model, spec.dimensions)
                .with_api_key(spec.openai_api_key.clone())
                .with_prefixes(spec.query_prefix.clone(), spec.document_prefix.clone());
            if let Some(ref base_url) = spec.openai_base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(timeout) = spec.timeout {
                config = config.with_timeout(timeout);
            }
            Ok(Arc::new(OpenAiEmbedder::new(config)?))
        }
        #[cfg(feature = "local-embeddings")]
        "local" => {
            let (model_path, tokenizer_path) = local_model_paths(spec)?;
            let embedder = local::LocalEmbedder::load(&model_path, &tokenizer_path, spec.dimensions)?
                .with_prefixes(spec.query_prefix.clone(), spec.document_prefix.clone());
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "local-embeddings"))]
        "local" => Err(LlmError::Config(
            "Local embeddings requested but the 'local-embeddings' feature is not enabled"
                .to_string(),
        )),
        "mock" => Ok(Arc::new(MockEmbedder::new(spec.dimensions))),
        other => Err(LlmError::Config(format!(
            "Unknown embedding provider '{}'. Valid: openai, local, mock",
            other
        ))),
    }
}

/// Resolve model and tokenizer paths, falling back to the default model dir.
#[cfg(feature = "local-embeddings")]
fn local_model_paths(spec: &EmbedderSpec) -> Result<(std::path::PathBuf, std::path::PathBuf)> {
    if let (Some(model), Some(tokenizer)) = (&spec.local_model_path, &spec.local_tokenizer_path) {
        return Ok((model.clone(), tokenizer.clone()));
    }
    let dir = default_local_model_dir().ok_or_else(|| {
        LlmError::Config("No local model path configured and no data dir available".to_string())
    })?;
    let model = spec
        .local_model_path
        .clone()
        .unwrap_or_else(|| dir.join("model.onnx"));
    let tokenizer = spec
        .local_tokenizer_path
        .clone()
        .unwrap_or_else(|| dir.join("tokenizer.json"));
    if !model.exists() || !tokenizer.exists() {
        return Err(LlmError::Config(format!(
            "Local embedding model not found (expected {} and {})",
            model.display(),
            tokenizer.display()
        )));
    }
    Ok((model, tokenizer))
}

/// Default directory for local embedding model files.
pub fn default_local_model_dir() -> Option<std::path::PathBuf> {
    dirs::data_dir().map(|d| d.join("duologue").join("models").join("embeddings"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
