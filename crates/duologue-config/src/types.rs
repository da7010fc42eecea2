//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [llm]                    # default completion backend
//! [llm.summary]            # named LLM configs
//! [agent.summarizer]       # per-agent overrides
//! [embedding]              # embedding provider
//! [storage]                # summary database
//! [dialogue]               # personas and turn count
//! [logging]                # log file settings
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Agent name used by both dialogue personas.
pub const SPEAKER_AGENT: &str = "speaker";

/// Agent name used for theme generation.
pub const THEME_AGENT: &str = "theme";

/// Agent name used for conversation summarization.
pub const SUMMARIZER_AGENT: &str = "summarizer";

/// Profile name that refers to the bare `[llm]` section.
pub const DEFAULT_PROFILE: &str = "default";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DuologueConfig {
    /// Default LLM configuration (the bare `[llm]` section).
    pub llm: Option<LlmConfig>,

    /// Named LLM configurations (`[llm.summary]`, `[llm.fast]`, etc.).
    #[serde(default, rename = "llm_profiles")]
    pub llm_profiles: HashMap<String, LlmConfig>,

    /// Agent configurations keyed by agent name.
    #[serde(default)]
    pub agent: HashMap<String, AgentConfig>,

    /// Embedding provider configuration.
    pub embedding: Option<EmbeddingConfig>,

    /// Summary store configuration.
    pub storage: Option<StorageConfig>,

    /// Dialogue settings.
    pub dialogue: Option<DialogueConfig>,

    /// Log output configuration.
    pub logging: Option<LoggingConfig>,
}

impl DuologueConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        let raw: RawConfig = toml::from_str(toml_str)?;
        Ok(raw.into())
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        let raw: RawConfig = self.clone().into();
        Ok(toml::to_string_pretty(&raw)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: DuologueConfig) {
        if other.llm.is_some() {
            self.llm = other.llm;
        }

        for (name, config) in other.llm_profiles {
            self.llm_profiles.insert(name, config);
        }

        for (name, config) in other.agent {
            self.agent.insert(name, config);
        }

        if other.embedding.is_some() {
            self.embedding = other.embedding;
        }

        if other.storage.is_some() {
            self.storage = other.storage;
        }

        if other.dialogue.is_some() {
            self.dialogue = other.dialogue;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Resolve the LLM config for a given agent name.
    ///
    /// Resolution order:
    /// 1. `agent.<name>.llm` → lookup in `llm_profiles`
    /// 2. `agent.default.llm` → lookup in `llm_profiles`
    /// 3. `[llm]` (global default)
    ///
    /// Named profiles inherit unset fields from `[llm]`. With no `[llm]`
    /// section at all, the built-in local Ollama defaults apply.
    pub fn resolve_llm(&self, agent_name: &str) -> crate::Result<LlmConfig> {
        let base = self.llm.clone().unwrap_or_default();

        if let Some(agent_cfg) = self.agent.get(agent_name)
            && let Some(ref llm_name) = agent_cfg.llm
        {
            let profile = self.lookup_llm(llm_name, &format!("agent.{}", agent_name))?;
            return Ok(profile.layered_over(&base));
        }

        if let Some(default_cfg) = self.agent.get(DEFAULT_PROFILE)
            && let Some(ref llm_name) = default_cfg.llm
        {
            let profile = self.lookup_llm(llm_name, "agent.default")?;
            return Ok(profile.layered_over(&base));
        }

        Ok(base)
    }

    /// Look up a named LLM config. `"default"` names the bare `[llm]` section.
    fn lookup_llm(&self, name: &str, context: &str) -> crate::Result<LlmConfig> {
        if name == DEFAULT_PROFILE {
            return Ok(self.llm.clone().unwrap_or_default());
        }
        self.llm_profiles
            .get(name)
            .cloned()
            .ok_or_else(|| crate::ConfigError::LlmNotFound {
                name: name.to_string(),
                context: context.to_string(),
            })
    }

    /// Per-agent settings, falling back to an empty config.
    pub fn agent(&self, agent_name: &str) -> AgentConfig {
        self.agent.get(agent_name).cloned().unwrap_or_default()
    }

    /// Effective embedding settings.
    pub fn embedding(&self) -> EmbeddingConfig {
        self.embedding.clone().unwrap_or_default()
    }

    /// Effective storage settings.
    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    /// Effective dialogue settings.
    pub fn dialogue(&self) -> DialogueConfig {
        self.dialogue.clone().unwrap_or_default()
    }

    /// Effective logging settings.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> crate::Result<()> {
        self.dialogue().validate()?;
        self.storage().validate()?;

        let embedding = self.embedding();
        if embedding.effective_dimensions() == 0 {
            return Err(crate::ConfigError::InvalidValue {
                field: "embedding.dimensions".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        for name in [SPEAKER_AGENT, THEME_AGENT, SUMMARIZER_AGENT] {
            self.resolve_llm(name)?;
        }
        Ok(())
    }

    /// Get all defined LLM config names (including "default" for the bare [llm]).
    pub fn llm_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.llm.is_some() {
            names.push(DEFAULT_PROFILE.to_string());
        }
        names.extend(self.llm_profiles.keys().cloned());
        names.sort();
        names
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw TOML structure (for serde)
// ─────────────────────────────────────────────────────────────────────────────

/// Internal raw config matching the actual TOML layout.
///
/// In TOML, `[llm]` and `[llm.summary]` coexist as a table with both
/// direct keys and sub-tables. This struct handles that mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawConfig {
    llm: Option<RawLlmSection>,
    #[serde(default)]
    agent: HashMap<String, AgentConfig>,
    embedding: Option<EmbeddingConfig>,
    storage: Option<StorageConfig>,
    dialogue: Option<DialogueConfig>,
    logging: Option<LoggingConfig>,
}

/// The `[llm]` section which can contain both direct fields and named sub-tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawLlmSection {
    backend: Option<Backend>,
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    retry_max: Option<u32>,
    retry_backoff_ms: Option<u64>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,

    /// Named profiles are captured via flatten.
    #[serde(flatten)]
    profiles: HashMap<String, LlmConfig>,
}

impl RawLlmSection {
    fn has_direct_fields(&self) -> bool {
        self.backend.is_some()
            || self.model.is_some()
            || self.base_url.is_some()
            || self.api_key.is_some()
            || self.retry_max.is_some()
            || self.retry_backoff_ms.is_some()
            || self.timeout_secs.is_some()
            || self.max_tokens.is_some()
    }
}

impl From<RawConfig> for DuologueConfig {
    fn from(raw: RawConfig) -> Self {
        let (llm, llm_profiles) = match raw.llm {
            Some(section) => {
                let default = if section.has_direct_fields() {
                    Some(LlmConfig {
                        backend: section.backend,
                        model: section.model,
                        base_url: section.base_url,
                        api_key: section.api_key,
                        retry_max: section.retry_max,
                        retry_backoff_ms: section.retry_backoff_ms,
                        timeout_secs: section.timeout_secs,
                        max_tokens: section.max_tokens,
                    })
                } else {
                    None
                };
                (default, section.profiles)
            }
            None => (None, HashMap::new()),
        };

        DuologueConfig {
            llm,
            llm_profiles,
            agent: raw.agent,
            embedding: raw.embedding,
            storage: raw.storage,
            dialogue: raw.dialogue,
            logging: raw.logging,
        }
    }
}

impl From<DuologueConfig> for RawConfig {
    fn from(config: DuologueConfig) -> Self {
        let llm = if config.llm.is_some() || !config.llm_profiles.is_empty() {
            let default = config.llm.unwrap_or_default();
            Some(RawLlmSection {
                backend: default.backend,
                model: default.model,
                base_url: default.base_url,
                api_key: default.api_key,
                retry_max: default.retry_max,
                retry_backoff_ms: default.retry_backoff_ms,
                timeout_secs: default.timeout_secs,
                max_tokens: default.max_tokens,
                profiles: config.llm_profiles,
            })
        } else {
            None
        };

        RawConfig {
            llm,
            agent: config.agent,
            embedding: config.embedding,
            storage: config.storage,
            dialogue: config.dialogue,
            logging: config.logging,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default chat model served by a local Ollama instance.
pub const DEFAULT_CHAT_MODEL: &str = "gemma3:4b";

/// Configuration for an LLM backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider.
    pub backend: Option<Backend>,
    /// Model identifier.
    pub model: Option<String>,
    /// Custom API base URL (for proxies, custom endpoints).
    pub base_url: Option<String>,
    /// API key (prefer env var; warns if set here).
    pub api_key: Option<String>,
    /// Maximum retry attempts for transient failures. Default: 0.
    pub retry_max: Option<u32>,
    /// Backoff delay between retries in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Maximum tokens per completion.
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    /// Returns true if an API key is stored directly in the config file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fill unset fields from `base`.
    pub fn layered_over(&self, base: &LlmConfig) -> LlmConfig {
        LlmConfig {
            backend: self.backend.or(base.backend),
            model: self.model.clone().or_else(|| base.model.clone()),
            base_url: self.base_url.clone().or_else(|| base.base_url.clone()),
            api_key: self.api_key.clone().or_else(|| base.api_key.clone()),
            retry_max: self.retry_max.or(base.retry_max),
            retry_backoff_ms: self.retry_backoff_ms.or(base.retry_backoff_ms),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
            max_tokens: self.max_tokens.or(base.max_tokens),
        }
    }

    /// Backend, defaulting to a local Ollama instance.
    pub fn effective_backend(&self) -> Backend {
        self.backend.unwrap_or(Backend::Ollama)
    }

    /// Model identifier, defaulting to [`DEFAULT_CHAT_MODEL`].
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL)
    }

    /// Base URL, defaulting to the backend's public endpoint.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.effective_backend().default_base_url().to_string())
    }
}

/// Supported LLM backend providers.
///
/// All of them speak the OpenAI chat-completions wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Ollama,
    Openai,
    Groq,
    Custom,
}

impl Backend {
    /// Environment variable name for this backend's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Backend::Ollama => "OLLAMA_API_KEY",
            Backend::Openai => "OPENAI_API_KEY",
            Backend::Groq => "GROQ_API_KEY",
            Backend::Custom => "LLM_API_KEY",
        }
    }

    /// Whether requests must carry an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Backend::Openai | Backend::Groq)
    }

    /// Default API base URL.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::Ollama | Backend::Custom => "http://localhost:11434/v1",
            Backend::Openai => "https://api.openai.com/v1",
            Backend::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Ollama => "Ollama",
            Backend::Openai => "OpenAI",
            Backend::Groq => "Groq",
            Backend::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Per-agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Name of the LLM config to use (references a key in `llm_profiles`).
    pub llm: Option<String>,
    /// System prompt override.
    pub system_prompt: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Embedding provider configuration.
///
/// ```toml
/// [embedding]
/// provider = "openai"
/// dimensions = 768
///
/// [embedding.openai]
/// model = "nomic-embed-text"
/// base_url = "http://localhost:11434/v1"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider: "openai" (any OpenAI-compatible endpoint), "local" (ONNX), or "mock".
    pub provider: EmbeddingProvider,
    /// Output embedding dimensions. Default depends on provider.
    pub dimensions: Option<usize>,
    /// OpenAI-compatible endpoint settings.
    pub openai: Option<EmbeddingOpenAiConfig>,
    /// Local ONNX settings.
    pub local: Option<EmbeddingLocalConfig>,
}

impl EmbeddingConfig {
    /// Effective dimensions for the configured provider.
    pub fn effective_dimensions(&self) -> usize {
        if let Some(d) = self.dimensions {
            return d;
        }
        match self.provider {
            EmbeddingProvider::OpenAi => 768,
            EmbeddingProvider::Local => 384,
            EmbeddingProvider::Mock => 384,
        }
    }
}

/// Supported embedding providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint (default; Ollama serves one).
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// Local ONNX Runtime inference.
    Local,
    /// Mock embedder for testing.
    Mock,
}

/// OpenAI-compatible embedding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingOpenAiConfig {
    /// Model name. Default: "nomic-embed-text".
    pub model: String,
    /// Base URL. Default: local Ollama.
    pub base_url: String,
    /// API key (prefer `OPENAI_API_KEY`).
    pub api_key: Option<String>,
    /// Text prepended to inputs encoded as queries.
    pub query_prefix: String,
    /// Text prepended to inputs encoded as documents.
    pub document_prefix: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingOpenAiConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            query_prefix: "search_query: ".to_string(),
            document_prefix: "search_document: ".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Local ONNX embedding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingLocalConfig {
    /// Path to ONNX model file.
    pub model_path: Option<PathBuf>,
    /// Path to tokenizer.json file.
    pub tokenizer_path: Option<PathBuf>,
    /// Text prepended to inputs encoded as queries.
    pub query_prefix: Option<String>,
    /// Text prepended to inputs encoded as documents.
    pub document_prefix: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/dialogue.db";

/// Default summary table name.
pub const DEFAULT_TABLE: &str = "summaries";

/// Summary store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Summary table name.
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl StorageConfig {
    /// The table name is interpolated into SQL, so it must be a plain identifier.
    pub fn validate(&self) -> crate::Result<()> {
        let valid = !self.table.is_empty()
            && !self.table.starts_with(|c: char| c.is_ascii_digit())
            && self
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(crate::ConfigError::InvalidValue {
                field: "storage.table".to_string(),
                reason: format!("'{}' is not a valid SQL identifier", self.table),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dialogue Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default persona system prompt.
pub const DEFAULT_PERSONA_PROMPT: &str = "You are a conversation specialist. \
You are about to have a natural conversation. Keep your replies short and colloquial.";

/// Dialogue settings.
///
/// ```toml
/// [dialogue]
/// num_turns = 3
/// personas = ["A", "B"]
/// similar_limit = 3
/// recent_limit = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Rounds of conversation; each round is one utterance per persona.
    pub num_turns: u32,
    /// The two persona names. The first one opens the conversation.
    pub personas: Vec<String>,
    /// System prompt shared by both personas before the theme is appended.
    pub persona_prompt: String,
    /// Rows returned by the post-run similarity query.
    pub similar_limit: usize,
    /// Rows shown in the pre-run "recent summaries" preview.
    pub recent_limit: usize,
    /// Sampling temperature for theme generation.
    pub theme_temperature: f32,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            num_turns: 3,
            personas: vec!["A".to_string(), "B".to_string()],
            persona_prompt: DEFAULT_PERSONA_PROMPT.to_string(),
            similar_limit: 3,
            recent_limit: 3,
            theme_temperature: 2.0,
        }
    }
}

impl DialogueConfig {
    /// Validate persona names and counts.
    pub fn validate(&self) -> crate::Result<()> {
        if self.num_turns == 0 {
            return Err(crate::ConfigError::InvalidValue {
                field: "dialogue.num_turns".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.personas.len() != 2 {
            return Err(crate::ConfigError::InvalidValue {
                field: "dialogue.personas".to_string(),
                reason: format!("expected exactly 2 personas, got {}", self.personas.len()),
            });
        }
        if self.personas.iter().any(|p| p.trim().is_empty()) {
            return Err(crate::ConfigError::InvalidValue {
                field: "dialogue.personas".to_string(),
                reason: "persona names must not be empty".to_string(),
            });
        }
        if self.personas[0] == self.personas[1] {
            return Err(crate::ConfigError::InvalidValue {
                field: "dialogue.personas".to_string(),
                reason: "persona names must be distinct".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write a daily-rotated JSON log file in addition to the console.
    pub file: bool,
    /// Directory for log files. Default: `<config dir>/logs`.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            dir: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = DuologueConfig::new();
        assert!(config.llm.is_none());
        assert!(config.llm_profiles.is_empty());
        assert!(config.agent.is_empty());
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_parse_minimal() {
        let toml = r#"
[llm]
backend = "groq"
model = "llama-3.1-70b-versatile"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let llm = config.llm.as_ref().unwrap();
        assert_eq!(llm.backend, Some(Backend::Groq));
        assert_eq!(llm.model.as_deref(), Some("llama-3.1-70b-versatile"));
    }

    #[test]
    fn test_parse_named_profiles() {
        let toml = r#"
[llm]
backend = "ollama"
model = "gemma3:4b"

[llm.summary]
model = "gemma3:27b"

[llm.cloud]
backend = "openai"
model = "gpt-4o-mini"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        assert!(config.llm.is_some());
        assert_eq!(config.llm_profiles.len(), 2);
        assert_eq!(
            config.llm_profiles["summary"].model.as_deref(),
            Some("gemma3:27b")
        );
        assert_eq!(config.llm_profiles["cloud"].backend, Some(Backend::Openai));
    }

    #[test]
    fn test_resolve_llm_agent_specific_inherits_base() {
        let toml = r#"
[llm]
backend = "ollama"
model = "gemma3:4b"
base_url = "http://gpu-box:11434/v1"

[llm.summary]
model = "gemma3:27b"

[agent.summarizer]
llm = "summary"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let resolved = config.resolve_llm(SUMMARIZER_AGENT).unwrap();
        assert_eq!(resolved.model.as_deref(), Some("gemma3:27b"));
        assert_eq!(resolved.base_url.as_deref(), Some("http://gpu-box:11434/v1"));
        assert_eq!(resolved.effective_backend(), Backend::Ollama);
    }

    #[test]
    fn test_resolve_llm_agent_default() {
        let toml = r#"
[llm]
model = "default-model"

[llm.fast]
model = "fast-model"

[agent.default]
llm = "fast"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let resolved = config.resolve_llm(THEME_AGENT).unwrap();
        assert_eq!(resolved.model.as_deref(), Some("fast-model"));
    }

    #[test]
    fn test_resolve_llm_default_profile_name() {
        let toml = r#"
[llm]
model = "base-model"

[agent.speaker]
llm = "default"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let resolved = config.resolve_llm(SPEAKER_AGENT).unwrap();
        assert_eq!(resolved.model.as_deref(), Some("base-model"));
    }

    #[test]
    fn test_resolve_llm_missing_profile() {
        let toml = r#"
[agent.summarizer]
llm = "nonexistent"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let err = config.resolve_llm(SUMMARIZER_AGENT).unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
        assert!(err.to_string().contains("agent.summarizer"));
    }

    #[test]
    fn test_resolve_llm_without_any_config() {
        let config = DuologueConfig::new();
        let resolved = config.resolve_llm(SPEAKER_AGENT).unwrap();
        assert_eq!(resolved.effective_backend(), Backend::Ollama);
        assert_eq!(resolved.effective_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(resolved.effective_base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_merge_overrides_sections() {
        let mut base = DuologueConfig::from_toml(
            r#"
[llm]
model = "base"

[storage]
path = "base.db"
"#,
        )
        .unwrap();
        let overlay = DuologueConfig::from_toml(
            r#"
[storage]
path = "overlay.db"

[dialogue]
num_turns = 5
"#,
        )
        .unwrap();

        base.merge(overlay);
        assert_eq!(base.llm.as_ref().unwrap().model.as_deref(), Some("base"));
        assert_eq!(base.storage().path, PathBuf::from("overlay.db"));
        assert_eq!(base.dialogue().num_turns, 5);
    }

    #[test]
    fn test_roundtrip_preserves_profiles() {
        let toml = r#"
[llm]
model = "gemma3:4b"

[llm.summary]
model = "gemma3:27b"
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let serialized = config.to_toml().unwrap();
        let reparsed = DuologueConfig::from_toml(&serialized).unwrap();
        assert_eq!(reparsed.llm, config.llm);
        assert_eq!(reparsed.llm_profiles, config.llm_profiles);
    }

    #[test]
    fn test_dialogue_defaults() {
        let dialogue = DialogueConfig::default();
        assert_eq!(dialogue.num_turns, 3);
        assert_eq!(dialogue.personas, vec!["A", "B"]);
        assert_eq!(dialogue.similar_limit, 3);
        assert!(dialogue.validate().is_ok());
    }

    #[test]
    fn test_dialogue_rejects_bad_personas() {
        let mut dialogue = DialogueConfig::default();
        dialogue.personas = vec!["A".to_string()];
        assert!(dialogue.validate().is_err());

        dialogue.personas = vec!["A".to_string(), "A".to_string()];
        assert!(dialogue.validate().is_err());

        dialogue.personas = vec!["A".to_string(), " ".to_string()];
        assert!(dialogue.validate().is_err());
    }

    #[test]
    fn test_dialogue_rejects_zero_turns() {
        let dialogue = DialogueConfig {
            num_turns: 0,
            ..Default::default()
        };
        assert!(dialogue.validate().is_err());
    }

    #[test]
    fn test_storage_table_must_be_identifier() {
        let mut storage = StorageConfig::default();
        assert!(storage.validate().is_ok());

        storage.table = "summaries; DROP TABLE x".to_string();
        assert!(storage.validate().is_err());

        storage.table = "1abc".to_string();
        assert!(storage.validate().is_err());

        storage.table = "chat_summaries_v2".to_string();
        assert!(storage.validate().is_ok());
    }

    #[test]
    fn test_embedding_defaults() {
        let embedding = EmbeddingConfig::default();
        assert_eq!(embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(embedding.effective_dimensions(), 768);

        let toml = r#"
[embedding]
provider = "mock"
dimensions = 16
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let embedding = config.embedding();
        assert_eq!(embedding.provider, EmbeddingProvider::Mock);
        assert_eq!(embedding.effective_dimensions(), 16);
    }

    #[test]
    fn test_embedding_openai_section() {
        let toml = r#"
[embedding]
provider = "openai"
dimensions = 2048

[embedding.openai]
model = "plamo-embedding"
query_prefix = ""
"#;
        let config = DuologueConfig::from_toml(toml).unwrap();
        let openai = config.embedding().openai.unwrap();
        assert_eq!(openai.model, "plamo-embedding");
        assert_eq!(openai.query_prefix, "");
        assert_eq!(openai.document_prefix, "search_document: ");
        assert_eq!(openai.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_validate_full_config() {
        let config = DuologueConfig::from_toml(
            r#"
[embedding]
provider = "mock"
dimensions = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
        assert!(DuologueConfig::new().validate().is_ok());
    }

    #[test]
    fn test_backend_defaults() {
        assert_eq!(Backend::Openai.env_var(), "OPENAI_API_KEY");
        assert!(Backend::Groq.requires_api_key());
        assert!(!Backend::Ollama.requires_api_key());
        assert!(Backend::Groq.default_base_url().contains("groq.com"));
        assert_eq!(Backend::Ollama.to_string(), "Ollama");
    }
}
