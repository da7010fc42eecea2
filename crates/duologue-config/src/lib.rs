//! Configuration system for the duologue dialogue pipeline.
//!
//! Provides TOML-based configuration with:
//! - Named LLM configurations (`[llm]`, `[llm.summary]`, etc.)
//! - Cascading agent-to-LLM binding (speaker, theme, summarizer)
//! - Config file layering (user config dir + project-local overrides)
//! - API key resolution (env var → config file)
//!
//! Every component receives its settings from these structs at construction
//! time; nothing reads process-wide state after the config is loaded.

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options, user_config_dir,
    user_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_api_key, resolve_from_env};
pub use types::*;
