//! API key resolution.
//!
//! Resolution order:
//! 1. Environment variable (backend-specific)
//! 2. Config file (with warning at load time)

use crate::Backend;

/// Result of API key resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve an API key for a backend.
pub fn resolve_api_key(backend: &Backend, config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_from_env(backend.env_var(), config_value)
}

/// Resolve a secret from a named environment variable, falling back to the
/// config value. Empty values are treated as unset.
pub fn resolve_from_env(env_var: &str, config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(env_var.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_value_fallback() {
        let resolved =
            resolve_from_env("DUOLOGUE_TEST_UNSET_KEY_1", Some("from-config")).unwrap();
        assert_eq!(resolved.value, "from-config");
        assert_eq!(resolved.source, SecretSource::ConfigFile);
    }

    #[test]
    fn test_nothing_resolves_to_none() {
        assert!(resolve_from_env("DUOLOGUE_TEST_UNSET_KEY_2", None).is_none());
        assert!(resolve_from_env("DUOLOGUE_TEST_UNSET_KEY_2", Some("")).is_none());
    }

    #[test]
    fn test_env_var_wins() {
        // PATH is always set in test environments.
        let resolved = resolve_from_env("PATH", Some("from-config")).unwrap();
        assert_ne!(resolved.value, "from-config");
        assert_eq!(resolved.source, SecretSource::EnvVar("PATH".to_string()));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(
            SecretSource::EnvVar("GROQ_API_KEY".to_string()).to_string(),
            "env var GROQ_API_KEY"
        );
        assert_eq!(SecretSource::ConfigFile.to_string(), "config file (plaintext)");
    }
}
