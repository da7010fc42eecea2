//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `$DUOLOGUE_CONFIG_DIR/config.toml`, else the platform config dir
//! 2. `./duologue.toml` (project-local)
//! 3. CLI arguments (handled by the binary)

use std::path::{Path, PathBuf};

use crate::{ConfigError, DuologueConfig, Result};

/// Project-local config filename.
const PROJECT_CONFIG_FILE: &str = "duologue.toml";

/// Config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for platform directory resolution.
const APP_NAME: &str = "duologue";

/// Environment variable overriding the user config directory.
const CONFIG_DIR_ENV: &str = "DUOLOGUE_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: DuologueConfig,
    /// Sources that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (malformed files, plaintext keys).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge the user and project config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `DUOLOGUE_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = DuologueConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    check_plaintext_keys(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DuologueConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DuologueConfig::from_toml(&contents)
}

/// Path of the user config file.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory.
///
/// Checks `DUOLOGUE_CONFIG_DIR` first, then falls back to the platform
/// default (`~/.config/duologue` on Linux).
pub fn user_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Merge one file into `config`. Missing files are skipped; malformed ones
/// become warnings.
fn load_layer(config: &mut DuologueConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

fn check_plaintext_keys(config: &DuologueConfig, warnings: &mut Vec<String>) {
    if let Some(ref llm) = config.llm
        && llm.has_plaintext_api_key()
    {
        warnings.push(
            "Default [llm] config contains a plaintext API key. \
             Consider using an environment variable instead."
                .to_string(),
        );
    }

    let mut names: Vec<&String> = config.llm_profiles.keys().collect();
    names.sort();
    for name in names {
        if config.llm_profiles[name].has_plaintext_api_key() {
            warnings.push(format!(
                "[llm.{}] contains a plaintext API key. \
                 Consider using an environment variable instead.",
                name
            ));
        }
    }

    if let Some(ref embedding) = config.embedding
        && let Some(ref openai) = embedding.openai
        && openai.api_key.is_some()
    {
        warnings.push(
            "[embedding.openai] contains a plaintext API key. \
             Consider using OPENAI_API_KEY instead."
                .to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::Backend;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            r#"
[llm]
backend = "groq"
model = "test-model"
"#,
        );

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.llm.as_ref().unwrap().backend, Some(Backend::Groq));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "config.toml", "this is not valid toml {{{{");

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert!(loaded.config.llm.is_none());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_project_overrides_user() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        write(
            user.path(),
            "config.toml",
            r#"
[llm]
backend = "groq"
model = "base-model"

[llm.summary]
model = "big-model"

[storage]
path = "user.db"
"#,
        );
        write(
            project.path(),
            "duologue.toml",
            r#"
[llm]
backend = "ollama"
model = "project-model"

[storage]
path = "project.db"
"#,
        );

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        let config = &loaded.config;

        let llm = config.llm.as_ref().unwrap();
        assert_eq!(llm.backend, Some(Backend::Ollama));
        assert_eq!(llm.model.as_deref(), Some("project-model"));
        assert_eq!(config.storage().path, PathBuf::from("project.db"));
        assert!(config.llm_profiles.contains_key("summary"));
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_plaintext_key_warnings() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            project.path(),
            "duologue.toml",
            r#"
[llm]
backend = "groq"
api_key = "gsk_secret"

[llm.cloud]
backend = "openai"
api_key = "sk-secret"

[embedding.openai]
api_key = "sk-embed"
"#,
        );

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.warnings.len(), 3);
        assert!(loaded.warnings[0].contains("plaintext"));
        assert!(loaded.warnings[1].contains("[llm.cloud]"));
        assert!(loaded.warnings[2].contains("[embedding.openai]"));
    }

    #[test]
    fn test_malformed_config_warns_but_continues() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(project.path(), "duologue.toml", "not valid toml {{{{");

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert!(!loaded.warnings.is_empty());
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_user_config_path_shape() {
        if let Some(p) = user_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }
}
