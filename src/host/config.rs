//! Configuration loading for clarityd.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.clarity/config.toml` (user)
//! 3. built-in defaults
//!
//! A browser launches the host with no arguments, so a missing user file
//! is not an error.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::{ClarityBuilder, ClarityError, Result};

/// Host configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Provider endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API base URL (default: the public v1beta endpoint).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name (default: gemini-2.5-flash).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-call timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Explanation cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached explanations (default: 200).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

/// Settings store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Store file (default: `~/.clarity/store.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ClarityError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClarityError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(ClarityError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Ok(clarity_dir()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists()))
    }

    /// Store file path, falling back to `~/.clarity/store.json`.
    pub fn store_path(&self) -> Result<PathBuf> {
        self.store
            .path
            .clone()
            .or_else(|| clarity_dir().map(|dir| dir.join("store.json")))
            .ok_or_else(|| {
                ClarityError::Configuration(
                    "No home directory; set [store] path in the config file".to_string(),
                )
            })
    }

    /// Apply provider and cache settings to an explainer builder.
    pub fn apply(&self, mut builder: ClarityBuilder) -> ClarityBuilder {
        builder = builder
            .gemini_base_url(&self.gemini.base_url)
            .model(&self.gemini.model)
            .cache_capacity(self.cache.capacity);
        if let Some(secs) = self.gemini.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        builder
    }
}

fn clarity_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".clarity"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.gemini.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.request_timeout_secs, None);
        assert_eq!(config.cache.capacity, 200);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [cache]
            capacity = 50
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.capacity, 50);
        // Defaults preserved
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [gemini]
            base_url = "http://localhost:8080/v1beta"
            model = "gemini-2.0-flash"
            request_timeout_secs = 45

            [cache]
            capacity = 10

            [store]
            path = "/var/lib/clarity/store.json"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.gemini.base_url, "http://localhost:8080/v1beta");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.request_timeout_secs, Some(45));
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/var/lib/clarity/store.json")
        );
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/config.toml")))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn explicit_config_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[gemini]\nmodel = \"custom\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.gemini.model, "custom");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache\ncapacity = ").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ClarityError::Configuration(_))
        ));
    }
}
