//! Configuration loading: provider selection, model and credentials
//!
//! The configuration is a flat YAML mapping under an `ai:` key, with
//! environment variables taking precedence over file values:
//!
//! ```yaml
//! ai:
//!   provider: gemini
//!   model: gemini-1.5-flash
//!   api_key: "..."
//!   temperature: 0.8
//! ```

use crate::{Result, SonaError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Flat backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonaConfig {
    /// Backend selection (`openai` or `gemini`)
    pub provider: String,

    /// Model identifier handed to the backend
    #[serde(default)]
    pub model: String,

    /// API key for the selected backend
    #[serde(default)]
    pub api_key: String,

    /// Sampling temperature forwarded with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    ai: SonaConfig,
}

impl SonaConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// A missing file or an empty `api_key` is fatal at startup.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|_| {
            SonaError::config(format!(
                "configuration file not found at {}",
                path.display()
            ))
        })?;
        let file: ConfigFile = serde_yaml::from_str(&raw).map_err(|e| {
            SonaError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        let mut config = file.ai;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from `SONA_*` environment variables alone
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            provider: get_env_or("SONA_PROVIDER", "gemini"),
            model: get_env_or("SONA_MODEL", ""),
            api_key: get_env_or("SONA_API_KEY", ""),
            temperature: None,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("SONA_PROVIDER") {
            self.provider = value;
        }
        if let Ok(value) = env::var("SONA_MODEL") {
            self.model = value;
        }
        if let Ok(value) = env::var("SONA_API_KEY") {
            self.api_key = value;
        }
        if let Some(value) = env::var("SONA_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
        {
            self.temperature = Some(value);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(SonaError::config(
                "provider is not set. Set `ai.provider` in the config file or SONA_PROVIDER.",
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(SonaError::config(
                "api_key is not set. Set `ai.api_key` in the config file or SONA_API_KEY.",
            ));
        }
        Ok(())
    }
}

/// Load environment variables from a `.env` file if one is present.
///
/// A missing file is not an error; a malformed one is.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("loaded environment from {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("no .env file found, using system environment only");
            Ok(())
        }
        Err(e) => Err(SonaError::config(format!("failed to load .env file: {e}"))),
    }
}

/// Get an optional environment variable with a default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    fn clear_overrides() {
        for key in [
            "SONA_PROVIDER",
            "SONA_MODEL",
            "SONA_API_KEY",
            "SONA_TEMPERATURE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_from_file() {
        clear_overrides();
        let file = write_config(
            "ai:\n  provider: gemini\n  model: gemini-1.5-flash\n  api_key: test-key\n  temperature: 0.8\n",
        );

        let config = SonaConfig::from_file(file.path()).unwrap();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.temperature, Some(0.8));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = SonaConfig::from_file("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, SonaError::Config(_)));
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        clear_overrides();
        let file = write_config("ai:\n  provider: openai\n");
        let err = SonaConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_get_env_or() {
        env::set_var("SONA_TEST_STRING", "hello");
        assert_eq!(get_env_or("SONA_TEST_STRING", "default"), "hello");
        assert_eq!(get_env_or("SONA_TEST_NONEXISTENT", "default"), "default");
        env::remove_var("SONA_TEST_STRING");
    }
}
