//! Assistant configuration: backend selection, fixed generation parameters,
//! and timeout discipline. None of these values are user-controllable at
//! runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::BackendMode;

/// Default endpoint for the remote backend when only a credential is given.
const DEFAULT_REMOTE_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_REMOTE_MODEL: &str = "mistralai/mistral-7b-instruct";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Biography data file; `None` uses the record bundled with the crate.
    pub biography_path: Option<PathBuf>,
    pub backend: BackendMode,
    pub generation: GenerationParams,
    /// Bounded wait for the lazy local-model load.
    pub model_load_timeout_secs: u64,
    /// Bound on the single generation attempt per turn.
    pub generation_timeout_secs: u64,
}

/// Fixed numeric generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
    pub repetition_penalty: f32,
    /// Character budget the sanitizer enforces on displayed answers.
    pub max_output_chars: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            repetition_penalty: 1.1,
            max_output_chars: 200,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            biography_path: None,
            backend: BackendMode::Disabled,
            generation: GenerationParams::default(),
            model_load_timeout_secs: 60,
            generation_timeout_secs: 90,
        }
    }
}

impl AssistantConfig {
    /// Validate config values, returning errors for clearly broken
    /// configurations.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err("generation.temperature must be in [0.0, 2.0]".into());
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) || self.generation.top_p == 0.0 {
            return Err("generation.top_p must be in (0.0, 1.0]".into());
        }
        if self.generation.top_k == 0 {
            return Err("generation.top_k must be > 0".into());
        }
        if self.generation.max_output_chars < 20 {
            return Err("generation.max_output_chars must be >= 20".into());
        }
        if self.model_load_timeout_secs == 0 {
            return Err("model_load_timeout_secs must be > 0".into());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Construct from the environment: a credential selects the remote
    /// backend, a model path selects the local one, and neither means
    /// generation is skipped in favor of the fallback responder.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(api_key) = std::env::var("FOLIO_API_KEY") {
            if !api_key.trim().is_empty() {
                config.backend = BackendMode::Remote {
                    endpoint: std::env::var("FOLIO_API_ENDPOINT")
                        .unwrap_or_else(|_| DEFAULT_REMOTE_ENDPOINT.to_string()),
                    api_key,
                    model: std::env::var("FOLIO_MODEL")
                        .unwrap_or_else(|_| DEFAULT_REMOTE_MODEL.to_string()),
                };
                return config;
            }
        }

        if let Ok(model_path) = std::env::var("FOLIO_MODEL_PATH") {
            if !model_path.trim().is_empty() {
                config.backend = BackendMode::Local { model_path: PathBuf::from(model_path) };
                return config;
            }
        }

        // A model dropped into the per-user data directory also enables the
        // local backend
        let model_dir = default_model_dir();
        if model_dir.is_dir() {
            config.backend = BackendMode::Local { model_path: model_dir };
        }

        config
    }

    pub fn model_load_timeout(&self) -> Duration {
        Duration::from_secs(self.model_load_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

fn default_model_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio-chat")
        .join("models")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_disabled() {
        let config = AssistantConfig::default();
        assert!(config.validate().is_ok());
        assert!(matches!(config.backend, BackendMode::Disabled));
    }

    #[test]
    fn validate_rejects_bad_temperature() {
        let mut config = AssistantConfig::default();
        config.generation.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_tiny_output_budget() {
        let mut config = AssistantConfig::default();
        config.generation.max_output_chars = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut config = AssistantConfig::default();
        config.model_load_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AssistantConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AssistantConfig = serde_json::from_str(&json).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back.generation.max_output_chars, config.generation.max_output_chars);
    }
}
