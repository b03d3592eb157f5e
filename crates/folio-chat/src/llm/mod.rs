//! Generation backends behind one capability interface.
//!
//! Local in-process inference and remote API calls are interchangeable
//! implementations of [`TextGenerator`], selected by configuration. When
//! neither is configured the engine skips generation entirely and the turn
//! goes straight to the fallback responder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::GenerationRequest;

pub mod local;
pub mod remote;

pub use local::LocalGenerator;
pub use remote::RemoteGenerator;

/// Generation-failure taxonomy. Every variant converges on the fallback
/// responder inside the engine; none of them reach the user.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no generation backend configured")]
    Disabled,
    #[error("model load timed out after {0:?}")]
    LoadTimeout(Duration),
    #[error("model load failed: {0}")]
    LoadFailed(String),
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("backend returned an unusable response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub name: String,
    pub model: String,
    pub is_local: bool,
}

/// Capability interface for producing free-form text from a built request.
/// Exactly one generation attempt is made per user turn; retry policy is
/// not a backend concern.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError>;

    fn info(&self) -> BackendInfo;
}

/// Configuration-selected backend mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendMode {
    /// Remote text-generation API authenticated by a credential.
    Remote {
        endpoint: String,
        api_key: String,
        model: String,
    },
    /// Locally-hosted GGUF model, lazily loaded on first use.
    Local { model_path: PathBuf },
    /// Generation skipped; every turn answers from the fallback responder.
    Disabled,
}

/// Build the generator for a mode, or `None` when generation is disabled.
pub fn build_generator(
    mode: &BackendMode,
    model_load_timeout: Duration,
) -> Option<Arc<dyn TextGenerator>> {
    match mode {
        BackendMode::Remote { endpoint, api_key, model } => {
            match RemoteGenerator::new(endpoint.clone(), api_key.clone(), model.clone()) {
                Ok(g) => Some(Arc::new(g)),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote backend construction failed, running fallback-only");
                    None
                }
            }
        }
        BackendMode::Local { model_path } => Some(Arc::new(LocalGenerator::new(
            model_path.clone(),
            model_load_timeout,
        ))),
        BackendMode::Disabled => None,
    }
}

/// Rough token budget for a character budget, chars/4 heuristic with
/// headroom so the sanitizer has a full sentence to cut at.
pub(crate) fn token_budget(max_output_chars: usize) -> usize {
    (max_output_chars / 3).clamp(64, 512)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_mode_builds_no_generator() {
        assert!(build_generator(&BackendMode::Disabled, Duration::from_secs(60)).is_none());
    }

    #[test]
    fn remote_mode_builds_generator() {
        let mode = BackendMode::Remote {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
        };
        let generator = build_generator(&mode, Duration::from_secs(60)).unwrap();
        assert!(!generator.info().is_local);
    }

    #[test]
    fn token_budget_scales_with_chars() {
        assert_eq!(token_budget(200), 66);
        assert_eq!(token_budget(30), 64);
        assert_eq!(token_budget(10_000), 512);
    }

    #[test]
    fn backend_mode_round_trips_through_serde() {
        let mode = BackendMode::Local { model_path: PathBuf::from("/models/m.gguf") };
        let json = serde_json::to_string(&mode).unwrap();
        let back: BackendMode = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, BackendMode::Local { .. }));
    }
}
