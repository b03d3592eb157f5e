//! Local text-generation backend: in-process GGUF inference via llama-cpp-2.
//!
//! The model is a process-wide resource with a single lazy initialization
//! point: the first turn to need it performs the load under an async mutex,
//! so concurrent first turns collapse to one in-flight load. The load has a
//! bounded timeout, and a failed or timed-out load is not sticky: the slot
//! stays empty and a later turn may try again (transient I/O problems while
//! reading model weights should not disable generation for the session).
//! A successful load is cached for the process lifetime.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::LlamaModel;
use llama_cpp_2::sampling::LlamaSampler;
use tokio::sync::Mutex;

use super::{token_budget, BackendInfo, GenerateError, TextGenerator};
use crate::prompt::GenerationRequest;

/// Inference context size. Prompt plus answer always fit comfortably; the
/// context blob is bounded upstream.
const N_CTX: u32 = 4096;

/// Completions that reach these markers have started continuing the
/// dialogue on their own; generation stops there.
const STOP_PATTERNS: &[&str] = &[
    "\nVisitor question:",
    "\nUser:",
    "<|im_end|>",
    "<|endoftext|>",
    "<|end|>",
];

struct GgufEngine {
    model: LlamaModel,
    backend: LlamaBackend,
}

// SAFETY: LlamaModel and LlamaBackend are thread-safe for read-only use.
// Mutable inference state (LlamaContext) is created per call and never
// shared.
unsafe impl Send for GgufEngine {}
unsafe impl Sync for GgufEngine {}

impl GgufEngine {
    fn load(model_path: &Path) -> Result<Self, GenerateError> {
        let gguf_path = resolve_model_path(model_path)?;

        let backend = LlamaBackend::init()
            .map_err(|e| GenerateError::LoadFailed(format!("backend init: {:?}", e)))?;

        tracing::info!(path = %gguf_path.display(), "Loading GGUF model");

        let model_params = LlamaModelParams::default();
        let model = LlamaModel::load_from_file(&backend, &gguf_path, &model_params)
            .map_err(|e| {
                GenerateError::LoadFailed(format!("{}: {:?}", gguf_path.display(), e))
            })?;

        tracing::info!(model = %gguf_path.display(), "Local model ready");

        Ok(Self { model, backend })
    }

    /// Synchronous inference; runs on a blocking thread.
    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let ctx_params =
            LlamaContextParams::default().with_n_ctx(NonZeroU32::new(N_CTX));
        let mut ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| GenerateError::Request(format!("context creation: {:?}", e)))?;

        let tokens = self
            .model
            .str_to_token(&request.prompt, llama_cpp_2::model::AddBos::Always)
            .map_err(|e| GenerateError::Request(format!("tokenization: {:?}", e)))?;
        if tokens.is_empty() {
            return Err(GenerateError::Request("empty prompt after tokenization".to_string()));
        }

        let max_tokens = token_budget(request.max_output_chars);

        // Keep room for the answer inside the context window
        let max_prompt_tokens = (N_CTX as usize).saturating_sub(max_tokens);
        let tokens = if tokens.len() > max_prompt_tokens {
            tracing::warn!(
                prompt_tokens = tokens.len(),
                max = max_prompt_tokens,
                "Prompt truncated to fit context window"
            );
            tokens[tokens.len() - max_prompt_tokens..].to_vec()
        } else {
            tokens
        };
        let n_prompt = tokens.len();

        // Feed the prompt in chunks no larger than one batch
        let n_batch = 2048usize;
        let mut batch = LlamaBatch::new(n_batch, 1);
        let mut processed = 0usize;
        while processed < n_prompt {
            batch.clear();
            let chunk_end = (processed + n_batch).min(n_prompt);
            for i in processed..chunk_end {
                let is_last = i == n_prompt - 1;
                batch
                    .add(tokens[i], i as i32, &[0], is_last)
                    .map_err(|_| GenerateError::Request("batch add failed".to_string()))?;
            }
            ctx.decode(&mut batch)
                .map_err(|e| GenerateError::Request(format!("prompt decode: {:?}", e)))?;
            processed = chunk_end;
        }

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::penalties(256, request.repetition_penalty, 0.0, 0.0),
            LlamaSampler::temp(request.temperature),
            LlamaSampler::top_p(request.top_p, 1),
            LlamaSampler::top_k(request.top_k as i32),
            LlamaSampler::dist(0),
        ]);

        let eos_token = self.model.token_eos();
        let mut output = String::new();
        let mut n_decoded = 0usize;
        let mut cur_pos = n_prompt as i32;

        loop {
            if n_decoded >= max_tokens {
                break;
            }

            let new_token = sampler.sample(&ctx, -1);
            if new_token == eos_token {
                break;
            }

            #[allow(deprecated)]
            let token_str = self
                .model
                .token_to_str(new_token, llama_cpp_2::model::Special::Tokenize)
                .unwrap_or_default();
            output.push_str(&token_str);

            if let Some(pat) = STOP_PATTERNS.iter().find(|p| output.ends_with(*p)) {
                output.truncate(output.len() - pat.len());
                break;
            }

            n_decoded += 1;
            batch.clear();
            batch
                .add(new_token, cur_pos, &[0], true)
                .map_err(|_| GenerateError::Request("batch add failed".to_string()))?;
            cur_pos += 1;
            ctx.decode(&mut batch)
                .map_err(|e| GenerateError::Request(format!("decode step {}: {:?}", n_decoded, e)))?;
        }

        tracing::debug!(
            prompt_tokens = n_prompt,
            generated_tokens = n_decoded,
            "Local inference complete"
        );
        Ok(output)
    }
}

/// Accept either a direct path to a `.gguf` file or a directory containing
/// one.
fn resolve_model_path(path: &Path) -> Result<PathBuf, GenerateError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.flatten() {
                let p = entry.path();
                if p.extension().map(|e| e == "gguf").unwrap_or(false) {
                    return Ok(p);
                }
            }
        }
    }
    Err(GenerateError::LoadFailed(format!(
        "no GGUF model found at {}",
        path.display()
    )))
}

pub struct LocalGenerator {
    model_path: PathBuf,
    load_timeout: Duration,
    engine: Mutex<Option<Arc<GgufEngine>>>,
}

impl LocalGenerator {
    pub fn new(model_path: PathBuf, load_timeout: Duration) -> Self {
        Self {
            model_path,
            load_timeout,
            engine: Mutex::new(None),
        }
    }

    /// Return the loaded engine, loading it on first use. Holding the mutex
    /// across the load makes a second caller await the first caller's
    /// result instead of starting a second load.
    async fn engine(&self) -> Result<Arc<GgufEngine>, GenerateError> {
        let mut slot = self.engine.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        tracing::info!(path = %self.model_path.display(), "Starting lazy model load");
        let path = self.model_path.clone();
        let load = tokio::task::spawn_blocking(move || GgufEngine::load(&path));

        match tokio::time::timeout(self.load_timeout, load).await {
            Err(_) => {
                tracing::warn!(timeout = ?self.load_timeout, "Model load timed out");
                Err(GenerateError::LoadTimeout(self.load_timeout))
            }
            Ok(Err(join_err)) => Err(GenerateError::LoadFailed(join_err.to_string())),
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "Model load failed");
                Err(e)
            }
            Ok(Ok(Ok(engine))) => {
                let engine = Arc::new(engine);
                *slot = Some(Arc::clone(&engine));
                Ok(engine)
            }
        }
    }
}

#[async_trait]
impl TextGenerator for LocalGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let engine = self.engine().await?;
        let request = request.clone();
        tokio::task::spawn_blocking(move || engine.complete(&request))
            .await
            .map_err(|e| GenerateError::Request(format!("inference task panicked: {}", e)))?
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "local".to_string(),
            model: self
                .model_path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "gguf".to_string()),
            is_local: true,
        }
    }
}
