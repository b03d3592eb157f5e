//! Remote text-generation backend: OpenAI-compatible chat completions.
//!
//! One request per turn, no retry: retries would add latency to an
//! interactive chat with no guarantee of success.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{token_budget, BackendInfo, GenerateError, TextGenerator};
use crate::prompt::GenerationRequest;

pub struct RemoteGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl RemoteGenerator {
    pub fn new(endpoint: String, api_key: String, model: String) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(120))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        tracing::info!(endpoint = %endpoint, model = %model, "Remote generation backend configured");

        Ok(Self { client, endpoint, api_key, model })
    }

    /// Parse the response body, surfacing a clear error when a gateway
    /// returned an HTML error page instead of JSON.
    fn extract_content(body: &str, status: u16) -> Result<String, GenerateError> {
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            let preview: String = trimmed.chars().take(120).collect();
            return Err(GenerateError::InvalidResponse(format!(
                "HTML instead of JSON (HTTP {}): {}",
                status, preview
            )));
        }

        let completion: ChatCompletion = serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            GenerateError::InvalidResponse(format!(
                "JSON parse failed (HTTP {}): {}. Body: {}",
                status, e, preview
            ))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GenerateError::InvalidResponse("empty completion".to_string()))
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.persona},
                {"role": "user", "content": request.prompt},
            ],
            "max_tokens": token_budget(request.max_output_chars),
            "temperature": request.temperature,
            "top_p": request.top_p,
            "frequency_penalty": (request.repetition_penalty - 1.0).max(0.0),
            "stream": false,
        });

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = request.prompt.len(),
            "Sending remote generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Request(format!("request to {} timed out", self.endpoint))
                } else if e.is_connect() {
                    GenerateError::Request(format!("failed to connect to {}: {}", self.endpoint, e))
                } else {
                    GenerateError::Request(format!("request to {} failed: {}", self.endpoint, e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerateError::Request(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            let preview: String = body.chars().take(200).collect();
            return Err(GenerateError::Request(format!(
                "HTTP {} from {}: {}",
                status, self.endpoint, preview
            )));
        }

        Self::extract_content(&body, status.as_u16())
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "remote".to_string(),
            model: self.model.clone(),
            is_local: false,
        }
    }
}
