//! Ollama Backend Implementation
//!
//! Non-streaming client for Ollama's `/api/chat` endpoint. The HTTP call is
//! async (reqwest); [`ModelBackend::generate`] drives it to completion on the
//! runtime handle it was built with.
//!
//! # Ollama API
//!
//! ```text
//! POST /api/chat
//! { "model": ..., "messages": [system, user], "stream": false, "options": {...} }
//! → { "message": { "role": "assistant", "content": "..." }, "done": true, ... }
//! ```

use std::time::Duration;

use serde::Deserialize;
use tokio::runtime::Handle;

use super::traits::{BackendError, ModelBackend};

/// Default chat endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/chat";

/// Default model name
pub const DEFAULT_OLLAMA_MODEL: &str = "gptoss-agent";

/// Default system prompt: short spoken answers
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are 'GPT', a relaxed AI assistant. \
Answer the user directly. Keep the answer short and concise (max 2 sentences).";

/// Sampling temperature sent with every request
const TEMPERATURE: f32 = 0.7;
/// Token budget for a reply
const NUM_PREDICT: u32 = 512;
/// Keeps the model from continuing the dialogue on its own
const STOP_SEQUENCES: [&str; 2] = ["\nUser:", "\nDu:"];

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Ollama chat client
#[derive(Clone)]
pub struct OllamaBackend {
    /// Full chat endpoint URL
    url: String,
    /// Model to ask
    model: String,
    /// System message sent before every prompt
    system_prompt: String,
    /// HTTP client
    http_client: reqwest::Client,
    /// Runtime that drives the HTTP future
    runtime: Handle,
}

impl OllamaBackend {
    /// Create a client for `url` (the full `/api/chat` URL).
    ///
    /// `runtime` must be a multi-threaded runtime: `generate` is called from
    /// its blocking pool and parks there while the request runs.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        timeout: Duration,
        runtime: Handle,
    ) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            http_client,
            runtime,
        })
    }

    /// Chat endpoint URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request body for `prompt`
    fn chat_payload(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": prompt },
            ],
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": NUM_PREDICT,
                "stop": STOP_SEQUENCES,
            },
        })
    }

    async fn chat(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&self.chat_payload(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Connection(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let data: ChatResponse = response.json().await?;
        extract_reply(data)
    }
}

fn extract_reply(data: ChatResponse) -> Result<String, BackendError> {
    let content = data.message.map(|m| m.content).unwrap_or_default();
    let reply = content.trim();
    if reply.is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(reply.to_string())
}

impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        tracing::debug!(url = %self.url, model = %self.model, "sending chat request");
        let result = self.runtime.block_on(self.chat(prompt));
        if let Err(e) = &result {
            tracing::warn!(error = %e, "chat request failed");
        }
        result
    }
}
