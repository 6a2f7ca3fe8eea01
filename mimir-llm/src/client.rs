//! LLM Client: OpenAI Responses, OpenAI-compatible chat, and Ollama backends.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Name of the API key setting, used in `ConfigMissing` errors.
pub const API_KEY_NAME: &str = "OPENAI_API_KEY";

/// Anything that turns a prompt into raw model text.
pub trait CompletionModel {
    /// Run one completion.
    fn complete(
        &self,
        request: &LlmRequest,
    ) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send;
}

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// OpenAI Responses API (`/v1/responses`).
    OpenAiResponses { base_url: String, api_key: Option<String> },
    /// OpenAI-compatible chat completions (`/v1/chat/completions`).
    OpenAiCompatible { base_url: String, api_key: Option<String> },
    /// Ollama running locally.
    Ollama { base_url: String },
    /// No LLM configured: every call fails with `Unavailable`.
    None,
}

impl LlmProvider {
    /// Build a provider from its configuration name.
    ///
    /// # Errors
    /// Returns `LlmError::ConfigError` for an unknown provider name.
    pub fn from_name(
        name: &str,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match name {
            "openai" | "openai_responses" => Ok(Self::OpenAiResponses { base_url, api_key }),
            "openai_chat" | "openai_compatible" => Ok(Self::OpenAiCompatible { base_url, api_key }),
            "ollama" => Ok(Self::Ollama { base_url }),
            "none" => Ok(Self::None),
            other => Err(LlmError::ConfigError(format!("unknown provider '{other}'"))),
        }
    }
}

/// The main LLM client.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
        }
    }

    /// Create a client with no LLM backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new())
    }

    /// Model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a response from the LLM. Single attempt, no retries.
    ///
    /// # Errors
    /// `ConfigMissing` when an OpenAI backend has no API key, otherwise
    /// transport, status or decoding failures.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::OpenAiResponses { base_url, api_key } => {
                let api_key = require_key(api_key.as_deref())?;
                let body = json!({
                    "model": self.model,
                    "input": request.input,
                });
                let url = format!("{base_url}/v1/responses");
                self.post(&url, Some(api_key), &body, request, extract_responses_text)
                    .await
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let api_key = require_key(api_key.as_deref())?;
                let body = json!({
                    "model": self.model,
                    "messages": [
                        { "role": "user", "content": request.input },
                    ],
                });
                let url = format!("{base_url}/v1/chat/completions");
                self.post(&url, Some(api_key), &body, request, extract_chat_text)
                    .await
            }
            LlmProvider::Ollama { base_url } => {
                let body = json!({
                    "model": self.model,
                    "prompt": request.input,
                    "stream": false,
                });
                let url = format!("{base_url}/api/generate");
                self.post(&url, None, &body, request, extract_ollama_text)
                    .await
            }
        }
    }

    async fn post(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &Value,
        request: &LlmRequest,
        extract: fn(&Value) -> String,
    ) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let mut builder = self
            .http
            .post(url)
            .json(body)
            .timeout(Duration::from_millis(request.timeout_ms));
        if let Some(key) = api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(url, timeout_ms = request.timeout_ms, "LLM request timed out");
                LlmError::Timeout(request.timeout_ms)
            } else {
                warn!(url, error = %e, "LLM request failed");
                LlmError::from(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(url, status = status.as_u16(), "LLM service returned error");
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = start.elapsed().as_millis() as u64;
        let text = extract(&json).trim().to_string();
        debug!(model = %self.model, latency_ms, chars = text.len(), "LLM call completed");

        Ok(LlmResponse {
            text,
            latency_ms,
            model: self.model.clone(),
        })
    }
}

impl CompletionModel for LlmClient {
    fn complete(
        &self,
        request: &LlmRequest,
    ) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send {
        self.generate(request)
    }
}

fn require_key(api_key: Option<&str>) -> Result<&str, LlmError> {
    api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(LlmError::ConfigMissing(API_KEY_NAME))
}

/// Text of a Responses API body.
///
/// Prefers the `output_text` convenience field, then the first text part in
/// `output[*].content[*]`, and finally the whole body re-encoded as JSON.
#[must_use]
pub fn extract_responses_text(json: &Value) -> String {
    if let Some(text) = json["output_text"].as_str() {
        return text.to_string();
    }

    let from_output = json["output"].as_array().and_then(|items| {
        items
            .iter()
            .filter_map(|item| item["content"].as_array())
            .flatten()
            .find_map(|part| part["text"].as_str())
    });

    match from_output {
        Some(text) => text.to_string(),
        None => json.to_string(),
    }
}

/// Text of a chat-completions body.
#[must_use]
pub fn extract_chat_text(json: &Value) -> String {
    json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string()
}

/// Text of an Ollama `/api/generate` body.
#[must_use]
pub fn extract_ollama_text(json: &Value) -> String {
    json["response"].as_str().unwrap_or("").to_string()
}
