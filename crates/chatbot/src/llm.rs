//! Client for a local llama.cpp server.
//!
//! Three endpoints are tried in order: OpenAI-style chat completions, the
//! OpenAI-style raw completions, then llama.cpp's native `/completion`. The
//! first one that answers with non-empty text wins.

use crate::config::ChatbotConfig;
use crate::error::{ChatbotError, ChatbotResult};
use crate::prompt::{Prompt, COMPLETION_MAX_TOKENS, TEMPERATURE};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const MODEL: &str = "local";

#[async_trait]
pub trait Completion: Send + Sync {
    /// Raw model output for `prompt`
    async fn complete(&self, prompt: &Prompt) -> ChatbotResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    ChatCompletions,
    Completions,
    LlamaCompletion,
}

impl Endpoint {
    const ALL: [Endpoint; 3] = [
        Endpoint::ChatCompletions,
        Endpoint::Completions,
        Endpoint::LlamaCompletion,
    ];

    fn path(self) -> &'static str {
        match self {
            Endpoint::ChatCompletions => "/v1/chat/completions",
            Endpoint::Completions => "/v1/completions",
            Endpoint::LlamaCompletion => "/completion",
        }
    }

    fn body(self, prompt: &Prompt) -> Value {
        match self {
            Endpoint::ChatCompletions => prompt.chat_body(MODEL),
            Endpoint::Completions => json!({
                "model": MODEL,
                "prompt": prompt.flattened(),
                "temperature": TEMPERATURE,
                "max_tokens": COMPLETION_MAX_TOKENS,
            }),
            Endpoint::LlamaCompletion => json!({
                "prompt": prompt.flattened(),
                "temperature": TEMPERATURE,
                "n_predict": COMPLETION_MAX_TOKENS,
            }),
        }
    }

    fn extract(self, body: &Value) -> Option<String> {
        let text = match self {
            Endpoint::ChatCompletions => body.pointer("/choices/0/message/content"),
            Endpoint::Completions => body.pointer("/choices/0/text"),
            Endpoint::LlamaCompletion => body.get("content").or_else(|| body.get("response")),
        };
        text.and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct LlamaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    fallback_timeout: Duration,
}

impl LlamaClient {
    pub fn new(config: &ChatbotConfig) -> ChatbotResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ChatbotError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.llama_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            fallback_timeout: Duration::from_secs(config.fallback_timeout_secs),
        })
    }

    async fn call(&self, endpoint: Endpoint, prompt: &Prompt) -> ChatbotResult<String> {
        let timeout = match endpoint {
            Endpoint::LlamaCompletion => self.fallback_timeout,
            _ => self.timeout,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint.path()))
            .timeout(timeout)
            .json(&endpoint.body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatbotError::LlmStatus(status.as_u16()));
        }

        let body: Value = response.json().await?;
        endpoint.extract(&body).ok_or(ChatbotError::LlmEmpty)
    }
}

#[async_trait]
impl Completion for LlamaClient {
    async fn complete(&self, prompt: &Prompt) -> ChatbotResult<String> {
        for endpoint in Endpoint::ALL {
            match self.call(endpoint, prompt).await {
                Ok(text) => {
                    tracing::debug!(endpoint = endpoint.path(), chars = text.len(), "LLM answered");
                    return Ok(text);
                }
                Err(e) => {
                    tracing::warn!(endpoint = endpoint.path(), error = %e, "LLM endpoint failed");
                }
            }
        }
        Err(ChatbotError::Unavailable)
    }
}
