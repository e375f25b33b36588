use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{AiError, PrioritizedTasks, Prioritizer, build_prompt, parse_response};
use crate::config::AiConfig;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prioritizer backed by the Anthropic Messages API.
pub struct AnthropicPrioritizer {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    api_key_env: String,
}

impl AnthropicPrioritizer {
    pub fn from_config(cfg: &AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AiError::NotConfigured(format!("failed to build HTTP client: {e}")))?;
        Ok(AnthropicPrioritizer {
            client,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            api_key: std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty()),
            api_key_env: cfg.api_key_env.clone(),
        })
    }
}

impl Prioritizer for AnthropicPrioritizer {
    fn prioritize(&self, tasks: &[String]) -> Result<PrioritizedTasks, AiError> {
        if tasks.is_empty() {
            return Err(AiError::EmptyRequest);
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::NotConfigured(format!("{} is not set", self.api_key_env)))?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: build_prompt(tasks),
            }],
        };

        tracing::debug!(model = %self.model, count = tasks.len(), "sending prioritization request");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout
            } else {
                AiError::Request(format!("failed to read response: {e}"))
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |err| err.error.message);
            return Err(AiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::InvalidResponse(format!("unexpected API payload: {e}")))?;
        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        parse_response(&text)
    }
}
