//! LLM client abstraction and the Claude implementation.
//!
//! Stages talk to a model through [`LlmClient`]: one system prompt, one
//! user prompt, text back. Backends live behind the trait so the pipeline
//! never depends on a particular vendor.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn new(system: &str, user: &str) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
            max_tokens: 4096,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError>;
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Response from the Messages API.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ApiResponse {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Claude API client.
pub struct ClaudeClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl ClaudeClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;
        Ok(Self {
            api_key,
            model: DEFAULT_CLAUDE_MODEL.to_string(),
            http,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn body(&self, request: &LlmRequest) -> serde_json::Value {
        let messages = vec![Message {
            role: "user".to_string(),
            content: request.user.clone(),
        }];
        serde_json::json!({
            "model": &self.model,
            "max_tokens": request.max_tokens,
            "system": &request.system,
            "messages": messages,
        })
    }
}

#[async_trait]
impl LlmClient for ClaudeClient {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        let resp = self
            .http
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Response(format!("Claude API error {status}: {body}")));
        }

        let parsed = resp
            .json::<ApiResponse>()
            .await
            .map_err(|e| LlmError::Serialization(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                model = %self.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                stop_reason = parsed.stop_reason.as_deref().unwrap_or("-"),
                "Claude completion"
            );
        }
        Ok(parsed.text())
    }
}
