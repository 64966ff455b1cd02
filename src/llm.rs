//! OpenAI-compatible chat-completions client.
//!
//! Every model interaction in the crate goes through the [`LlmProvider`]
//! trait so tests can substitute a scripted mock. The production
//! implementation posts to `{base}/chat/completions` and extracts the first
//! choice's message content; callers are responsible for stripping whatever
//! markdown or prose the model wraps around the payload.

use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One turn of a chat-completions conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// A provider that answers chat-completions requests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one stateless request and return the raw reply text.
    async fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}

/// Client for any OpenAI-compatible endpoint (vLLM, OpenAI, ...).
pub struct OpenAiCompatClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// `base_url` should include the `/v1` segment.
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AssistantError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    fn parse_response(json: &serde_json::Value) -> Result<String> {
        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AssistantError::Llm("No content in LLM response".to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatClient {
    async fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.0,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Llm(format!("LLM API call failed: {}", e)))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        Self::parse_response(&json)
    }
}
