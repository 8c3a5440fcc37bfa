//! OpenAI-compatible chat-completions client
//!
//! Posts to `{base_url}/chat/completions` with bearer auth. One call is one
//! attempt; the caller owns retry and backoff.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::{CompletionProvider, CompletionRequest};
use crate::config::PlannerConfig;
use crate::error::{CompletionError, ConfigError};
use crate::types::ChatMessage;

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn build_body<'a>(model: &'a str, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
    ChatCompletionBody {
        model,
        messages: &request.messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format: request
            .json_mode
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

/// First choice's content; missing or blank content is an empty response.
fn extract_content(response: ChatCompletionResponse) -> Result<String, CompletionError> {
    let first = response.choices.into_iter().next();
    let finish_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
    match first.and_then(|c| c.message).and_then(|m| m.content) {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => {
            error!(finish_reason = ?finish_reason, "Model returned empty response");
            Err(CompletionError::EmptyResponse)
        }
    }
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

impl OpenAiClient {
    pub fn new(config: &PlannerConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.retry.attempt_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: config.retry.attempt_timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            model = %self.model,
            json_mode = request.json_mode,
            max_tokens = request.max_tokens,
            "Requesting chat completion"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&build_body(&self.model, request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(self.timeout)
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Transport(format!(
                "provider error {}: {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::Transport(format!("unreadable provider response: {}", e)))?;
        extract_content(parsed)
    }
}
