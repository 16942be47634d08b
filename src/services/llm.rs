use crate::constants::LLM_REQUEST_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Minimal client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    /// Wraps failures in the error variant of the calling service.
    error: fn(String) -> AppError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Value,
}

/// What a completion call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// `choices[0].message.content`: a string, or an object for providers
    /// that honour JSON mode natively.
    Content(Value),
    /// HTTP 429; the caller decides whether to back off.
    RateLimited,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        ChatClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(LLM_REQUEST_TIMEOUT_SECS),
            error: AppError::Optimizer,
        }
    }

    /// Report failures as `error` instead of [`AppError::Optimizer`].
    pub fn with_error(mut self, error: fn(String) -> AppError) -> Self {
        self.error = error;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one completion. Transport failures, non-2xx statuses other than
    /// 429 and malformed envelopes are errors.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> Result<ChatReply> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model,
            messages,
            temperature,
        };

        tracing::debug!(model = %model, "Chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| (self.error)(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(model = %model, "Chat completion rate limited");
            return Ok(ChatReply::RateLimited);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                model = %model,
                "Chat completion HTTP error {}: {}",
                status, error_text
            );
            return Err((self.error)(format!("HTTP {}: {}", status, error_text)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| (self.error)(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| ChatReply::Content(choice.message.content))
            .ok_or_else(|| (self.error)("Response has no choices".to_string()))
    }
}
