//! HTTP wrapper for the chatstream server endpoints

use chatstream_models::{ChatMessage, ChatRequest, RateLimitStatus};
use reqwest::Response;

use crate::error::ClientError;

#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the conversation; the caller consumes the SSE body incrementally.
    pub async fn post_chat(&self, messages: &[ChatMessage]) -> Result<Response, ClientError> {
        let response = self
            .http_client
            .post(format!("{}/chat-stream", self.base_url))
            .json(&ChatRequest {
                messages: messages.to_vec(),
            })
            .send()
            .await?;
        Ok(response)
    }

    /// Read current throttling counters without consuming a chat slot.
    pub async fn rate_limit_status(&self) -> Result<RateLimitStatus, ClientError> {
        let response = self
            .http_client
            .get(format!("{}/rate-limit-status", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self
            .http_client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}
