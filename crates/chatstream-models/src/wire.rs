//! Wire-level shapes for the chat stream endpoint.
//!
//! Each SSE event carries exactly one JSON payload of the form
//! `{"content": ...}`, `{"finish_reason": ...}`, `{"error": ...}` or
//! `{"done": true}`. The untagged representation keeps unknown or absent
//! fields not-present instead of collapsing them into falsy content.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;

/// Request body for `POST /chat-stream`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// One decoded SSE event payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StreamEvent {
    Content { content: String },
    Finish { finish_reason: String },
    Error { error: String },
    Done { done: bool },
}

impl StreamEvent {
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
        }
    }

    pub fn finish(finish_reason: impl Into<String>) -> Self {
        Self::Finish {
            finish_reason: finish_reason.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn done() -> Self {
        Self::Done { done: true }
    }
}

/// Body of a 429 response from the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitExceeded {
    pub error: String,
    pub limit: u32,
    pub remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
    pub retry_after_ms: u64,
}

/// Body of `GET /rate-limit-status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub is_rate_limited: bool,
    pub limit: u32,
    pub remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
}
