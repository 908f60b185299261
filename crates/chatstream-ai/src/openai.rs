//! OpenAI-compatible streaming client

use chatstream_models::{ChatRole, SseDecoder};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::client::{CompletionRequest, FinishReason, LlmClient, StreamChunk, StreamResult};
use crate::error::AiError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Streaming client for OpenAI-compatible chat completion APIs
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiDelta {
    content: Option<String>,
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        _ => FinishReason::Error,
    }
}

/// Translate one SSE payload into stream chunks. Malformed payloads and the
/// `[DONE]` sentinel produce nothing.
fn chunks_from_payload(data: &str) -> Vec<StreamChunk> {
    if data.trim() == "[DONE]" {
        return Vec::new();
    }

    let parsed: OpenAiStreamResponse = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(_) => return Vec::new(),
    };

    let mut chunks = Vec::new();
    for choice in parsed.choices {
        if let Some(reason) = choice.finish_reason {
            chunks.push(StreamChunk::final_chunk(map_finish_reason(&reason)));
            continue;
        }

        if let Some(content) = choice.delta.content
            && !content.is_empty()
        {
            chunks.push(StreamChunk::text(content));
        }
    }
    chunks
}

impl LlmClient for OpenAiClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete_stream(&self, request: CompletionRequest) -> StreamResult {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();
        let model = self.model.clone();

        Box::pin(async_stream::stream! {
            let messages: Vec<OpenAiMessage> = request
                .messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: match m.role {
                        ChatRole::System => "system",
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                    },
                    content: m.content.clone(),
                })
                .collect();

            let body = serde_json::json!({
                "model": model,
                "messages": messages,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
                "stream": true,
            });

            tracing::debug!(model = %model, "requesting streaming completion");

            let response = match client
                .post(format!("{}/chat/completions", base_url))
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(AiError::Provider(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                yield Err(AiError::Provider(format!(
                    "Provider returned {}: {}",
                    status, detail
                )));
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(AiError::Provider(format!("Stream error: {}", e)));
                        return;
                    }
                };

                for data in decoder.push(&chunk) {
                    for parsed in chunks_from_payload(&data) {
                        yield Ok(parsed);
                    }
                }
            }

            // The last event may arrive without its trailing delimiter when
            // the connection is cut; parse it best-effort.
            for data in decoder.finish() {
                for parsed in chunks_from_payload(&data) {
                    yield Ok(parsed);
                }
            }
        })
    }
}
