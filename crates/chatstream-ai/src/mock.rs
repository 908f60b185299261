//! Deterministic mock LLM client for tests and local runs.

use std::collections::VecDeque;
use std::sync::Arc;

use chatstream_models::ChatRole;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::client::{CompletionRequest, FinishReason, LlmClient, StreamChunk, StreamResult};
use crate::error::AiError;

/// Deterministic step for scripted mock streams.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Emit a text delta.
    Delta(String),
    /// Emit a finish reason and end the stream.
    Finish(FinishReason),
    /// Fail the stream with a provider error.
    Error(String),
}

/// Scripted stream step with optional delay.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Delta(text.into()),
        }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Finish(reason),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A deterministic mock LLM client driven by scripted steps.
///
/// Without a script it echoes the last user message, which keeps ad-hoc local
/// runs useful without network access.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }
}

impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete_stream(&self, request: CompletionRequest) -> StreamResult {
        let script = self.script.clone();

        Box::pin(async_stream::stream! {
            let mut steps = {
                let mut guard = script.lock().await;
                std::mem::take(&mut *guard)
            };

            if steps.is_empty() {
                let text = request
                    .messages
                    .iter()
                    .rev()
                    .find(|msg| msg.role == ChatRole::User)
                    .map(|msg| format!("mock-echo: {}", msg.content))
                    .unwrap_or_else(|| "mock-ok".to_string());

                yield Ok(StreamChunk::text(text));
                yield Ok(StreamChunk::final_chunk(FinishReason::Stop));
                return;
            }

            while let Some(step) = steps.pop_front() {
                if step.delay_ms > 0 {
                    sleep(Duration::from_millis(step.delay_ms)).await;
                }

                match step.kind {
                    MockStepKind::Delta(text) => yield Ok(StreamChunk::text(text)),
                    MockStepKind::Finish(reason) => {
                        yield Ok(StreamChunk::final_chunk(reason));
                        return;
                    }
                    MockStepKind::Error(message) => {
                        yield Err(AiError::Provider(message));
                        return;
                    }
                }
            }
        })
    }
}
