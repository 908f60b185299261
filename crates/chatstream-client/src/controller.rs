//! Chat session controller: conversation state, the send state machine, and
//! incremental stream consumption.

use chatstream_models::{ChatMessage, ChatRole, RateLimitExceeded, SseDecoder, StreamEvent};
use chrono::Utc;
use futures::StreamExt;
use reqwest::StatusCode;

use crate::api_client::ApiClient;
use crate::error::ClientError;
use crate::rate_limit::RateLimitState;

/// Where the controller is in the send lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Streaming,
}

/// Terminal result of one send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Completed,
    Errored,
    RateLimited,
}

enum EventOutcome {
    Continue,
    Completed,
    Failed(String),
}

type DeltaListener = Box<dyn Fn(&str) + Send>;

/// Owns the conversation and drives one send at a time through
/// `Idle -> Sending -> Streaming -> {Completed | Errored | RateLimited}`.
pub struct ChatController {
    api: ApiClient,
    messages: Vec<ChatMessage>,
    rate_limit: RateLimitState,
    phase: Phase,
    last_error: Option<String>,
    is_typing: bool,
    delta_listener: Option<DeltaListener>,
}

impl ChatController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            messages: Vec::new(),
            rate_limit: RateLimitState::default(),
            phase: Phase::Idle,
            last_error: None,
            is_typing: false,
            delta_listener: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// Observe content deltas as they stream in, before the conversation is
    /// updated.
    pub fn on_delta(&mut self, listener: impl Fn(&str) + Send + 'static) {
        self.delta_listener = Some(Box::new(listener));
    }

    /// A send is possible only from `Idle`, with non-blank input, outside a
    /// rate-limit window.
    pub fn can_send(&self, input: &str) -> bool {
        !input.trim().is_empty()
            && self.phase == Phase::Idle
            && !self.rate_limit.is_blocked(Utc::now())
    }

    /// Run one full send. Terminal protocol failures are reported through the
    /// returned outcome and `last_error`; `Err` is reserved for calling this
    /// while `can_send` is false.
    pub async fn send(&mut self, input: &str) -> Result<SendOutcome, ClientError> {
        if !self.can_send(input) {
            return Err(ClientError::SendUnavailable);
        }

        self.last_error = None;
        self.messages.push(ChatMessage::user(input.trim()));
        // The conversation sent to the server excludes the placeholder
        let outbound = self.messages.clone();
        self.messages.push(ChatMessage::assistant(""));
        self.phase = Phase::Sending;
        self.is_typing = true;

        let outcome = match self.exchange(&outbound).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(err.to_string());
                SendOutcome::Errored
            }
        };

        self.phase = Phase::Idle;
        self.is_typing = false;
        Ok(outcome)
    }

    async fn exchange(&mut self, outbound: &[ChatMessage]) -> Result<SendOutcome, ClientError> {
        let response = self.api.post_chat(outbound).await?;

        let status = response.status();
        self.rate_limit
            .refresh(response.headers(), status == StatusCode::TOO_MANY_REQUESTS);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let message = match response.json::<RateLimitExceeded>().await {
                Ok(body) => body.error,
                Err(_) => "Rate limit exceeded".to_string(),
            };
            self.fail(message);
            return Ok(SendOutcome::RateLimited);
        }

        if !status.is_success() {
            self.fail(format!("Request failed with status {}", status));
            return Ok(SendOutcome::Errored);
        }

        self.phase = Phase::Streaming;

        let mut decoder = SseDecoder::new();
        let mut accumulated = String::new();
        let mut stream = response.bytes_stream();

        'read: while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    self.fail(format!("Connection lost while streaming: {err}"));
                    return Ok(SendOutcome::Errored);
                }
            };

            for payload in decoder.push(&chunk) {
                match self.apply_payload(&payload, &mut accumulated) {
                    EventOutcome::Continue => {}
                    EventOutcome::Completed => break 'read,
                    EventOutcome::Failed(message) => {
                        self.fail(message);
                        return Ok(SendOutcome::Errored);
                    }
                }
            }
        }

        // The byte stream ending without an explicit done event is also a
        // terminal signal; flush anything cut off mid-event first.
        for payload in decoder.finish() {
            match self.apply_payload(&payload, &mut accumulated) {
                EventOutcome::Continue => {}
                EventOutcome::Completed => break,
                EventOutcome::Failed(message) => {
                    self.fail(message);
                    return Ok(SendOutcome::Errored);
                }
            }
        }

        Ok(SendOutcome::Completed)
    }

    fn apply_payload(&mut self, payload: &str, accumulated: &mut String) -> EventOutcome {
        let event: StreamEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(err) => {
                // One corrupt event never aborts the stream
                tracing::warn!("skipping malformed stream event {payload:?}: {err}");
                return EventOutcome::Continue;
            }
        };

        match event {
            StreamEvent::Content { content } => {
                if let Some(listener) = &self.delta_listener {
                    listener(&content);
                }
                accumulated.push_str(&content);
                if let Some(last) = self.messages.last_mut() {
                    last.content = accumulated.clone();
                }
                EventOutcome::Continue
            }
            StreamEvent::Finish { .. } => EventOutcome::Completed,
            StreamEvent::Done { done } if done => EventOutcome::Completed,
            StreamEvent::Done { .. } => EventOutcome::Continue,
            StreamEvent::Error { error } => EventOutcome::Failed(error),
        }
    }

    /// Terminal error path: record one human-readable message and drop the
    /// placeholder so no partial assistant content survives.
    fn fail(&mut self, message: String) {
        self.rollback_placeholder();
        self.last_error = Some(message);
    }

    fn rollback_placeholder(&mut self) {
        if self
            .messages
            .last()
            .is_some_and(|msg| msg.role == ChatRole::Assistant)
        {
            self.messages.pop();
        }
    }
}
