//! POST /chat-stream — relay a conversation to the provider as SSE

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use chatstream_ai::{CompletionRequest, LlmClient};
use chatstream_models::{ChatMessage, ChatRequest, StreamEvent};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde_json::json;

use crate::api::state::AppState;
use crate::rate_limit::Decision;

pub async fn chat_stream(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return invalid_messages();
    };
    if request.messages.is_empty() {
        return invalid_messages();
    }

    let client_id = addr.ip().to_string();
    let now = Utc::now();
    let decision = state.chat_limiter.admit(&client_id, now);

    if !decision.allowed {
        tracing::debug!(client = %client_id, "chat request rejected by rate limiter");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            rate_limit_headers(&decision),
            Json(decision.exceeded_body(now)),
        )
            .into_response();
    }

    tracing::debug!(
        client = %client_id,
        messages = request.messages.len(),
        "opening chat stream"
    );

    let stream = relay_stream(state.llm.clone(), request.messages);
    (stream_headers(&decision), Sse::new(stream)).into_response()
}

/// Translate the provider's delta sequence into wire events.
///
/// A disconnected client drops the response body, which drops this generator
/// and the provider stream with it: no further deltas are consumed and no
/// events are emitted after the transport closes.
fn relay_stream(
    llm: Arc<dyn LlmClient>,
    messages: Vec<ChatMessage>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut upstream = llm.complete_stream(CompletionRequest::new(messages));

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(chunk) => {
                    if !chunk.text.is_empty() {
                        yield Ok(sse_event(&StreamEvent::content(chunk.text)));
                    }
                    if let Some(reason) = chunk.finish_reason {
                        yield Ok(sse_event(&StreamEvent::finish(reason.as_str())));
                    }
                }
                Err(err) => {
                    tracing::warn!("provider stream failed: {}", err);
                    yield Ok(sse_event(&StreamEvent::error(err.to_string())));
                    return;
                }
            }
        }

        yield Ok(sse_event(&StreamEvent::done()));
        tracing::debug!("chat stream completed");
    }
}

fn sse_event(event: &StreamEvent) -> Event {
    Event::default()
        .json_data(event)
        .expect("stream event serializes")
}

fn invalid_messages() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Invalid messages format"})),
    )
        .into_response()
}

fn rate_limit_headers(decision: &Decision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from_str(&decision.reset_at.to_rfc3339()).expect("rfc3339 header value"),
    );
    headers
}

fn stream_headers(decision: &Decision) -> HeaderMap {
    let mut headers = rate_limit_headers(decision);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}
