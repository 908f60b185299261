use std::net::SocketAddr;
use std::sync::Arc;

use chatstream_ai::{FinishReason, LlmClient, MockLlmClient, MockStep};
use chatstream_models::StreamEvent;
use chatstream_server::api::state::AppState;
use chatstream_server::rate_limit::RateLimiter;
use chrono::Duration;
use serde_json::{Value, json};

async fn spawn_app(llm: Arc<dyn LlmClient>, chat_limit: u32, status_limit: u32) -> SocketAddr {
    let state = AppState {
        llm,
        chat_limiter: Arc::new(RateLimiter::new(chat_limit, Duration::seconds(60))),
        status_limiter: Arc::new(RateLimiter::new(status_limit, Duration::seconds(60))),
    };
    let app = chatstream_server::app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server should serve");
    });

    addr
}

fn scripted_hello() -> Arc<MockLlmClient> {
    Arc::new(MockLlmClient::from_steps(
        "mock-model",
        vec![
            MockStep::delta("Hel"),
            MockStep::delta("lo"),
            MockStep::finish(FinishReason::Stop),
        ],
    ))
}

fn parse_events(body: &str) -> Vec<StreamEvent> {
    body.split("\n\n")
        .flat_map(|block| block.lines())
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("wire event should parse"))
        .collect()
}

async fn post_chat(addr: SocketAddr, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/chat-stream"))
        .json(&body)
        .send()
        .await
        .expect("request should complete")
}

#[tokio::test]
async fn chat_stream_relays_deltas_in_order() {
    let addr = spawn_app(scripted_hello(), 1, 30).await;

    let response = post_chat(
        addr,
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(response.headers()["x-ratelimit-limit"], "1");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert!(response.headers().contains_key("x-ratelimit-reset"));

    let body = response.text().await.expect("body should read");
    let events = parse_events(&body);

    let content: String = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Content { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(content, "Hello");
    assert!(events.contains(&StreamEvent::finish("stop")));
    assert_eq!(events.last(), Some(&StreamEvent::done()));
}

#[tokio::test]
async fn empty_messages_are_rejected_before_streaming() {
    let addr = spawn_app(scripted_hello(), 1, 30).await;

    let response = post_chat(addr, json!({"messages": []})).await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("error body should parse");
    assert_eq!(body["error"], "Invalid messages format");
}

#[tokio::test]
async fn malformed_body_is_rejected_before_streaming() {
    let addr = spawn_app(scripted_hello(), 1, 30).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat-stream"))
        .header("content-type", "application/json")
        .body(r#"{"messages": "not an array"}"#)
        .send()
        .await
        .expect("request should complete");
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("error body should parse");
    assert_eq!(body["error"], "Invalid messages format");
}

#[tokio::test]
async fn second_request_in_window_gets_structured_429() {
    let addr = spawn_app(scripted_hello(), 1, 30).await;
    let message = json!({"messages": [{"role": "user", "content": "hi"}]});

    let first = post_chat(addr, message.clone()).await;
    assert_eq!(first.status(), 200);
    first.text().await.expect("first stream should drain");

    let second = post_chat(addr, message).await;
    assert_eq!(second.status(), 429);

    let body: Value = second.json().await.expect("429 body should parse");
    assert_eq!(body["limit"], 1);
    assert_eq!(body["remaining"], 0);
    assert!(body["error"].as_str().unwrap().contains("Rate limit"));
    assert!(body["resetTime"].as_str().is_some());
    assert!(body["retryAfterMs"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn upstream_error_is_emitted_as_error_event() {
    let llm = Arc::new(MockLlmClient::from_steps(
        "mock-model",
        vec![MockStep::delta("Hel"), MockStep::error("boom")],
    ));
    let addr = spawn_app(llm, 1, 30).await;

    let response = post_chat(
        addr,
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.expect("body should read");
    let events = parse_events(&body);

    assert!(matches!(
        events.last(),
        Some(StreamEvent::Error { error }) if error.contains("boom")
    ));
    assert!(!events.contains(&StreamEvent::done()));
}

#[tokio::test]
async fn status_endpoint_does_not_consume_chat_quota() {
    let addr = spawn_app(scripted_hello(), 1, 30).await;
    let client = reqwest::Client::new();
    let status_url = format!("http://{addr}/rate-limit-status");

    for _ in 0..3 {
        let response = client
            .get(&status_url)
            .send()
            .await
            .expect("status request should complete");
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.expect("status body should parse");
        assert_eq!(body["isRateLimited"], false);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["remaining"], 1);
    }

    // The chat slot is still free after repeated status checks
    let chat = post_chat(
        addr,
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    assert_eq!(chat.status(), 200);
    chat.text().await.expect("stream should drain");

    let response = client
        .get(&status_url)
        .send()
        .await
        .expect("status request should complete");
    let body: Value = response.json().await.expect("status body should parse");
    assert_eq!(body["isRateLimited"], true);
    assert_eq!(body["remaining"], 0);
    assert!(body["resetTime"].as_str().is_some());
}

#[tokio::test]
async fn status_endpoint_has_its_own_throttle() {
    let addr = spawn_app(scripted_hello(), 1, 2).await;
    let client = reqwest::Client::new();
    let status_url = format!("http://{addr}/rate-limit-status");

    for _ in 0..2 {
        let response = client
            .get(&status_url)
            .send()
            .await
            .expect("status request should complete");
        assert_eq!(response.status(), 200);
    }

    let response = client
        .get(&status_url)
        .send()
        .await
        .expect("status request should complete");
    assert_eq!(response.status(), 429);
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = spawn_app(scripted_hello(), 1, 30).await;

    let response = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("health request should complete");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("health body should parse");
    assert_eq!(body["status"], "ok");
}
