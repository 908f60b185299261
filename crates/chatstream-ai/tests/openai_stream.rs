use chatstream_ai::{AiError, CompletionRequest, FinishReason, LlmClient, OpenAiClient};
use chatstream_models::ChatMessage;
use futures::StreamExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn openai_client_parses_streamed_deltas() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new("test-key", "gpt-test").with_base_url(server.uri());
    let chunks: Vec<_> = client
        .complete_stream(CompletionRequest::new(vec![ChatMessage::user("hi")]))
        .collect()
        .await;

    let text: String = chunks
        .iter()
        .filter_map(|chunk| chunk.as_ref().ok())
        .map(|chunk| chunk.text.as_str())
        .collect();
    assert_eq!(text, "Hello");

    let last = chunks
        .last()
        .and_then(|chunk| chunk.as_ref().ok())
        .expect("stream should end with a parsed chunk");
    assert_eq!(last.finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn openai_client_skips_malformed_events() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {not json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        "data: [DONE]\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new("test-key", "gpt-test").with_base_url(server.uri());
    let chunks: Vec<_> = client
        .complete_stream(CompletionRequest::new(vec![ChatMessage::user("hi")]))
        .collect()
        .await;

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].as_ref().expect("parsed chunk").text, "ok");
}

#[tokio::test]
async fn openai_client_reports_upstream_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new("test-key", "gpt-test").with_base_url(server.uri());
    let chunks: Vec<_> = client
        .complete_stream(CompletionRequest::new(vec![ChatMessage::user("hi")]))
        .collect()
        .await;

    assert_eq!(chunks.len(), 1);
    match &chunks[0] {
        Err(AiError::Provider(message)) => {
            assert!(message.contains("500"), "unexpected message: {message}");
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}
