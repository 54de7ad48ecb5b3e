//! Messages client and intent extractor against a mock API server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use serde_json::json;
use tigertix_llm::{
    AnthropicClient, BookingIntent, ClaudeError, ClaudeIntentExtractor, IntentError,
    IntentExtractor, Message, MessagesRequest,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "model": "claude-sonnet-4-5-20250929",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 42, "output_tokens": 17}
    })
}

async fn extractor_for(server: &MockServer) -> ClaudeIntentExtractor {
    let client = AnthropicClient::new("test-key".to_string()).with_api_url(server.uri());
    ClaudeIntentExtractor::new(client)
}

#[tokio::test]
async fn sends_auth_headers_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new("test-key".to_string()).with_api_url(server.uri());
    let response = client
        .messages(MessagesRequest::new(vec![Message::user("hi")]))
        .await
        .expect("request should succeed");

    assert_eq!(response.first_text(), Some("hello"));
    assert_eq!(response.usage.output_tokens, 17);
}

#[tokio::test]
async fn maps_error_statuses() {
    let server = MockServer::start().await;
    let client = AnthropicClient::new("k".to_string()).with_api_url(server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let err = client
        .messages(MessagesRequest::new(vec![Message::user("x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::RateLimited));

    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let err = client
        .messages(MessagesRequest::new(vec![Message::user("x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Unauthorized));

    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;
    let err = client
        .messages(MessagesRequest::new(vec![Message::user("x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::ApiError { status: 529, ref message } if message == "overloaded"));
}

#[tokio::test]
async fn extracts_booking_intent_with_deterministic_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({"max_tokens": 500, "temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "```json\n{\"intent\": \"book_tickets\", \"event\": \"Jazz Night\", \"tickets\": 2}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let intent = extractor_for(&server)
        .await
        .extract("book 2 tix for jaz night")
        .await
        .expect("extraction should succeed");

    assert_eq!(
        intent,
        BookingIntent::BookTickets {
            event: "Jazz Night".to_string(),
            tickets: 2,
        }
    );
}

#[tokio::test]
async fn blank_input_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let err = extractor_for(&server).await.extract("  \n ").await.unwrap_err();
    assert_eq!(err, IntentError::EmptyInput);
}

#[tokio::test]
async fn prose_reply_is_unparseable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply("I'm not sure what you mean.")),
        )
        .mount(&server)
        .await;

    let err = extractor_for(&server).await.extract("hmm").await.unwrap_err();
    assert!(matches!(err, IntentError::Unparseable { .. }));
}

#[tokio::test]
async fn api_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = extractor_for(&server)
        .await
        .extract("events on 2025-11-15")
        .await
        .unwrap_err();
    assert!(matches!(err, IntentError::Unavailable(_)));
}
