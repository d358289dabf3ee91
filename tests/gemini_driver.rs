use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gemini_chat::error::BackendError;
use gemini_chat::llm::{ChatClient, ConversationHandle, Creativity, GeminiDriver, GeminiSettings};

const KEY: &str = "AIza-test-key";
const GENERATE_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn client(server: &MockServer, timeout: Duration) -> (ChatClient, ConversationHandle) {
    let driver = GeminiDriver::new(GeminiSettings {
        base_url: format!("{}/v1beta", server.uri()),
        timeout,
        ..GeminiSettings::default()
    })
    .unwrap();
    let client = ChatClient::new(Arc::new(driver));
    let handle = client.initialize(KEY).unwrap();
    (client, handle)
}

#[tokio::test]
async fn test_sends_history_key_and_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
            "generationConfig": { "temperature": 0.7 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("hi there")))
        .expect(1)
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "hello" }] },
                { "role": "model", "parts": [{ "text": "hi there" }] },
                { "role": "user", "parts": [{ "text": "and you?" }] }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("doing well")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_secs(5));
    let first = client
        .send(&mut handle, "hello", Creativity::default())
        .await
        .unwrap();
    assert_eq!(first, "hi there");

    let second = client
        .send(&mut handle, "and you?", Creativity::clamped(0.2))
        .await
        .unwrap();
    assert_eq!(second, "doing well");
    assert_eq!(handle.history().len(), 4);
}

#[tokio::test]
async fn test_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_secs(5));
    let err = client
        .send(&mut handle, "hello", Creativity::default())
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::RateLimited);
    assert!(handle.history().is_empty());
}

#[tokio::test]
async fn test_api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_secs(5));
    let err = client
        .send(&mut handle, "hello", Creativity::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::Status {
            status: 400,
            message: "API key not valid.".to_string()
        }
    );
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })),
        )
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_secs(5));
    let err = client
        .send(&mut handle, "something rude", Creativity::default())
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Blocked("SAFETY".to_string()));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_secs(5));
    let err = client
        .send(&mut handle, "hello", Creativity::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply("too late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_millis(200));
    let err = client
        .send(&mut handle, "hello", Creativity::default())
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Timeout);
    assert!(handle.history().is_empty());
}

#[tokio::test]
async fn test_empty_error_body_uses_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, mut handle) = client(&server, Duration::from_secs(5));
    let err = client
        .send(&mut handle, "hello", Creativity::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::Status {
            status: 500,
            message: "Internal Server Error".to_string()
        }
    );
    assert_eq!(err.to_string(), "API error (500): Internal Server Error");
}
