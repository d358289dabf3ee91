mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tower::ServiceExt;

use common::{Behavior, MockDriver, app};
use gemini_chat::error::BackendError;

const KEY: &str = "AIza-test-key";

fn server(driver: &Arc<MockDriver>) -> TestServer {
    let (_, router) = app(driver, Some(KEY));
    TestServer::new(router).unwrap()
}

async fn send(server: &TestServer, body: Value) -> (StatusCode, Value) {
    let response = server.post("/api/chat").json(&body).await;
    (response.status_code(), response.json::<Value>())
}

#[tokio::test]
async fn test_hello_exchange() {
    let driver = MockDriver::new(Behavior::Reply("hi there".to_string()));
    let server = server(&driver);

    let (status, body) = send(&server, json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "hi there");
    assert_eq!(body["message_count"], 2);

    let id = body["session_id"].as_str().unwrap();
    let messages = server
        .get(&format!("/api/sessions/{id}/messages"))
        .await
        .json::<Value>();
    assert_eq!(
        messages,
        json!([
            { "role": "user", "text": "hello" },
            { "role": "assistant", "text": "hi there" }
        ])
    );
    assert!((driver.seen()[0].temperature - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_two_sends_keep_order_and_history() {
    let driver = MockDriver::new(Behavior::Echo);
    let server = server(&driver);

    let (_, first) = send(&server, json!({ "message": "one" })).await;
    let id = first["session_id"].as_str().unwrap().to_string();
    let (status, second) = send(&server, json!({ "message": "two", "session_id": id })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message_count"], 4);
    assert_eq!(second["reply"], "echo: two");
    assert_eq!(driver.seen()[1].history_len, 2);
}

#[tokio::test]
async fn test_backend_failure_leaves_transcript_unchanged() {
    let driver = MockDriver::new(Behavior::Reply("kept".to_string()));
    let server = server(&driver);

    let (_, first) = send(&server, json!({ "message": "keep" })).await;
    let id = first["session_id"].as_str().unwrap().to_string();

    driver.set(Behavior::Fail(BackendError::Network(
        "connection refused".to_string(),
    )));
    let (status, body) = send(&server, json!({ "message": "lost", "session_id": id })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));

    let messages = server
        .get(&format!("/api/sessions/{id}/messages"))
        .await
        .json::<Value>();
    assert_eq!(messages.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_clear_empties_transcript_but_not_conversation() {
    let driver = MockDriver::new(Behavior::Echo);
    let server = server(&driver);

    let (_, first) = send(&server, json!({ "message": "remember me" })).await;
    let id = first["session_id"].as_str().unwrap().to_string();

    let cleared = server
        .post(&format!("/api/sessions/{id}/clear"))
        .await
        .json::<Value>();
    assert_eq!(cleared["message_count"], 0);

    // Clearing twice is harmless.
    server
        .post(&format!("/api/sessions/{id}/clear"))
        .await
        .assert_status_ok();

    let (_, after) = send(&server, json!({ "message": "again", "session_id": id })).await;
    assert_eq!(after["message_count"], 2);
    assert_eq!(driver.seen()[1].history_len, 2);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected_without_a_session() {
    let driver = MockDriver::new(Behavior::Echo);
    let server = server(&driver);

    let (status, _) = send(&server, json!({ "message": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(driver.seen().is_empty());

    let sessions = server.get("/api/sessions").await.json::<Value>();
    assert_eq!(sessions["count"], 0);
}

#[tokio::test]
async fn test_creativity_is_clamped() {
    let driver = MockDriver::new(Behavior::Echo);
    let server = server(&driver);

    send(&server, json!({ "message": "hot", "creativity": 3.0 })).await;
    send(&server, json!({ "message": "cold", "creativity": -1.0 })).await;
    send(&server, json!({ "message": "mild", "creativity": 0.34 })).await;

    let temps: Vec<f32> = driver.seen().iter().map(|s| s.temperature).collect();
    assert!((temps[0] - 1.0).abs() < f32::EPSILON);
    assert!(temps[1].abs() < f32::EPSILON);
    assert!((temps[2] - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let driver = MockDriver::new(Behavior::Echo);
    let server = server(&driver);

    let created = server.post("/api/sessions").await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let listed = server.get("/api/sessions").await.json::<Value>();
    assert_eq!(listed["sessions"], json!([id]));

    let summary = server
        .get(&format!("/api/sessions/{id}"))
        .await
        .json::<Value>();
    assert_eq!(summary["message_count"], 0);
    assert_eq!(summary["busy"], false);

    let deleted = server.delete(&format!("/api/sessions/{id}")).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let missing = server.get(&format!("/api/sessions/{id}")).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let (status, _) = send(&server, json!({ "message": "hi", "session_id": id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings() {
    let driver = MockDriver::new(Behavior::Echo);
    let server = server(&driver);

    let settings = server.get("/api/settings").await.json::<Value>();
    assert_eq!(settings["model"], "gemini-pro");
    let creativity = &settings["creativity"];
    assert!(creativity["min"].as_f64().unwrap().abs() < 1e-6);
    assert!((creativity["max"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert!((creativity["step"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    assert!((creativity["default"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn test_missing_api_key_reports_configuration_error() {
    let driver = MockDriver::new(Behavior::Echo);
    let (_, router) = app(&driver, None);
    let server = TestServer::new(router).unwrap();

    let (status, body) = send(&server, json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("GOOGLE_API_KEY"));

    let settings = server.get("/api/settings").await;
    assert_eq!(settings.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(driver.seen().is_empty());
}

#[tokio::test]
async fn test_malformed_api_key_reports_configuration_error() {
    let driver = MockDriver::new(Behavior::Echo);
    let (state, router) = app(&driver, Some("not a key"));
    let server = TestServer::new(router).unwrap();

    let (status, body) = send(&server, json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("malformed"));
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_second_prompt_while_busy_is_rejected() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let driver = MockDriver::new(Behavior::Gated {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    });
    let (state, router) = app(&driver, Some(KEY));
    let session = state.new_session().unwrap();
    let id = session.id().to_string();

    let chat = |message: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "message": message, "session_id": id }).to_string(),
            ))
            .unwrap()
    };

    let first = tokio::spawn(router.clone().oneshot(chat("slow")));
    entered.notified().await;
    assert!(session.is_busy());

    let second = router.clone().oneshot(chat("impatient")).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(session.message_count(), 2);
    assert_eq!(driver.seen().len(), 1);
}
