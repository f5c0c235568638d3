//! Integration tests for the chat session and opener endpoints.
//!
//! Requires Docker for testcontainers (Postgres). Run with:
//! `cargo test -p komuchi-api --test chat_test`

mod helpers;

use chrono::NaiveDate;
use helpers::factories::{
    add_test_message, create_test_day_session, create_test_recording, create_test_user,
    RecordingOverrides,
};
use helpers::setup_test_app;
use komuchi_core::models::ChatRole;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn day_session_is_created_on_first_request() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .get("/api/chat/session")
        .add_query_param("date", "2026-03-01")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["sessionId"].is_string());
    assert_eq!(body["sessionDate"], "2026-03-01");
    assert!(body["recordingId"].is_null());
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn day_session_is_reused_and_returns_messages() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let session = create_test_day_session(&app.pool, user.id, date).await;
    add_test_message(&app.pool, session.id, ChatRole::User, "Hello there").await;

    let response = app
        .client()
        .get("/api/chat/session")
        .add_query_param("date", "2026-03-02")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["sessionId"], session.id.to_string());
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Hello there");
}

#[tokio::test]
async fn recording_session_scopes_to_the_recording() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, user.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .get("/api/chat/session")
        .add_query_param("recordingId", recording.id.to_string())
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["recordingId"], recording.id.to_string());
    assert!(body["sessionDate"].is_null());
}

#[tokio::test]
async fn session_requires_exactly_one_scope() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let none = app
        .client()
        .get("/api/chat/session")
        .add_header("x-user-id", user.id.to_string())
        .await;
    assert_eq!(none.status_code(), 400);
    let body: serde_json::Value = none.json();
    assert_eq!(body["error"], "Validation Error");

    let both = app
        .client()
        .get("/api/chat/session")
        .add_query_param("date", "2026-03-01")
        .add_query_param("recordingId", Uuid::new_v4().to_string())
        .add_header("x-user-id", user.id.to_string())
        .await;
    assert_eq!(both.status_code(), 400);
}

#[tokio::test]
async fn session_rejects_malformed_date() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .get("/api/chat/session")
        .add_query_param("date", "01/03/2026")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn session_without_user_header_names_the_header() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/chat/session")
        .add_query_param("date", "2026-03-01")
        .await;

    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing X-User-ID header");
}

#[tokio::test]
async fn session_not_found_for_other_users_recording() {
    let app = setup_test_app().await;
    let owner = create_test_user(&app.pool).await;
    let intruder = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, owner.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .get("/api/chat/session")
        .add_query_param("recordingId", recording.id.to_string())
        .add_header("x-user-id", intruder.id.to_string())
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn opener_generates_an_assistant_message() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .post("/api/chat/opener")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"date": "2026-03-03"}))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["alreadyHasOpener"], false);
    assert!(body["message"]["id"].is_string());
    assert_eq!(body["message"]["role"], "assistant");
    assert_eq!(body["message"]["content"], "Mock AI response");
    assert!(body["message"]["createdAt"].is_string());
}

#[tokio::test]
async fn opener_is_idempotent_per_session() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let first = app
        .client()
        .post("/api/chat/opener")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"date": "2026-03-04"}))
        .await;
    assert_eq!(first.status_code(), 200);

    let second = app
        .client()
        .post("/api/chat/opener")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"date": "2026-03-04"}))
        .await;

    assert_eq!(second.status_code(), 200);
    let body: serde_json::Value = second.json();
    assert_eq!(body["alreadyHasOpener"], true);
    assert!(body.get("message").is_none() || body["message"].is_null());
}

#[tokio::test]
async fn opener_works_for_recording_sessions() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, user.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .post("/api/chat/opener")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"recordingId": recording.id.to_string()}))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["alreadyHasOpener"], false);
    assert_eq!(body["message"]["role"], "assistant");
}

#[tokio::test]
async fn opener_requires_a_scope() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .post("/api/chat/opener")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Validation Error");
}
