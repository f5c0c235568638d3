//! Integration tests for the recording endpoints.
//!
//! Requires Docker for testcontainers (Postgres). Run with:
//! `cargo test -p komuchi-api --test recordings_test`

mod helpers;

use helpers::factories::{create_test_recording, create_test_user, RecordingOverrides};
use helpers::setup_test_app;
use komuchi_core::models::RecordingStatus;
use komuchi_db::JobRepository;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn create_recording_returns_upload_url() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .post("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({
            "title": "Morning standup",
            "mode": "general",
            "mimeType": "audio/mpeg"
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert!(data["recordingId"].is_string());
    assert!(data["uploadUrl"].is_string());
    assert!(data["objectKey"]
        .as_str()
        .unwrap()
        .contains(&user.id.to_string()));
    assert_eq!(data["expiresIn"], 900);
}

#[tokio::test]
async fn create_recording_without_user_is_unauthorized() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/recordings")
        .json(&json!({
            "title": "No auth",
            "mode": "general",
            "mimeType": "audio/mpeg"
        }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn create_recording_with_unknown_user_is_unauthorized() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/recordings")
        .add_header("x-user-id", Uuid::new_v4().to_string())
        .json(&json!({
            "title": "Ghost user",
            "mode": "general",
            "mimeType": "audio/mpeg"
        }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn create_recording_rejects_unsupported_mime_type() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .post("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({
            "title": "Bad mime",
            "mode": "general",
            "mimeType": "invalid/type"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid File Type");
}

#[tokio::test]
async fn create_recording_rejects_missing_fields() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .post("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn create_recording_rejects_empty_title() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .post("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({
            "title": "",
            "mode": "general",
            "mimeType": "audio/mpeg"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn list_recordings_returns_pagination() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    for i in 0..2 {
        create_test_recording(
            &app.pool,
            user.id,
            RecordingOverrides {
                title: Some(format!("Recording {}", i)),
                ..Default::default()
            },
        )
        .await;
    }

    let response = app
        .client()
        .get("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["userId"], user.id.to_string());
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 20);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["totalPages"], 1);
}

#[tokio::test]
async fn list_recordings_honors_page_and_limit() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    for i in 0..5 {
        create_test_recording(
            &app.pool,
            user.id,
            RecordingOverrides {
                title: Some(format!("Recording {}", i)),
                ..Default::default()
            },
        )
        .await;
    }

    let response = app
        .client()
        .get("/api/recordings")
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn list_recordings_filters_by_status() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    create_test_recording(&app.pool, user.id, RecordingOverrides::default()).await;
    create_test_recording(
        &app.pool,
        user.id,
        RecordingOverrides {
            status: Some(RecordingStatus::Complete),
            ..Default::default()
        },
    )
    .await;

    let response = app
        .client()
        .get("/api/recordings")
        .add_query_param("status", "complete")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["status"], "complete");
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn list_recordings_rejects_unknown_status() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .get("/api/recordings")
        .add_query_param("status", "bogus")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Validation Error");
}

#[tokio::test]
async fn list_recordings_excludes_other_users() {
    let app = setup_test_app().await;
    let owner = create_test_user(&app.pool).await;
    let other = create_test_user(&app.pool).await;
    create_test_recording(&app.pool, owner.id, RecordingOverrides::default()).await;
    create_test_recording(&app.pool, other.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .get("/api/recordings")
        .add_header("x-user-id", owner.id.to_string())
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["userId"], owner.id.to_string());
}

#[tokio::test]
async fn get_recording_returns_details() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, user.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .get(&format!("/api/recordings/{}", recording.id))
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], recording.id.to_string());
    assert_eq!(body["data"]["title"], "Test Recording");
    assert_eq!(body["data"]["userId"], user.id.to_string());
}

#[tokio::test]
async fn get_recording_not_found_for_missing_id() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .get(&format!("/api/recordings/{}", Uuid::new_v4()))
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 404);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn get_recording_not_found_for_malformed_id() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .get("/api/recordings/non-existent-id")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn get_recording_not_found_for_other_users_recording() {
    let app = setup_test_app().await;
    let owner = create_test_user(&app.pool).await;
    let intruder = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, owner.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .get(&format!("/api/recordings/{}", recording.id))
        .add_header("x-user-id", intruder.id.to_string())
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn complete_upload_queues_transcription() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, user.id, RecordingOverrides::default()).await;

    app.storage
        .upload(&recording.object_key, vec![0u8; 2048], "audio/mpeg")
        .await
        .expect("Failed to stage audio in storage");

    let response = app
        .client()
        .post(&format!("/api/recordings/{}/complete-upload", recording.id))
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"fileSize": 2048}))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["recordingId"], recording.id.to_string());
    assert_eq!(body["data"]["status"], "processing");
    assert!(body["data"]["jobId"].is_string());

    let jobs = JobRepository::new(app.pool.clone())
        .list_by_recording(recording.id)
        .await
        .expect("Failed to list jobs");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_type.to_string(), "TRANSCRIBE");
}

#[tokio::test]
async fn complete_upload_rejects_non_pending_recording() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let recording = create_test_recording(
        &app.pool,
        user.id,
        RecordingOverrides {
            status: Some(RecordingStatus::Complete),
            ..Default::default()
        },
    )
    .await;

    let response = app
        .client()
        .post(&format!("/api/recordings/{}/complete-upload", recording.id))
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"fileSize": 2048}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid State");
}

#[tokio::test]
async fn complete_upload_requires_staged_object() {
    let app = setup_test_app().await;
    let user = create_test_user(&app.pool).await;
    let recording = create_test_recording(&app.pool, user.id, RecordingOverrides::default()).await;

    let response = app
        .client()
        .post(&format!("/api/recordings/{}/complete-upload", recording.id))
        .add_header("x-user-id", user.id.to_string())
        .json(&json!({"fileSize": 2048}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Validation Error");
}
