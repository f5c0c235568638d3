//! Integration tests for the health, readiness, and diagnostics endpoints.
//!
//! Requires Docker for testcontainers (Postgres). Run with:
//! `cargo test -p komuchi-api --test health_test`

mod helpers;

use helpers::setup_test_app;

#[tokio::test]
async fn health_reports_service_identity() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/health").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "komuchi-api");
    assert!(body["version"].is_string());
    assert!(body["uptime"].is_number());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_requires_no_authentication() {
    let app = setup_test_app().await;

    for path in ["/api/health", "/api/ready", "/api/health/detailed"] {
        let response = app.client().get(path).await;
        assert_eq!(response.status_code(), 200, "expected 200 from {}", path);
    }
}

#[tokio::test]
async fn ready_reports_dependency_checks() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/ready").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "komuchi-api");
    assert_eq!(body["checks"]["database"]["status"], "healthy");
    assert!(body["checks"]["database"]["latencyMs"].is_number());
    assert_eq!(body["checks"]["redis"]["status"], "healthy");
    assert_eq!(body["checks"]["storage"]["status"], "healthy");
}

#[tokio::test]
async fn detailed_health_includes_config_and_memory() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/health/detailed").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["database"]["status"], "healthy");

    let config = &body["config"];
    assert_eq!(config["environment"], "test");
    assert_eq!(config["port"], 3001);
    assert_eq!(config["rateLimit"]["max"], 100);
    assert_eq!(config["rateLimit"]["windowMs"], 60_000);
    assert_eq!(config["maxUploadSizeMB"], 500);
    assert_eq!(config["transcriptionProvider"], "mock");
    assert_eq!(config["storageBackend"], "memory");

    let memory = &body["memory"];
    assert!(memory["rss"].is_number());
    assert!(memory["systemUsed"].is_number());
    assert!(memory["systemTotal"].as_u64().unwrap() > 0);
}
