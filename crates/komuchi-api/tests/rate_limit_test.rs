//! Integration tests for the fixed-window rate limiter.

mod helpers;

use helpers::factories::create_test_user;
use helpers::setup_test_app_with_rate_limit;

#[tokio::test]
async fn requests_over_the_limit_are_rejected() {
    let app = setup_test_app_with_rate_limit(3).await;
    let user = create_test_user(&app.pool).await;

    for _ in 0..3 {
        let response = app
            .client()
            .get("/api/recordings")
            .add_header("x-user-id", user.id.to_string())
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let blocked = app
        .client()
        .get("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(blocked.status_code(), 429);
    let body: serde_json::Value = blocked.json();
    assert_eq!(body["error"], "Too Many Requests");
    assert!(blocked.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn windows_are_tracked_per_user() {
    let app = setup_test_app_with_rate_limit(2).await;
    let first = create_test_user(&app.pool).await;
    let second = create_test_user(&app.pool).await;

    for _ in 0..2 {
        let response = app
            .client()
            .get("/api/recordings")
            .add_header("x-user-id", first.id.to_string())
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let first_blocked = app
        .client()
        .get("/api/recordings")
        .add_header("x-user-id", first.id.to_string())
        .await;
    assert_eq!(first_blocked.status_code(), 429);

    // A different user keys a different window and is unaffected.
    let second_allowed = app
        .client()
        .get("/api/recordings")
        .add_header("x-user-id", second.id.to_string())
        .await;
    assert_eq!(second_allowed.status_code(), 200);
}

#[tokio::test]
async fn responses_carry_rate_limit_headers() {
    let app = setup_test_app_with_rate_limit(10).await;
    let user = create_test_user(&app.pool).await;

    let response = app
        .client()
        .get("/api/recordings")
        .add_header("x-user-id", user.id.to_string())
        .await;

    assert_eq!(response.status_code(), 200);
    let headers = response.headers();
    let limit = headers
        .get("x-ratelimit-limit")
        .expect("missing X-RateLimit-Limit header");
    let remaining = headers
        .get("x-ratelimit-remaining")
        .expect("missing X-RateLimit-Remaining header");
    assert_eq!(limit.to_str().unwrap(), "10");
    assert_eq!(remaining.to_str().unwrap(), "9");
}

#[tokio::test]
async fn rejected_requests_never_reach_auth() {
    // The limiter sits outside authentication, so even requests that would
    // fail auth consume and eventually exhaust the caller's window.
    let app = setup_test_app_with_rate_limit(1).await;

    let first = app.client().get("/api/recordings").await;
    assert_eq!(first.status_code(), 401);

    let second = app.client().get("/api/recordings").await;
    assert_eq!(second.status_code(), 429);
}
