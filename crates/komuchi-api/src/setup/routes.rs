//! Router assembly: route groups, auth layering, CORS, and the outer
//! middleware stack.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use komuchi_core::Config;

use crate::auth::middleware::{auth_middleware, chat_auth_middleware};
use crate::handlers::{chat, health, recordings, voice_profile};
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::state::AppState;

const DEFAULT_CONCURRENCY_LIMIT: usize = 10_000;

pub async fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let cors = setup_cors(config);

    let auth_state = Arc::new(state.auth.clone());
    let rate_limit_state = Arc::new(RateLimitState::new(
        state.health.cache.clone(),
        config.rate_limit_max(),
        config.rate_limit_window_ms(),
    ));

    let protected = recording_routes()
        .merge(voice_profile_routes())
        .layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ));

    let chat = chat_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        chat_auth_middleware,
    ));

    let app = public_routes()
        .merge(protected)
        .merge(chat)
        .layer(ConcurrencyLimitLayer::new(concurrency_limit()))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            rate_limit_state,
            rate_limit_middleware,
        ))
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/detailed", get(health::detailed_health_check))
        .route("/api/ready", get(health::readiness_check))
}

fn recording_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/recordings",
            post(recordings::create_recording).get(recordings::list_recordings),
        )
        .route("/api/recordings/{id}", get(recordings::get_recording))
        .route(
            "/api/recordings/{id}/complete-upload",
            post(recordings::complete_upload),
        )
}

fn chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat/session", get(chat::get_session))
        .route("/api/chat/opener", post(chat::generate_opener))
}

fn voice_profile_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/voice-profile/status", get(voice_profile::status))
        .route("/api/voice-profile/enroll", post(voice_profile::enroll))
        .route("/api/voice-profile", delete(voice_profile::delete_profile))
}

fn setup_cors(config: &Config) -> CorsLayer {
    let origins: Vec<&str> = config
        .cors_origin()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect();

    let allow_methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if origins.contains(&"*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(allow_methods)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(allow_methods)
        .allow_headers(Any)
}

fn concurrency_limit() -> usize {
    std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
}
