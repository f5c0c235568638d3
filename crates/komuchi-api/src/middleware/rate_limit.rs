//! Fixed-window rate limiting backed by the shared cache.
//!
//! Requests are counted per user id, falling back to the client address for
//! unauthenticated traffic. The limiter fails open: a cache outage must not
//! take the API down with it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use komuchi_cache::Cache;

use crate::auth::middleware::USER_ID_HEADER;
use crate::error::ErrorResponse;

/// Limiter configuration and the cache that holds the counters.
pub struct RateLimitState {
    pub cache: Arc<dyn Cache>,
    pub max_requests: i64,
    pub window: Duration,
}

impl RateLimitState {
    pub fn new(cache: Arc<dyn Cache>, max_requests: i64, window_ms: u64) -> Self {
        Self {
            cache,
            max_requests,
            window: Duration::from_millis(window_ms),
        }
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimitState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = rate_limit_key(&request);

    let count = match limiter.cache.incr_with_window(&key, limiter.window).await {
        Ok(count) => count,
        Err(error) => {
            tracing::warn!(error = %error, "Rate limit check failed, allowing request");
            return next.run(request).await;
        }
    };

    if count > limiter.max_requests {
        tracing::warn!(key = %key, count, "Rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too Many Requests".to_string(),
                message: None,
            }),
        )
            .into_response();
        let retry_after = limiter.window.as_secs().max(1);
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert("Retry-After", value);
        }
        return response;
    }

    let remaining = (limiter.max_requests - count).max(0);
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&limiter.max_requests.to_string()) {
        response.headers_mut().insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
        response.headers_mut().insert("X-RateLimit-Remaining", value);
    }
    response
}

// Keyed on the raw header value rather than the authenticated user so the
// limiter also covers requests that fail auth.
fn rate_limit_key(request: &Request) -> String {
    if let Some(user) = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        return format!("ratelimit:user:{}", user);
    }
    format!("ratelimit:ip:{}", client_addr(request))
}

fn client_addr(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
    {
        let forwarded = forwarded.trim();
        if !forwarded.is_empty() {
            return forwarded.to_string();
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/recordings");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn keys_on_user_id_header_when_present() {
        let request = request_with_headers(&[
            (USER_ID_HEADER, "123e4567-e89b-12d3-a456-426614174000"),
            ("x-forwarded-for", "10.0.0.1"),
        ]);
        assert_eq!(
            rate_limit_key(&request),
            "ratelimit:user:123e4567-e89b-12d3-a456-426614174000"
        );
    }

    #[test]
    fn falls_back_to_forwarded_address() {
        let request = request_with_headers(&[("x-forwarded-for", "10.0.0.1, 172.16.0.1")]);
        assert_eq!(rate_limit_key(&request), "ratelimit:ip:10.0.0.1");
    }

    #[test]
    fn unknown_address_when_nothing_identifies_the_client() {
        let request = request_with_headers(&[]);
        assert_eq!(rate_limit_key(&request), "ratelimit:ip:unknown");
    }
}
