//! Auth middleware validating the `x-user-id` header against the user table.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use komuchi_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AuthState;

use super::CurrentUser;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

enum AuthFailure {
    MissingHeader,
    Rejected,
    Internal(AppError),
}

// Takes the headers rather than the whole request so the future stays `Send`:
// holding `&Request<Body>` across the repository await would capture the
// non-`Sync` body by reference.
async fn authenticate(
    auth_state: &AuthState,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthFailure> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthFailure::MissingHeader)?;

    let user_id = Uuid::parse_str(raw).map_err(|_| {
        tracing::warn!("Rejected request with malformed user id header");
        AuthFailure::Rejected
    })?;

    let user = auth_state
        .users
        .get(user_id)
        .await
        .map_err(AuthFailure::Internal)?
        .ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "Rejected request for unknown user");
            AuthFailure::Rejected
        })?;

    Ok(CurrentUser(user.id))
}

/// Requires a valid `x-user-id` header. Any failure is reported as a plain
/// `{"error": "Unauthorized"}` without leaking which check tripped.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&auth_state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthFailure::Internal(error)) => HttpAppError(error).into_response(),
        Err(_) => {
            HttpAppError(AppError::Unauthorized("Unauthorized".to_string())).into_response()
        }
    }
}

/// Chat variant: an absent header is reported as `Missing X-User-ID header`,
/// the message the chat client surfaces to prompt re-login. Other failures
/// behave like [`auth_middleware`].
pub async fn chat_auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&auth_state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthFailure::MissingHeader) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Missing X-User-ID header".to_string(),
                message: None,
            }),
        )
            .into_response(),
        Err(AuthFailure::Internal(error)) => HttpAppError(error).into_response(),
        Err(AuthFailure::Rejected) => {
            HttpAppError(AppError::Unauthorized("Unauthorized".to_string())).into_response()
        }
    }
}
