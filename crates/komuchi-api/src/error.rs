//! HTTP error handling for API endpoints.
//!
//! Wraps [`AppError`] so it can be returned from axum handlers. The response
//! body is the `{"error": ..., "message": ...}` envelope clients match on,
//! with `message` dropped for sensitive errors and in production.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use komuchi_core::{AppError, ErrorMetadata, LogLevel};

/// Error envelope returned to clients. `error` is the stable error name
/// (e.g. "Validation Error"), `message` the human-readable detail when it
/// is safe to expose.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Newtype so we can implement `IntoResponse` for [`AppError`].
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(error: AppError) -> Self {
        HttpAppError(error)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(error: anyhow::Error) -> Self {
        HttpAppError(AppError::from(error))
    }
}

impl From<validator::ValidationErrors> for HttpAppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        HttpAppError(AppError::from(errors))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        HttpAppError(AppError::Validation(rejection.body_text()))
    }
}

/// JSON body extractor that rejects malformed payloads with our error
/// envelope instead of axum's plain-text 400/422.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ValidatedJson(value))
    }
}

/// Query-string counterpart of [`ValidatedJson`].
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ValidatedQuery(value))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred")
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred")
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| {
            let env = env.to_lowercase();
            env == "production" || env == "prod"
        })
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = self.0;
        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&error);

        let name = error.error_name().to_string();
        let message = if is_production_env() || error.is_sensitive() {
            None
        } else {
            // Only attach the detail when it adds something beyond the name.
            let detail = error.client_message();
            if detail == name {
                None
            } else {
                Some(detail)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: name,
                message,
            }),
        )
            .into_response()
    }
}
