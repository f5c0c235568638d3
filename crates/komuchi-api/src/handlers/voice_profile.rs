//! Voice profile endpoints: enrollment, status, and deletion.
//!
//! Enrollment accepts either a multipart form with an `audio` part or the
//! raw audio bytes with their content type, so both the mobile client and
//! plain curl-style uploads work.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use komuchi_core::models::VoiceProfileStatusResponse;
use komuchi_core::AppError;

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::response::MessageResponse;
use crate::state::VoiceProfileState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrollResponse {
    success: bool,
    has_voice_profile: bool,
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn status(
    user: CurrentUser,
    State(state): State<VoiceProfileState>,
) -> Result<impl IntoResponse, HttpAppError> {
    let has_voice_profile = state.service.status(user.0).await?;
    Ok(Json(VoiceProfileStatusResponse { has_voice_profile }))
}

#[tracing::instrument(skip(state, request), fields(user_id = %user.0))]
pub async fn enroll(
    user: CurrentUser,
    State(state): State<VoiceProfileState>,
    request: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let (audio, mime_type) = read_audio_sample(request).await?;

    state.service.enroll(user.0, audio, &mime_type).await?;

    Ok(Json(EnrollResponse {
        success: true,
        has_voice_profile: true,
    }))
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn delete_profile(
    user: CurrentUser,
    State(state): State<VoiceProfileState>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.service.delete(user.0).await?;

    Ok(Json(MessageResponse::new(
        "Voice profile deleted successfully",
    )))
}

async fn read_audio_sample(request: Request) -> Result<(Bytes, String), AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;

        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
            .ok_or_else(|| {
                AppError::Validation("Multipart body is missing the audio part".to_string())
            })?;

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let audio = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read audio part: {}", e)))?;

        return Ok((audio, mime_type));
    }

    let audio = Bytes::from_request(request, &())
        .await
        .map_err(|_| AppError::Validation("Failed to read request body".to_string()))?;

    Ok((audio, content_type))
}
