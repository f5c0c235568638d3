//! Recording endpoints: presigned upload creation, listing, detail, and
//! upload completion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use komuchi_core::models::{
    CompleteUploadRequest, CompleteUploadResponse, CreateRecordingRequest,
    CreateRecordingResponse, RecordingResponse, RecordingStatus,
};
use komuchi_core::{AppError, PageParams};

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson, ValidatedQuery};
use crate::response::{ApiResponse, PagedResponse};
use crate::state::RecordingsState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

// Recording ids arrive as raw path segments. Anything that is not a UUID
// cannot name a recording, so it reads as not-found rather than bad-request.
fn parse_recording_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Recording not found: {}", raw)))
}

#[tracing::instrument(skip(state, request), fields(user_id = %user.0, mode = %request.mode))]
pub async fn create_recording(
    user: CurrentUser,
    State(state): State<RecordingsState>,
    ValidatedJson(request): ValidatedJson<CreateRecordingRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let created = state
        .service
        .create_recording(user.0, request.title, request.mode, request.mime_type)
        .await?;

    tracing::info!(
        recording_id = %created.recording.id,
        object_key = %created.recording.object_key,
        expires_in = created.expires_in,
        "Recording created, upload URL issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CreateRecordingResponse {
            recording_id: created.recording.id,
            upload_url: created.upload_url,
            object_key: created.recording.object_key,
            expires_in: created.expires_in,
        })),
    ))
}

#[tracing::instrument(skip(state, query), fields(user_id = %user.0))]
pub async fn list_recordings(
    user: CurrentUser,
    State(state): State<RecordingsState>,
    ValidatedQuery(query): ValidatedQuery<ListRecordingsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<RecordingStatus>()
                .map_err(|_| AppError::Validation(format!("Invalid status filter: {}", raw)))
        })
        .transpose()?;

    let params = PageParams::new(query.page, query.limit);
    let page = state.service.list_recordings(user.0, params, status).await?;

    Ok(Json(PagedResponse::new(page.map(RecordingResponse::from))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn get_recording(
    user: CurrentUser,
    State(state): State<RecordingsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_recording_id(&id)?;
    let recording = state.service.get_recording(id, user.0).await?;
    Ok(Json(ApiResponse::new(RecordingResponse::from(recording))))
}

#[tracing::instrument(skip(state, request), fields(user_id = %user.0))]
pub async fn complete_upload(
    user: CurrentUser,
    State(state): State<RecordingsState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<CompleteUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let id = parse_recording_id(&id)?;

    let completion = state
        .service
        .complete_upload(id, user.0, Some(request.file_size))
        .await?;

    tracing::info!(
        recording_id = %completion.recording.id,
        job_id = %completion.job.id,
        "Upload completed, transcription queued"
    );

    Ok(Json(ApiResponse::new(CompleteUploadResponse {
        recording_id: completion.recording.id,
        job_id: completion.job.id,
        status: completion.recording.status,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use komuchi_core::ErrorMetadata;

    #[test]
    fn malformed_recording_id_reads_as_not_found() {
        let error = parse_recording_id("non-existent-id").unwrap_err();
        assert_eq!(error.http_status_code(), 404);
    }

    #[test]
    fn valid_uuid_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_recording_id(&id.to_string()).unwrap(), id);
    }
}
