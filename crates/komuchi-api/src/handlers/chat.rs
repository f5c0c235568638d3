//! Chat endpoints: session lookup/creation and opener generation.
//!
//! A session is scoped either to a calendar day or to a single recording,
//! never both. These endpoints return flat JSON (no `{success, data}`
//! envelope), which is what the chat client consumes.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use komuchi_core::models::{ChatMessageResponse, ChatSessionResponse, OpenerResponse};
use komuchi_core::AppError;

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson, ValidatedQuery};
use crate::state::ChatState;

use komuchi_services::ChatScope;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub date: Option<String>,
    pub recording_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenerRequest {
    pub date: Option<String>,
    pub recording_id: Option<String>,
}

fn resolve_scope(date: Option<&str>, recording_id: Option<&str>) -> Result<ChatScope, AppError> {
    match (date, recording_id) {
        (Some(raw), None) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("date must be formatted YYYY-MM-DD, got: {}", raw))
            })?;
            Ok(ChatScope::Day(date))
        }
        (None, Some(raw)) => {
            let id = Uuid::parse_str(raw).map_err(|_| {
                AppError::Validation(format!("recordingId must be a UUID, got: {}", raw))
            })?;
            Ok(ChatScope::Recording(id))
        }
        _ => Err(AppError::Validation(
            "Provide exactly one of date or recordingId".to_string(),
        )),
    }
}

#[tracing::instrument(skip(state, query), fields(user_id = %user.0))]
pub async fn get_session(
    user: CurrentUser,
    State(state): State<ChatState>,
    ValidatedQuery(query): ValidatedQuery<SessionQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = resolve_scope(query.date.as_deref(), query.recording_id.as_deref())?;

    let (session, messages) = match scope {
        ChatScope::Day(date) => state.service.get_or_create_day_session(user.0, date).await?,
        ChatScope::Recording(id) => {
            state
                .service
                .get_or_create_recording_session(user.0, id)
                .await?
        }
    };

    Ok(Json(ChatSessionResponse::new(session, messages)))
}

#[tracing::instrument(skip(state, request), fields(user_id = %user.0))]
pub async fn generate_opener(
    user: CurrentUser,
    State(state): State<ChatState>,
    ValidatedJson(request): ValidatedJson<OpenerRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = resolve_scope(request.date.as_deref(), request.recording_id.as_deref())?;

    let opener = state.service.generate_opener(user.0, scope).await?;

    if !opener.already_has_opener {
        tracing::info!("Chat opener generated");
    }

    Ok(Json(OpenerResponse {
        already_has_opener: opener.already_has_opener,
        message: opener.message.map(ChatMessageResponse::from),
    }))
}
