use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// What kind of conversation the recording captures. Drives the debrief prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    General,
    Sales,
    Interview,
    Meeting,
}

impl Display for RecordingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordingMode::General => write!(f, "general"),
            RecordingMode::Sales => write!(f, "sales"),
            RecordingMode::Interview => write!(f, "interview"),
            RecordingMode::Meeting => write!(f, "meeting"),
        }
    }
}

impl FromStr for RecordingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(RecordingMode::General),
            "sales" => Ok(RecordingMode::Sales),
            "interview" => Ok(RecordingMode::Interview),
            "meeting" => Ok(RecordingMode::Meeting),
            _ => Err(anyhow::anyhow!("Invalid recording mode: {}", s)),
        }
    }
}

/// Recording lifecycle: pending (created, awaiting upload) -> uploaded (bytes in
/// storage) -> processing (pipeline running) -> complete or failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Pending,
    Uploaded,
    Processing,
    Complete,
    Failed,
}

impl Display for RecordingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordingStatus::Pending => write!(f, "pending"),
            RecordingStatus::Uploaded => write!(f, "uploaded"),
            RecordingStatus::Processing => write!(f, "processing"),
            RecordingStatus::Complete => write!(f, "complete"),
            RecordingStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RecordingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RecordingStatus::Pending),
            "uploaded" => Ok(RecordingStatus::Uploaded),
            "processing" => Ok(RecordingStatus::Processing),
            "complete" => Ok(RecordingStatus::Complete),
            "failed" => Ok(RecordingStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid recording status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub mode: RecordingMode,
    pub status: RecordingStatus,
    pub object_key: String,
    pub original_filename: String,
    pub mime_type: String,
    pub file_size: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Recording {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Recording {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            mode: row.get::<String, _>("mode").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse recording mode: {}", e).into())
            })?,
            status: row.get("status"),
            object_key: row.get("object_key"),
            original_filename: row.get("original_filename"),
            mime_type: row.get("mime_type"),
            file_size: row.get("file_size"),
            duration_seconds: row.get("duration_seconds"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

impl Recording {
    /// Whether a client may still complete the direct upload for this recording.
    pub fn awaiting_upload(&self) -> bool {
        self.status == RecordingStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            RecordingStatus::Complete | RecordingStatus::Failed
        )
    }
}

/// Request body for `POST /api/recordings`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordingRequest {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    pub mode: RecordingMode,
    #[validate(length(min = 1, max = 255, message = "mimeType is required"))]
    pub mime_type: String,
}

/// Response for `POST /api/recordings`: the created recording id plus a
/// presigned PUT URL the client uploads the audio to directly.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordingResponse {
    pub recording_id: Uuid,
    pub upload_url: String,
    pub object_key: String,
    /// Seconds until the upload URL expires.
    pub expires_in: u64,
}

/// Request body for `POST /api/recordings/{id}/complete-upload`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    #[validate(range(min = 1, message = "fileSize must be at least 1 byte"))]
    pub file_size: i64,
}

/// Response for `POST /api/recordings/{id}/complete-upload`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadResponse {
    pub recording_id: Uuid,
    pub job_id: Uuid,
    pub status: RecordingStatus,
}

/// Recording as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub mode: RecordingMode,
    pub status: RecordingStatus,
    pub object_key: String,
    pub original_filename: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recording> for RecordingResponse {
    fn from(recording: Recording) -> Self {
        RecordingResponse {
            id: recording.id,
            user_id: recording.user_id,
            title: recording.title,
            mode: recording.mode,
            status: recording.status,
            object_key: recording.object_key,
            original_filename: recording.original_filename,
            mime_type: recording.mime_type,
            file_size: recording.file_size,
            duration_seconds: recording.duration_seconds,
            error_message: recording.error_message,
            created_at: recording.created_at,
            updated_at: recording.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [
            RecordingMode::General,
            RecordingMode::Sales,
            RecordingMode::Interview,
            RecordingMode::Meeting,
        ] {
            assert_eq!(mode.to_string().parse::<RecordingMode>().unwrap(), mode);
        }
        assert!("keynote".parse::<RecordingMode>().is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RecordingStatus::Pending,
            RecordingStatus::Uploaded,
            RecordingStatus::Processing,
            RecordingStatus::Complete,
            RecordingStatus::Failed,
        ] {
            assert_eq!(
                status.to_string().parse::<RecordingStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(RecordingStatus::Processing).unwrap();
        assert_eq!(json, "processing");
        let json = serde_json::to_value(RecordingStatus::Complete).unwrap();
        assert_eq!(json, "complete");
    }

    #[test]
    fn lifecycle_helpers() {
        let mut recording = sample_recording();
        assert!(recording.awaiting_upload());
        assert!(!recording.is_terminal());

        recording.status = RecordingStatus::Failed;
        assert!(!recording.awaiting_upload());
        assert!(recording.is_terminal());
    }

    #[test]
    fn response_serializes_camel_case() {
        let response = RecordingResponse::from(sample_recording());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("objectKey").is_some());
        assert!(json.get("originalFilename").is_some());
        assert!(json.get("mimeType").is_some());
        // None fields are dropped from the payload
        assert!(json.get("durationSeconds").is_none());
    }

    #[test]
    fn create_request_accepts_camel_case_body() {
        let request: CreateRecordingRequest = serde_json::from_value(serde_json::json!({
            "title": "Test Recording",
            "mode": "general",
            "mimeType": "audio/mpeg",
        }))
        .unwrap();
        assert_eq!(request.mode, RecordingMode::General);
        assert_eq!(request.mime_type, "audio/mpeg");
    }

    fn sample_recording() -> Recording {
        let user_id = Uuid::new_v4();
        Recording {
            id: Uuid::new_v4(),
            user_id,
            title: "Test Recording".to_string(),
            mode: RecordingMode::General,
            status: RecordingStatus::Pending,
            object_key: format!("recordings/{}/test.mp3", user_id),
            original_filename: "test.mp3".to_string(),
            mime_type: "audio/mpeg".to_string(),
            file_size: Some(1024 * 1024),
            duration_seconds: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
