use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One diarized span of the transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub text: String,
    /// Diarization label ("speaker_0", "speaker_1", ...) when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// Transcript of a recording. One per recording; re-transcription replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Transcript {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let segments = serde_json::from_value(row.get::<serde_json::Value, _>("segments"))
            .map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse transcript segments: {}", e).into())
            })?;
        Ok(Transcript {
            id: row.get("id"),
            recording_id: row.get("recording_id"),
            text: row.get("text"),
            segments,
            language: row.get("language"),
            created_at: row.get("created_at"),
        })
    }
}

/// Transcript as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl From<Transcript> for TranscriptResponse {
    fn from(transcript: Transcript) -> Self {
        TranscriptResponse {
            id: transcript.id,
            recording_id: transcript.recording_id,
            text: transcript.text,
            segments: transcript.segments,
            language: transcript.language,
            created_at: transcript.created_at,
        }
    }
}
