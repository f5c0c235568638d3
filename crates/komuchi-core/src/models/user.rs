use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Dimension of speaker embeddings produced by the diarization service.
pub const VOICE_EMBEDDING_DIM: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub has_voice_profile: bool,
    /// Speaker embedding from voice enrollment, [VOICE_EMBEDDING_DIM] floats.
    /// Stored as JSONB; None until the user enrolls.
    pub voice_embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for User {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let voice_embedding = row
            .get::<Option<serde_json::Value>, _>("voice_embedding")
            .map(|value| {
                serde_json::from_value::<Vec<f32>>(value).map_err(|e| {
                    sqlx::Error::Decode(format!("Failed to parse voice_embedding: {}", e).into())
                })
            })
            .transpose()?;
        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            has_voice_profile: row.get("has_voice_profile"),
            voice_embedding,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

/// User as returned by the API. The voice embedding never leaves the server.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub has_voice_profile: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            has_voice_profile: user.has_voice_profile,
            created_at: user.created_at,
        }
    }
}

/// Response for `GET /api/voice-profile/status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfileStatusResponse {
    pub has_voice_profile: bool,
}
