use chrono::Utc;
use komuchi_core::models::{Transcript, TranscriptSegment};
use komuchi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for transcripts (at most one per recording)
#[derive(Clone)]
pub struct TranscriptRepository {
    pool: PgPool,
}

impl TranscriptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert keyed on `recording_id`; a re-run transcription job replaces
    /// the previous transcript instead of failing on the unique constraint.
    #[tracing::instrument(skip(self, text, segments), fields(db.table = "transcripts", db.operation = "upsert", recording_id = %recording_id))]
    pub async fn create(
        &self,
        recording_id: Uuid,
        text: String,
        segments: &[TranscriptSegment],
        language: String,
    ) -> Result<Transcript, AppError> {
        let segments_json = serde_json::to_value(segments)?;
        let transcript = sqlx::query_as::<Postgres, Transcript>(
            r#"
            INSERT INTO transcripts (id, recording_id, text, segments, language, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (recording_id) DO UPDATE
            SET text = EXCLUDED.text,
                segments = EXCLUDED.segments,
                language = EXCLUDED.language
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recording_id)
        .bind(&text)
        .bind(segments_json)
        .bind(&language)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(transcript)
    }

    pub async fn get_by_recording(
        &self,
        recording_id: Uuid,
    ) -> Result<Option<Transcript>, AppError> {
        let transcript = sqlx::query_as::<Postgres, Transcript>(
            "SELECT * FROM transcripts WHERE recording_id = $1",
        )
        .bind(recording_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transcript)
    }

    /// Batch fetch for a set of recordings in one query (avoids N+1 when
    /// aggregating day context).
    pub async fn get_by_recordings(
        &self,
        recording_ids: &[Uuid],
    ) -> Result<Vec<Transcript>, AppError> {
        let transcripts = sqlx::query_as::<Postgres, Transcript>(
            "SELECT * FROM transcripts WHERE recording_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(recording_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(transcripts)
    }
}
