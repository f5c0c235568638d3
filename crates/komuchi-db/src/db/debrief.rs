use chrono::Utc;
use komuchi_core::models::{Debrief, DebriefSection};
use komuchi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for debriefs (at most one per recording)
#[derive(Clone)]
pub struct DebriefRepository {
    pool: PgPool,
}

impl DebriefRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, markdown, sections), fields(db.table = "debriefs", db.operation = "upsert", recording_id = %recording_id))]
    pub async fn create(
        &self,
        recording_id: Uuid,
        markdown: String,
        sections: &[DebriefSection],
    ) -> Result<Debrief, AppError> {
        let sections_json = serde_json::to_value(sections)?;
        let debrief = sqlx::query_as::<Postgres, Debrief>(
            r#"
            INSERT INTO debriefs (id, recording_id, markdown, sections, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (recording_id) DO UPDATE
            SET markdown = EXCLUDED.markdown,
                sections = EXCLUDED.sections
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recording_id)
        .bind(&markdown)
        .bind(sections_json)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(debrief)
    }

    pub async fn get_by_recording(&self, recording_id: Uuid) -> Result<Option<Debrief>, AppError> {
        let debrief =
            sqlx::query_as::<Postgres, Debrief>("SELECT * FROM debriefs WHERE recording_id = $1")
                .bind(recording_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(debrief)
    }
}
