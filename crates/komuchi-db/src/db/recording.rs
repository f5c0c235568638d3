use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use komuchi_core::models::{Recording, RecordingMode, RecordingStatus};
use komuchi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for recordings and their upload lifecycle
///
/// Status transitions themselves are not validated here; services check the
/// current status before calling the transition methods. Methods that guard
/// on status in SQL (`complete_upload`) return `None` when the guard fails so
/// callers can distinguish a lost race from a missing row.
#[derive(Clone)]
pub struct RecordingRepository {
    pool: PgPool,
}

impl RecordingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, title), fields(db.table = "recordings", db.operation = "insert", db.record_id = %id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: String,
        mode: RecordingMode,
        mime_type: String,
        object_key: String,
        original_filename: String,
    ) -> Result<Recording, AppError> {
        let now = Utc::now();
        let recording = sqlx::query_as::<Postgres, Recording>(
            r#"
            INSERT INTO recordings (
                id, user_id, title, mode, status, mime_type,
                object_key, original_filename, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&title)
        .bind(mode)
        .bind(&mime_type)
        .bind(&object_key)
        .bind(&original_filename)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(recording)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Recording>, AppError> {
        let recording =
            sqlx::query_as::<Postgres, Recording>("SELECT * FROM recordings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(recording)
    }

    /// Owner-scoped fetch; another user's recording reads as absent.
    pub async fn get_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            "SELECT * FROM recordings WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "select"))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
        status: Option<RecordingStatus>,
    ) -> Result<(Vec<Recording>, i64), AppError> {
        let (recordings, total) = match status {
            None => {
                let rows = sqlx::query_as::<Postgres, Recording>(
                    "SELECT * FROM recordings WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM recordings WHERE user_id = $1")
                        .bind(user_id)
                        .fetch_one(&self.pool)
                        .await?;
                (rows, total)
            }
            Some(status) => {
                let rows = sqlx::query_as::<Postgres, Recording>(
                    "SELECT * FROM recordings WHERE user_id = $1 AND status = $2 ORDER BY created_at DESC LIMIT $3 OFFSET $4",
                )
                .bind(user_id)
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM recordings WHERE user_id = $1 AND status = $2",
                )
                .bind(user_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
                (rows, total)
            }
        };

        Ok((recordings, total))
    }

    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "update", db.record_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: RecordingStatus,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            "UPDATE recordings SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    pub async fn set_object_key(
        &self,
        id: Uuid,
        object_key: String,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            "UPDATE recordings SET object_key = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(object_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    /// Transition `pending` -> `uploaded` and record the object size. Returns
    /// `None` when the recording is missing or no longer pending.
    #[tracing::instrument(skip(self), fields(db.table = "recordings", db.operation = "update", db.record_id = %id))]
    pub async fn complete_upload(
        &self,
        id: Uuid,
        file_size: i64,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            r#"
            UPDATE recordings
            SET status = 'uploaded', file_size = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(file_size)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    pub async fn set_duration(
        &self,
        id: Uuid,
        duration_seconds: f64,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            "UPDATE recordings SET duration_seconds = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(duration_seconds)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    #[tracing::instrument(skip(self, message), fields(db.table = "recordings", db.operation = "update", db.record_id = %id))]
    pub async fn set_failure(
        &self,
        id: Uuid,
        message: String,
    ) -> Result<Option<Recording>, AppError> {
        let recording = sqlx::query_as::<Postgres, Recording>(
            r#"
            UPDATE recordings
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recording)
    }

    /// Complete recordings created on the given calendar day (UTC), oldest
    /// first. Used to assemble day-level chat context.
    pub async fn list_complete_for_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Recording>, AppError> {
        let day_start: DateTime<Utc> = NaiveDateTime::new(date, NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let recordings = sqlx::query_as::<Postgres, Recording>(
            r#"
            SELECT * FROM recordings
            WHERE user_id = $1 AND status = 'complete'
              AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(recordings)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM recordings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
