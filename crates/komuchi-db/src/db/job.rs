use chrono::{DateTime, Duration, Utc};
use komuchi_core::models::{Job, JobStatus, JobType};
use komuchi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for background job bookkeeping
///
/// Claiming uses `FOR UPDATE SKIP LOCKED` so concurrent workers never hand
/// the same job to two handlers. A trigger on `jobs` fires
/// `NOTIFY komuchi_new_job` on insert, which the queue listens on to cut
/// pickup latency below the polling interval.
#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "insert", recording_id = %recording_id, job_type = %job_type))]
    pub async fn create(
        &self,
        recording_id: Uuid,
        job_type: JobType,
        max_retries: i32,
    ) -> Result<Job, AppError> {
        let now = Utc::now();
        let job = sqlx::query_as::<Postgres, Job>(
            r#"
            INSERT INTO jobs (
                id, recording_id, job_type, status, retry_count, max_retries,
                scheduled_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, 'pending', 0, $4, $5, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recording_id)
        .bind(job_type)
        .bind(max_retries)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    pub async fn list_by_recording(&self, recording_id: Uuid) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<Postgres, Job>(
            "SELECT * FROM jobs WHERE recording_id = $1 ORDER BY created_at ASC",
        )
        .bind(recording_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    /// Update the status, stamping `started_at` on `running` and
    /// `completed_at` on the terminal states.
    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "update", db.record_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
    ) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>(
            r#"
            UPDATE jobs
            SET status = $2,
                started_at = CASE WHEN $2 = 'running' THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $2 IN ('complete', 'failed') THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    #[tracing::instrument(skip(self, error), fields(db.table = "jobs", db.operation = "update", db.record_id = %id))]
    pub async fn mark_failed(&self, id: Uuid, error: String) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>(
            r#"
            UPDATE jobs
            SET status = 'failed', error = $2, completed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    /// True when a pending or running job of this type exists for the
    /// recording. Guards against double enqueues from repeated requests.
    pub async fn has_active(
        &self,
        recording_id: Uuid,
        job_type: JobType,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM jobs
                WHERE recording_id = $1 AND job_type = $2
                  AND status IN ('pending', 'running')
            )
            "#,
        )
        .bind(recording_id)
        .bind(job_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Atomically claim the next due pending job: mark it running and stamp
    /// `started_at` in the same statement. Returns `None` when nothing is due.
    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "claim"))]
    pub async fn claim_next(&self) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>(
            r#"
            UPDATE jobs
            SET status = 'running', started_at = NOW(), updated_at = NOW()
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'pending' AND scheduled_at <= NOW()
                ORDER BY scheduled_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    /// Put a failed attempt back in the queue with its retry counter bumped
    /// and the next run deferred to `run_at`.
    #[tracing::instrument(skip(self, error), fields(db.table = "jobs", db.operation = "update", db.record_id = %id))]
    pub async fn increment_retry(
        &self,
        id: Uuid,
        error: String,
        run_at: DateTime<Utc>,
    ) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<Postgres, Job>(
            r#"
            UPDATE jobs
            SET status = 'pending', retry_count = retry_count + 1, error = $2,
                scheduled_at = $3, started_at = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(run_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    /// Recover jobs whose worker died mid-run: anything still `running` past
    /// the grace cutoff goes back to `pending` with a bumped retry counter,
    /// or to `failed` once retries are exhausted. Returns the affected jobs.
    #[tracing::instrument(skip(self), fields(db.table = "jobs", db.operation = "reap"))]
    pub async fn reap_stale(&self, stale_after_secs: i64) -> Result<Vec<Job>, AppError> {
        let cutoff = Utc::now() - Duration::seconds(stale_after_secs);
        let jobs = sqlx::query_as::<Postgres, Job>(
            r#"
            UPDATE jobs
            SET status       = CASE WHEN retry_count < max_retries THEN 'pending' ELSE 'failed' END,
                retry_count  = CASE WHEN retry_count < max_retries THEN retry_count + 1 ELSE retry_count END,
                error        = CASE WHEN retry_count < max_retries THEN error
                                    ELSE COALESCE(error, 'job timed out') END,
                started_at   = CASE WHEN retry_count < max_retries THEN NULL ELSE started_at END,
                completed_at = CASE WHEN retry_count < max_retries THEN NULL ELSE NOW() END,
                scheduled_at = CASE WHEN retry_count < max_retries THEN NOW() ELSE scheduled_at END,
                updated_at   = NOW()
            WHERE status = 'running' AND started_at < $1
            RETURNING *
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }
}
