use uuid::Uuid;

use komuchi_core::models::{Job, JobStatus, JobType};
use komuchi_core::AppError;
use komuchi_db::JobRepository;

/// Background job bookkeeping: creation, status transitions, and activity
/// checks. The worker claims and executes jobs through its own queue; this
/// service is the API-facing view.
#[derive(Clone)]
pub struct JobService {
    jobs: JobRepository,
    max_retries: i32,
}

impl JobService {
    pub fn new(jobs: JobRepository, max_retries: i32) -> Self {
        Self { jobs, max_retries }
    }

    /// Queue a new job for a recording. The insert fires the Postgres NOTIFY
    /// that wakes the worker.
    #[tracing::instrument(skip(self), fields(recording_id = %recording_id, job_type = %job_type))]
    pub async fn create_job(&self, recording_id: Uuid, job_type: JobType) -> Result<Job, AppError> {
        let job = self
            .jobs
            .create(recording_id, job_type, self.max_retries)
            .await?;
        tracing::info!(job_id = %job.id, "Job queued");
        Ok(job)
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        self.jobs.get(id).await
    }

    pub async fn get_jobs_by_recording(&self, recording_id: Uuid) -> Result<Vec<Job>, AppError> {
        self.jobs.list_by_recording(recording_id).await
    }

    pub async fn update_job_status(&self, id: Uuid, status: JobStatus) -> Result<Job, AppError> {
        self.jobs
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", id)))
    }

    pub async fn mark_job_failed(&self, id: Uuid, error: String) -> Result<Job, AppError> {
        self.jobs
            .mark_failed(id, error)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", id)))
    }

    /// Whether a pending or running job of this type exists for the recording.
    pub async fn has_active_job(
        &self,
        recording_id: Uuid,
        job_type: JobType,
    ) -> Result<bool, AppError> {
        self.jobs.has_active(recording_id, job_type).await
    }
}
