//! Job queue: worker pool, LISTEN/NOTIFY plus polling, retry, and reaping.
//!
//! Shutdown: [`JobQueue::shutdown`] signals the pool to stop; it does not wait
//! for in-flight jobs. For graceful shutdown, coordinate with your runtime and
//! allow time for running jobs to finish before process exit.

use anyhow::Result;
use chrono::Utc;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;

use komuchi_core::models::{Job, JobStatus};
use komuchi_core::{Config, JobError};
use komuchi_db::{JobRepository, RecordingRepository};

use crate::context::JobHandlerContext;

/// Channel name for PostgreSQL LISTEN/NOTIFY when a new job is created.
pub const JOB_NOTIFY_CHANNEL: &str = "komuchi_new_job";

/// Maximum delay in seconds before retrying a failed job. Caps exponential
/// backoff so that high retry counts do not produce excessively long delays.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Computes backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    (2_u64.pow(retry_count as u32)).min(MAX_RETRY_BACKOFF_SECS)
}

#[derive(Clone)]
pub struct JobQueueConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub job_timeout_secs: i32,
    /// Interval in seconds between runs of the stale job reaper. 0 = disabled.
    pub reap_interval_secs: u64,
    /// Grace period in seconds added to the job timeout before a running job
    /// counts as stale.
    pub reap_grace_secs: i64,
}

impl JobQueueConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_workers: config.worker_concurrency(),
            poll_interval_ms: config.worker_poll_interval_ms(),
            job_timeout_secs: config.job_timeout_secs(),
            reap_interval_secs: config.job_reap_interval_secs(),
            reap_grace_secs: config.job_reap_grace_secs(),
        }
    }
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval_ms: 1000,
            job_timeout_secs: 600,
            reap_interval_secs: 60,
            reap_grace_secs: 300,
        }
    }
}

pub struct JobQueue {
    config: JobQueueConfig,
    shutdown_tx: mpsc::Sender<()>,
}

impl JobQueue {
    /// Create a new JobQueue with a weak reference to the dispatch context.
    ///
    /// If `pool` is `Some`, the worker uses PostgreSQL LISTEN/NOTIFY to wake
    /// immediately when jobs are created, in addition to polling at
    /// `poll_interval_ms`. If `pool` is `None`, only polling is used.
    pub fn new(
        jobs: JobRepository,
        recordings: RecordingRepository,
        config: JobQueueConfig,
        context: Weak<dyn JobHandlerContext>,
        pool: Option<sqlx::PgPool>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let config_clone = config.clone();
        tokio::spawn(async move {
            Self::worker_pool(jobs, recordings, config_clone, context, shutdown_rx, pool).await;
        });

        Self {
            config,
            shutdown_tx,
        }
    }

    async fn worker_pool(
        jobs: JobRepository,
        recordings: RecordingRepository,
        config: JobQueueConfig,
        context: Weak<dyn JobHandlerContext>,
        mut shutdown_rx: mpsc::Receiver<()>,
        pool: Option<sqlx::PgPool>,
    ) {
        let use_listen = pool.is_some();
        tracing::info!(
            max_workers = config.max_workers,
            poll_interval_ms = config.poll_interval_ms,
            listen_notify = use_listen,
            "Job queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        // Channel to wake the main loop when LISTEN receives a NOTIFY (avoids
        // blocking on recv when no pool).
        let (notify_tx, mut notify_rx) = mpsc::channel::<()>(16);
        if let Some(pool) = pool {
            let tx = notify_tx.clone();
            tokio::spawn(async move {
                loop {
                    match sqlx::postgres::PgListener::connect_with(&pool).await {
                        Ok(mut listener) => {
                            if let Err(e) = listener.listen(JOB_NOTIFY_CHANNEL).await {
                                tracing::warn!(error = %e, "LISTEN failed, will retry");
                                tokio::time::sleep(Duration::from_secs(5)).await;
                                continue;
                            }
                            while listener.recv().await.is_ok() {
                                let _ = tx.send(()).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "PgListener connect failed, will retry");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
            });
        }

        // Spawn stale job reaper (if interval > 0)
        let (reaper_shutdown_tx, mut reaper_shutdown_rx) = mpsc::channel::<()>(1);
        if config.reap_interval_secs > 0 {
            let jobs_for_reaper = jobs.clone();
            let recordings_for_reaper = recordings.clone();
            let reap_interval = Duration::from_secs(config.reap_interval_secs);
            let stale_after_secs = config.job_timeout_secs as i64 + config.reap_grace_secs;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(reap_interval);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::reap_stale_jobs(
                                &jobs_for_reaper,
                                &recordings_for_reaper,
                                stale_after_secs,
                            ).await;
                        }
                        _ = reaper_shutdown_rx.recv() => break,
                    }
                }
            });
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Job queue worker pool shutting down");
                    let _ = reaper_shutdown_tx.send(()).await;
                    break;
                }
                _ = notify_rx.recv() => {
                    Self::claim_and_dispatch_one(
                        &jobs,
                        &recordings,
                        &config,
                        &semaphore,
                        &context,
                    ).await;
                }
                _ = sleep(poll_interval) => {
                    Self::claim_and_dispatch_one(
                        &jobs,
                        &recordings,
                        &config,
                        &semaphore,
                        &context,
                    ).await;
                }
            }
        }

        tracing::info!("Job queue worker pool stopped");
    }

    async fn reap_stale_jobs(
        jobs: &JobRepository,
        recordings: &RecordingRepository,
        stale_after_secs: i64,
    ) {
        let reaped = match jobs.reap_stale(stale_after_secs).await {
            Ok(reaped) => reaped,
            Err(e) => {
                tracing::error!(error = %e, "Stale job reaper failed");
                return;
            }
        };

        for job in reaped {
            tracing::warn!(
                job_id = %job.id,
                job_type = %job.job_type,
                status = %job.status,
                retry_count = job.retry_count,
                "Reaped stale job"
            );
            if job.status == JobStatus::Failed {
                let message = job
                    .error
                    .clone()
                    .unwrap_or_else(|| "Job timed out".to_string());
                if let Err(e) = recordings.set_failure(job.recording_id, message).await {
                    tracing::error!(
                        error = %e,
                        recording_id = %job.recording_id,
                        "Failed to mark recording failed for reaped job"
                    );
                }
            }
        }
    }

    async fn claim_and_dispatch_one(
        jobs: &JobRepository,
        recordings: &RecordingRepository,
        config: &JobQueueConfig,
        semaphore: &Arc<Semaphore>,
        context: &Weak<dyn JobHandlerContext>,
    ) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("No workers available, skipping claim");
                return;
            }
        };

        match jobs.claim_next().await {
            Ok(Some(job)) => {
                let jobs = jobs.clone();
                let recordings = recordings.clone();
                let timeout_secs = config.job_timeout_secs;
                let ctx = context.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) =
                        Self::process_job_with_retry(job, jobs, recordings, timeout_secs, ctx)
                            .await
                    {
                        tracing::error!(error = %e, "Job processing failed after retries");
                    }
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No jobs available in queue");
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to claim job from queue");
            }
        }
    }

    #[tracing::instrument(skip(jobs, recordings, context), fields(job.id = %job.id, job.job_type = %job.job_type))]
    async fn process_job_with_retry(
        job: Job,
        jobs: JobRepository,
        recordings: RecordingRepository,
        timeout_secs: i32,
        context: Weak<dyn JobHandlerContext>,
    ) -> Result<()> {
        let ctx = context
            .upgrade()
            .ok_or_else(|| anyhow::anyhow!("JobHandlerContext was dropped, cannot process job"))?;

        let timeout_duration = Duration::from_secs(timeout_secs.max(1) as u64);
        let result = tokio::time::timeout(timeout_duration, ctx.dispatch_job(&job)).await;

        match result {
            Ok(Ok(())) => {
                if jobs
                    .update_status(job.id, JobStatus::Complete)
                    .await?
                    .is_none()
                {
                    tracing::warn!(job_id = %job.id, "Job disappeared before completion was recorded");
                }
                tracing::info!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    "Job completed successfully"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                let is_unrecoverable = e
                    .downcast_ref::<JobError>()
                    .map(|je| !je.is_recoverable())
                    .unwrap_or(false);

                tracing::error!(
                    job_id = %job.id,
                    error = %e,
                    retry_count = job.retry_count,
                    max_retries = job.max_retries,
                    unrecoverable = is_unrecoverable,
                    "Job execution failed"
                );

                // Don't retry when the handler marked the failure unrecoverable
                if is_unrecoverable {
                    Self::fail_job_and_recording(&jobs, &recordings, &job, e.to_string()).await?;
                    tracing::error!(
                        job_id = %job.id,
                        "Job failed with unrecoverable error, will not retry"
                    );
                    return Err(e);
                }

                if job.can_retry() {
                    let backoff_seconds = compute_retry_backoff_seconds(job.retry_count);
                    let run_at = Utc::now() + chrono::Duration::seconds(backoff_seconds as i64);
                    tracing::info!(
                        job_id = %job.id,
                        retry_count = job.retry_count + 1,
                        backoff_seconds,
                        "Scheduling job retry"
                    );
                    jobs.increment_retry(job.id, e.to_string(), run_at).await?;
                    Ok(())
                } else {
                    Self::fail_job_and_recording(&jobs, &recordings, &job, e.to_string()).await?;
                    tracing::error!(job_id = %job.id, "Job failed after max retries");
                    Err(e)
                }
            }
            Err(_) => {
                tracing::error!(
                    job_id = %job.id,
                    timeout_secs,
                    "Job execution timed out"
                );
                if job.can_retry() {
                    let backoff_seconds = compute_retry_backoff_seconds(job.retry_count);
                    let run_at = Utc::now() + chrono::Duration::seconds(backoff_seconds as i64);
                    jobs.increment_retry(job.id, "Job execution timed out".to_string(), run_at)
                        .await?;
                    Ok(())
                } else {
                    Self::fail_job_and_recording(
                        &jobs,
                        &recordings,
                        &job,
                        "Job execution timed out".to_string(),
                    )
                    .await?;
                    Err(anyhow::anyhow!("Job execution timed out"))
                }
            }
        }
    }

    /// Terminal failure: the job goes failed and so does its recording, with
    /// the error surfaced in `error_message`.
    async fn fail_job_and_recording(
        jobs: &JobRepository,
        recordings: &RecordingRepository,
        job: &Job,
        error: String,
    ) -> Result<()> {
        jobs.mark_failed(job.id, error.clone()).await?;
        recordings.set_failure(job.recording_id, error).await?;
        Ok(())
    }

    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    /// Signals the worker pool to stop claiming new jobs and exit the main
    /// loop.
    ///
    /// Returns immediately after sending the signal; it does **not** wait for
    /// in-flight jobs to complete. Already-spawned handlers continue running
    /// until they finish or time out.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating job queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Clone for JobQueue {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}
