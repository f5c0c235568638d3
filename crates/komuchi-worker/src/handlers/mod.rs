//! Job handlers, one module per job type, dispatched through [`JobContext`].

mod debrief;
mod transcribe;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use komuchi_ai::{DebriefProvider, TranscriptionProvider};
use komuchi_core::models::{Job, JobType};
use komuchi_db::{DebriefRepository, RecordingRepository, TranscriptRepository};
use komuchi_services::JobService;
use komuchi_storage::Storage;

use crate::context::JobHandlerContext;

/// Everything a job handler needs: repositories, storage, and AI providers.
///
/// The queue holds this behind a `Weak` reference; the application owns the
/// strong `Arc`, so dropping the application context stops dispatch.
pub struct JobContext {
    pub recordings: RecordingRepository,
    pub transcripts: TranscriptRepository,
    pub debriefs: DebriefRepository,
    pub jobs: JobService,
    pub storage: Arc<dyn Storage>,
    pub transcription: Arc<dyn TranscriptionProvider>,
    pub debrief: Arc<dyn DebriefProvider>,
}

#[async_trait]
impl JobHandlerContext for JobContext {
    async fn dispatch_job(self: Arc<Self>, job: &Job) -> Result<()> {
        match job.job_type {
            JobType::Transcribe => transcribe::run(&self, job).await,
            JobType::Debrief => debrief::run(&self, job).await,
        }
    }
}
