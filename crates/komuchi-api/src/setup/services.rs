//! Service graph construction.
//!
//! Builds the repositories over the shared pool, the provider backends
//! selected by configuration, the business services, and the job queue with
//! its dispatch context. The strong `JobContext` lives in `WorkerState` so
//! the queue's weak reference stays upgradeable for the process lifetime.

use std::sync::{Arc, Weak};
use std::time::Instant;

use anyhow::{Context, Result};
use sqlx::PgPool;

use komuchi_ai::{
    create_chat_provider, create_debrief_provider, create_transcription_provider,
    create_voice_embedding_client,
};
use komuchi_cache::Cache;
use komuchi_core::Config;
use komuchi_db::{
    ChatRepository, DebriefRepository, JobRepository, RecordingRepository, TranscriptRepository,
    UserRepository,
};
use komuchi_services::{
    ChatService, ContextService, JobService, RecordingService, VoiceProfileService,
};
use komuchi_storage::Storage;
use komuchi_worker::{JobContext, JobHandlerContext, JobQueue, JobQueueConfig};

use crate::state::{
    AppState, AuthState, ChatState, HealthState, RecordingsState, VoiceProfileState, WorkerState,
};

pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
    cache: Arc<dyn Cache>,
) -> Result<Arc<AppState>> {
    let users = UserRepository::new(pool.clone());
    let recordings = RecordingRepository::new(pool.clone());
    let transcripts = TranscriptRepository::new(pool.clone());
    let debriefs = DebriefRepository::new(pool.clone());
    let jobs = JobRepository::new(pool.clone());
    let chat_sessions = ChatRepository::new(pool.clone());

    let transcription = create_transcription_provider(config)
        .context("Failed to initialize transcription provider")?;
    let debrief =
        create_debrief_provider(config).context("Failed to initialize debrief provider")?;
    let chat_provider = create_chat_provider(config).context("Failed to initialize chat provider")?;
    let voice_embeddings = create_voice_embedding_client(config)
        .context("Failed to initialize voice embedding client")?;

    let job_service = JobService::new(jobs.clone(), config.job_max_retries());
    let recording_service = RecordingService::new(
        recordings.clone(),
        job_service.clone(),
        storage.clone(),
        config.upload_url_expiry_secs(),
    );
    let context_service =
        ContextService::new(recordings.clone(), transcripts.clone(), debriefs.clone());
    let chat_service = ChatService::new(
        chat_sessions,
        recordings.clone(),
        context_service,
        chat_provider,
    );
    let voice_profile_service = VoiceProfileService::new(users.clone(), voice_embeddings);

    let job_context = Arc::new(JobContext {
        recordings: recordings.clone(),
        transcripts,
        debriefs,
        jobs: job_service,
        storage: storage.clone(),
        transcription,
        debrief,
    });
    let queue_context: Weak<dyn JobHandlerContext> =
        Arc::downgrade(&(job_context.clone() as Arc<dyn JobHandlerContext>));
    let queue = Arc::new(JobQueue::new(
        jobs,
        recordings,
        JobQueueConfig::from_config(config),
        queue_context,
        Some(pool.clone()),
    ));

    tracing::info!(
        max_workers = queue.max_workers(),
        transcription_provider = %config.transcription_provider(),
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        auth: AuthState { users },
        recordings: RecordingsState {
            service: recording_service,
        },
        chat: ChatState {
            service: chat_service,
        },
        voice_profile: VoiceProfileState {
            service: voice_profile_service,
        },
        health: HealthState {
            pool,
            cache,
            storage,
            started_at: Instant::now(),
        },
        worker: Some(WorkerState {
            queue,
            context: job_context,
        }),
    }))
}
