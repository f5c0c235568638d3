//! Application state shared across handlers.
//!
//! `AppState` is held behind an `Arc` by the router; handlers pull out the
//! slice they need via `FromRef` so tests can construct narrow states.

use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use komuchi_cache::Cache;
use komuchi_core::Config;
use komuchi_db::UserRepository;
use komuchi_services::{ChatService, RecordingService, VoiceProfileService};
use komuchi_storage::Storage;
use komuchi_worker::{JobContext, JobQueue};

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub users: UserRepository,
}

/// State for recording endpoints.
#[derive(Clone)]
pub struct RecordingsState {
    pub service: RecordingService,
}

/// State for chat endpoints.
#[derive(Clone)]
pub struct ChatState {
    pub service: ChatService,
}

/// State for voice profile endpoints.
#[derive(Clone)]
pub struct VoiceProfileState {
    pub service: VoiceProfileService,
}

/// State for health and readiness probes.
#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub cache: Arc<dyn Cache>,
    pub storage: Arc<dyn Storage>,
    pub started_at: Instant,
}

/// Background job queue handle plus the strong dispatch context that keeps
/// the queue's weak reference alive for the lifetime of the process.
#[derive(Clone)]
pub struct WorkerState {
    pub queue: Arc<JobQueue>,
    pub context: Arc<JobContext>,
}

/// Aggregated application state. Tests leave `worker` as `None` and drive
/// job dispatch directly instead of running the queue.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthState,
    pub recordings: RecordingsState,
    pub chat: ChatState,
    pub voice_profile: VoiceProfileState,
    pub health: HealthState,
    pub worker: Option<WorkerState>,
}

impl axum::extract::FromRef<Arc<AppState>> for AuthState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for RecordingsState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.recordings.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for ChatState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.chat.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for VoiceProfileState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.voice_profile.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for HealthState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.health.clone()
    }
}

// Compile-time check that AppState can be shared across tasks.
#[allow(dead_code)]
fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
