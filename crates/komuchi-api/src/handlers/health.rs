//! Health, readiness, and detailed diagnostics endpoints.
//!
//! `/api/health` is a pure liveness probe. `/api/ready` runs dependency
//! checks (database, redis, storage) with a bounded timeout and reports a
//! rolled-up status; it always answers HTTP 200 so that probes read the body
//! rather than the status code. `/api/health/detailed` adds the effective
//! configuration and process memory for operators.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::System;

use crate::state::{AppState, HealthState};

const SERVICE_NAME: &str = "komuchi-api";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResult {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckResult {
    fn healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
struct Checks {
    database: CheckResult,
    redis: CheckResult,
    storage: CheckResult,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime: f64,
    timestamp: DateTime<Utc>,
    checks: Checks,
}

#[derive(Debug, Serialize)]
struct DetailedHealthResponse {
    #[serde(flatten)]
    ready: ReadyResponse,
    config: ConfigSummary,
    memory: MemorySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigSummary {
    environment: String,
    port: u16,
    rate_limit: RateLimitSummary,
    #[serde(rename = "maxUploadSizeMB")]
    max_upload_size_mb: usize,
    transcription_provider: String,
    storage_backend: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitSummary {
    max: i64,
    window_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MemorySummary {
    rss: u64,
    system_used: u64,
    system_total: u64,
}

pub async fn health_check(State(health): State<HealthState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: VERSION,
        uptime: health.started_at.elapsed().as_secs_f64(),
        timestamp: Utc::now(),
    })
}

pub async fn readiness_check(State(health): State<HealthState>) -> impl IntoResponse {
    Json(run_readiness(&health).await)
}

pub async fn detailed_health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ready = run_readiness(&state.health).await;
    let config = &state.config;

    Json(DetailedHealthResponse {
        ready,
        config: ConfigSummary {
            environment: config.environment().to_string(),
            port: config.api_port(),
            rate_limit: RateLimitSummary {
                max: config.rate_limit_max(),
                window_ms: config.rate_limit_window_ms(),
            },
            max_upload_size_mb: config.max_upload_size_mb(),
            transcription_provider: config.transcription_provider().to_string(),
            storage_backend: config.storage_backend().to_string(),
        },
        memory: memory_summary(),
    })
}

async fn run_readiness(health: &HealthState) -> ReadyResponse {
    let pool = health.pool.clone();
    let database =
        run_check(async move { sqlx::query("SELECT 1").execute(&pool).await.map(drop) }).await;

    let cache = health.cache.clone();
    let redis = run_check(async move { cache.ping().await }).await;

    let storage_handle = health.storage.clone();
    let storage = run_check(async move {
        storage_handle
            .exists("health-check-non-existent-key")
            .await
            .map(drop)
    })
    .await;

    ReadyResponse {
        status: overall_status(&database, &redis, &storage),
        service: SERVICE_NAME,
        version: VERSION,
        uptime: health.started_at.elapsed().as_secs_f64(),
        timestamp: Utc::now(),
        checks: Checks {
            database,
            redis,
            storage,
        },
    }
}

// Database failure is fatal; cache or storage failure only degrades.
fn overall_status(database: &CheckResult, redis: &CheckResult, storage: &CheckResult) -> &'static str {
    if !database.healthy() {
        "unhealthy"
    } else if !redis.healthy() || !storage.healthy() {
        "degraded"
    } else {
        "ok"
    }
}

async fn run_check<F, E>(check: F) -> CheckResult
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    let started = Instant::now();
    match tokio::time::timeout(CHECK_TIMEOUT, check).await {
        Ok(Ok(())) => CheckResult {
            status: "healthy",
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Ok(Err(error)) => CheckResult {
            status: "unhealthy",
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: Some(error.to_string()),
        },
        Err(_) => CheckResult {
            status: "unhealthy",
            latency_ms: None,
            error: Some(format!("timed out after {:?}", CHECK_TIMEOUT)),
        },
    }
}

fn memory_summary() -> MemorySummary {
    let mut system = System::new();
    system.refresh_memory();

    let mut rss = 0;
    if let Ok(pid) = sysinfo::get_current_pid() {
        if system.refresh_process(pid) {
            if let Some(process) = system.process(pid) {
                rss = process.memory();
            }
        }
    }

    MemorySummary {
        rss,
        system_used: system.used_memory(),
        system_total: system.total_memory(),
    }
}
