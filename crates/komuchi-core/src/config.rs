//! Configuration module
//!
//! This module provides configuration structures for the API and worker,
//! including database, cache, storage, AI provider, and rate limit settings.
//! All values come from the environment; `.env` files are honored via dotenvy.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// AI provider selection for transcription, debrief, and chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(anyhow::anyhow!("Invalid provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

/// Base configuration shared by the API server and the worker
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub api_host: String,
    pub api_port: u16,
    pub cors_origin: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Komuchi backend configuration
#[derive(Clone, Debug)]
pub struct KomuchiConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub redis_url: String,
    // Rate limiting (fixed window per user)
    pub rate_limit_max: i64,
    pub rate_limit_window_ms: u64,
    // Upload configuration
    pub max_upload_size_mb: usize,
    pub upload_url_expiry_secs: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub local_storage_path: String,
    // AI provider configuration
    pub transcription_provider: ProviderKind,
    pub debrief_provider: ProviderKind,
    pub chat_provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub diarization_service_url: Option<String>,
    // Job queue configuration
    pub worker_concurrency: usize,
    pub worker_poll_interval_ms: u64,
    pub job_max_retries: i32,
    pub job_timeout_secs: i32,
    /// Interval in seconds between runs of the stale job reaper. 0 = disabled.
    pub job_reap_interval_secs: u64,
    /// Grace period in seconds added to job timeout before reaping stale running jobs.
    pub job_reap_grace_secs: i64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<KomuchiConfig>);

impl Config {
    fn inner(&self) -> &KomuchiConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = KomuchiConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    // Convenience getters for common fields
    pub fn api_host(&self) -> &str {
        &self.inner().base.api_host
    }

    pub fn api_port(&self) -> u16 {
        self.inner().base.api_port
    }

    pub fn cors_origin(&self) -> &str {
        &self.inner().base.cors_origin
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn redis_url(&self) -> &str {
        &self.inner().redis_url
    }

    pub fn rate_limit_max(&self) -> i64 {
        self.inner().rate_limit_max
    }

    pub fn rate_limit_window_ms(&self) -> u64 {
        self.inner().rate_limit_window_ms
    }

    pub fn max_upload_size_mb(&self) -> usize {
        self.inner().max_upload_size_mb
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_mb * 1024 * 1024
    }

    pub fn upload_url_expiry_secs(&self) -> u64 {
        self.inner().upload_url_expiry_secs
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> &str {
        &self.inner().s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn s3_access_key_id(&self) -> Option<&str> {
        self.inner().s3_access_key_id.as_deref()
    }

    pub fn s3_secret_access_key(&self) -> Option<&str> {
        self.inner().s3_secret_access_key.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.inner().local_storage_path
    }

    pub fn transcription_provider(&self) -> ProviderKind {
        self.inner().transcription_provider
    }

    pub fn debrief_provider(&self) -> ProviderKind {
        self.inner().debrief_provider
    }

    pub fn chat_provider(&self) -> ProviderKind {
        self.inner().chat_provider
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.inner().openai_api_key.as_deref()
    }

    pub fn openai_base_url(&self) -> &str {
        &self.inner().openai_base_url
    }

    pub fn diarization_service_url(&self) -> Option<&str> {
        self.inner().diarization_service_url.as_deref()
    }

    pub fn worker_concurrency(&self) -> usize {
        self.inner().worker_concurrency
    }

    pub fn worker_poll_interval_ms(&self) -> u64 {
        self.inner().worker_poll_interval_ms
    }

    pub fn job_max_retries(&self) -> i32 {
        self.inner().job_max_retries
    }

    pub fn job_timeout_secs(&self) -> i32 {
        self.inner().job_timeout_secs
    }

    pub fn job_reap_interval_secs(&self) -> u64 {
        self.inner().job_reap_interval_secs
    }

    pub fn job_reap_grace_secs(&self) -> i64 {
        self.inner().job_reap_grace_secs
    }
}

impl KomuchiConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const API_PORT: u16 = 3001;
        const RATE_LIMIT_MAX: i64 = 100;
        const RATE_LIMIT_WINDOW_MS: u64 = 60_000;
        const MAX_UPLOAD_SIZE_MB: usize = 500;
        const UPLOAD_URL_EXPIRY_SECS: u64 = 900;
        const WORKER_CONCURRENCY: usize = 4;
        const WORKER_POLL_INTERVAL_MS: u64 = 1000;
        const JOB_MAX_RETRIES: i32 = 3;
        const JOB_TIMEOUT_SECS: i32 = 600;
        const JOB_REAP_INTERVAL_SECS: u64 = 60;
        const JOB_REAP_GRACE_SECS: i64 = 300;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origin.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGIN cannot be '*' in production. Please specify an explicit origin."
            ));
        }

        let base = BaseConfig {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| API_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid number"))?,
            cors_origin,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let transcription_provider = env::var("TRANSCRIPTION_PROVIDER")
            .unwrap_or_else(|_| "openai".to_string())
            .parse::<ProviderKind>()?;
        let debrief_provider = env::var("DEBRIEF_PROVIDER")
            .unwrap_or_else(|_| "openai".to_string())
            .parse::<ProviderKind>()?;
        let chat_provider = env::var("CHAT_PROVIDER")
            .unwrap_or_else(|_| "openai".to_string())
            .parse::<ProviderKind>()?;

        Ok(Self {
            base,
            database_url,
            redis_url,
            rate_limit_max: env::var("RATE_LIMIT_MAX")
                .unwrap_or_else(|_| RATE_LIMIT_MAX.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_MAX),
            rate_limit_window_ms: env::var("RATE_LIMIT_WINDOW_MS")
                .unwrap_or_else(|_| RATE_LIMIT_WINDOW_MS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_WINDOW_MS),
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_UPLOAD_SIZE_MB),
            upload_url_expiry_secs: env::var("UPLOAD_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| UPLOAD_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_URL_EXPIRY_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_access_key_id: env::var("S3_ACCESS_KEY_ID").ok(),
            s3_secret_access_key: env::var("S3_SECRET_ACCESS_KEY").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/storage".to_string()),
            transcription_provider,
            debrief_provider,
            chat_provider,
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            diarization_service_url: env::var("DIARIZATION_SERVICE_URL").ok(),
            worker_concurrency: env::var("WORKER_CONCURRENCY")
                .unwrap_or_else(|_| WORKER_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(WORKER_CONCURRENCY),
            worker_poll_interval_ms: env::var("WORKER_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| WORKER_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(WORKER_POLL_INTERVAL_MS),
            job_max_retries: env::var("JOB_MAX_RETRIES")
                .unwrap_or_else(|_| JOB_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(JOB_MAX_RETRIES),
            job_timeout_secs: env::var("JOB_TIMEOUT_SECS")
                .unwrap_or_else(|_| JOB_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(JOB_TIMEOUT_SECS),
            job_reap_interval_secs: env::var("JOB_REAP_INTERVAL_SECS")
                .unwrap_or_else(|_| JOB_REAP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(JOB_REAP_INTERVAL_SECS),
            job_reap_grace_secs: env::var("JOB_REAP_GRACE_SECS")
                .unwrap_or_else(|_| JOB_REAP_GRACE_SECS.to_string())
                .parse()
                .unwrap_or(JOB_REAP_GRACE_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL must not be empty"));
        }
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            return Err(anyhow::anyhow!(
                "S3_BUCKET must be set when STORAGE_BACKEND is s3"
            ));
        }
        let needs_openai_key = [
            self.transcription_provider,
            self.debrief_provider,
            self.chat_provider,
        ]
        .contains(&ProviderKind::OpenAi);
        if needs_openai_key && self.openai_api_key.is_none() {
            return Err(anyhow::anyhow!(
                "OPENAI_API_KEY must be set when an openai provider is selected"
            ));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(anyhow::anyhow!("RATE_LIMIT_WINDOW_MS must be positive"));
        }
        Ok(())
    }
}
