//! Cache abstraction trait

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Cache operation errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache abstraction trait
///
/// Backs rate limiting and small ephemeral state. Values are strings; callers
/// serialize as needed. Backend outages surface as errors here and are
/// absorbed by the caller (rate limiting fails open, readiness reports
/// degraded) rather than taking requests down.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value, with an optional time to live.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Atomically increment a fixed-window counter, starting the window (and
    /// its expiry) on the first increment. Returns the count within the
    /// current window.
    async fn incr_with_window(&self, key: &str, window: Duration) -> CacheResult<i64>;

    /// Round-trip liveness check, used by readiness probes.
    async fn ping(&self) -> CacheResult<()>;
}
