use crate::traits::{Cache, CacheResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory cache implementation
///
/// A mutexed map with per-entry expiry, shared across clones. Stands in for
/// Redis in the test suite and in single-process development.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry. Test-suite convenience.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn incr_with_window(&self, key: &str, window: Duration) -> CacheResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let count = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value.parse::<i64>().unwrap_or(0) + 1
            }
            _ => 1,
        };
        let expires_at = match entries.get(key) {
            // Keep the original window deadline while it is still running.
            Some(entry) if !entry.is_expired(now) => entry.expires_at,
            _ => Some(now + window),
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );
        Ok(count)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
