use crate::traits::{Cache, CacheError, CacheResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::timeout;

/// Per-command deadline. Keeps a wedged Redis from stalling request handling;
/// callers treat the timeout like any other backend error.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis cache implementation over a multiplexed async connection
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    command_timeout: Duration,
}

impl RedisCache {
    /// Create a client for `url`. The URL is only parsed here; the first
    /// connection attempt happens on first use, so an unreachable Redis does
    /// not block startup.
    pub fn new(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Config(e.to_string()))?;
        Ok(RedisCache {
            client,
            command_timeout: COMMAND_TIMEOUT,
        })
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        match timeout(
            self.command_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(CacheError::Backend(e.to_string())),
            Err(_) => Err(CacheError::Timeout(self.command_timeout)),
        }
    }

    async fn run<T, Fut>(&self, fut: Fut) -> CacheResult<T>
    where
        Fut: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.command_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(CacheError::Backend(e.to_string())),
            Err(_) => Err(CacheError::Timeout(self.command_timeout)),
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        self.run(conn.get(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                self.run(conn.set_ex(key, value, ttl.as_secs().max(1)))
                    .await
            }
            None => self.run(conn.set(key, value)).await,
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = self.run(conn.del(key)).await?;
        Ok(())
    }

    async fn incr_with_window(&self, key: &str, window: Duration) -> CacheResult<i64> {
        let mut conn = self.connection().await?;
        let count: i64 = self.run(conn.incr(key, 1_i64)).await?;
        if count == 1 {
            let _: bool = self
                .run(conn.expire(key, window.as_secs().max(1) as i64))
                .await?;
        }
        Ok(count)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: String = self
            .run(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}
