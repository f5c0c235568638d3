use crate::{Cache, CacheResult, MemoryCache, RedisCache};
use komuchi_core::Config;
use std::sync::Arc;

/// Create a cache backend from configuration.
///
/// `REDIS_URL` of `memory://` selects the in-process cache; anything else is
/// handed to the redis client. No connection is made here, so an unreachable
/// Redis degrades the `/api/ready` check instead of failing boot.
pub fn create_cache(config: &Config) -> CacheResult<Arc<dyn Cache>> {
    if config.redis_url().starts_with("memory://") {
        return Ok(Arc::new(MemoryCache::new()));
    }
    Ok(Arc::new(RedisCache::new(config.redis_url())?))
}
