//! Komuchi Cache Library
//!
//! Cache abstraction backing rate limiting and readiness checks, with Redis
//! and in-memory implementations.

pub mod factory;
pub mod memory;
pub mod redis_cache;
pub mod traits;

pub use factory::create_cache;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use traits::{Cache, CacheError, CacheResult};
