//! Cache module for Redis-based storage
//!
//! Provides the Redis client used by the Redis verification store,
//! including connection setup with timeouts and retry logic.

pub mod redis_client;


pub use redis_client::RedisClient;

// Re-export commonly used types
pub use sv_shared::config::CacheConfig;
