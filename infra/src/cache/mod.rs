//! Cache module for Redis-backed rate limiting
//!
//! Multi-instance deployments share one sliding window per key through
//! Redis; single-process setups use the in-memory limiter from `cv_core`.

pub mod rate_limiter;
pub mod redis_client;

#[cfg(test)]
mod tests;

pub use rate_limiter::RedisRateLimiter;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use cv_shared::config::cache::CacheConfig;
