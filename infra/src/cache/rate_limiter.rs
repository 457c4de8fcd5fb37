//! Redis sliding-window rate limiter
//!
//! Each key is a sorted set of delivery timestamps (milliseconds). A Lua
//! script prunes the window, checks spacing and quota, and records the new
//! permit in one round trip so concurrent instances cannot both pass.

use async_trait::async_trait;
use chrono::Utc;
use cv_core::{DenialReason, DomainResult, RateLimitDecision, RateLimiter, VerificationError};
use cv_shared::RateLimitConfig;
use once_cell::sync::Lazy;
use redis::Script;
use std::sync::Arc;
use uuid::Uuid;

use super::redis_client::RedisClient;

// Returns {allowed, value, reason}; value is the remaining quota when allowed
// and the wait in milliseconds when denied. reason: 1 spacing, 2 quota.
static ACQUIRE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local spacing = tonumber(ARGV[4])
local enforce = tonumber(ARGV[5])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)

if enforce == 1 and spacing > 0 then
  local last = redis.call('ZRANGE', key, -1, -1, 'WITHSCORES')
  if last[2] then
    local elapsed = now - tonumber(last[2])
    if elapsed < spacing then
      return {0, spacing - elapsed, 1}
    end
  end
end

local count = redis.call('ZCARD', key)
if count >= limit then
  local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
  return {0, tonumber(oldest[2]) + window - now, 2}
end

redis.call('ZADD', key, now, ARGV[6])
redis.call('PEXPIRE', key, window)
return {1, limit - count - 1, 0}
"#,
    )
});

/// Redis-based implementation of the rate limiter trait
pub struct RedisRateLimiter {
    redis_client: Arc<RedisClient>,
}

impl RedisRateLimiter {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }
}

fn unavailable(e: redis::RedisError) -> VerificationError {
    VerificationError::StoreUnavailable {
        message: format!("rate limiter unavailable: {}", e),
    }
}

/// Interpret the script's reply
pub(crate) fn decode_reply(reply: &[i64]) -> DomainResult<RateLimitDecision> {
    match reply {
        [1, remaining, _] => Ok(RateLimitDecision::Allowed {
            remaining: (*remaining).max(0) as u32,
        }),
        [0, wait_ms, reason] => Ok(RateLimitDecision::Denied {
            retry_after_seconds: ((*wait_ms).max(1) as u64 + 999) / 1000,
            reason: if *reason == 1 {
                DenialReason::Spacing
            } else {
                DenialReason::Quota
            },
        }),
        other => Err(VerificationError::StoreUnavailable {
            message: format!("unexpected rate limiter reply: {:?}", other),
        }
        .into()),
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn try_acquire(
        &self,
        key: &str,
        policy: &RateLimitConfig,
        enforce_spacing: bool,
    ) -> DomainResult<RateLimitDecision> {
        if !policy.enabled {
            return Ok(RateLimitDecision::Allowed {
                remaining: policy.requests_per_window,
            });
        }

        let now = Utc::now().timestamp_millis();
        let mut conn = self.redis_client.get_connection();
        let reply: Vec<i64> = ACQUIRE_SCRIPT
            .key(self.redis_client.key(&format!("rl:{}", key)))
            .arg(now)
            .arg(policy.window_seconds.saturating_mul(1000))
            .arg(policy.requests_per_window)
            .arg(policy.min_interval_seconds.saturating_mul(1000))
            .arg(i32::from(enforce_spacing))
            .arg(format!("{}-{}", now, Uuid::new_v4()))
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        decode_reply(&reply)
    }

    async fn reset(&self, key: &str) -> DomainResult<()> {
        let mut conn = self.redis_client.get_connection();
        let _: i64 = redis::cmd("DEL")
            .arg(self.redis_client.key(&format!("rl:{}", key)))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
