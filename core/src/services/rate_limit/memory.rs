//! Process-local sliding window rate limiter

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use cv_shared::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::DomainResult;

use super::limiter::{DenialReason, RateLimitDecision, RateLimiter};

/// Permit timestamps of one key and the window they were taken under
struct Window {
    stamps: VecDeque<DateTime<Utc>>,
    span: Duration,
}

impl Window {
    fn new(span: Duration) -> Self {
        Self {
            stamps: VecDeque::new(),
            span,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        while self.stamps.front().map_or(false, |t| *t <= now - self.span) {
            self.stamps.pop_front();
        }
    }

    /// Whether any permit still counts at `now`
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.stamps.back().map_or(false, |t| *t > now - self.span)
    }
}

/// Sliding window limiter holding timestamps in memory
///
/// Suitable for a single process; multi-instance deployments use the Redis
/// limiter so that all instances share one window per key. A key is dropped
/// once its window holds no permits, so idle keys do not accumulate.
#[derive(Clone, Default)]
pub struct InMemoryRateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit decision at an explicit instant
    pub async fn try_acquire_at(
        &self,
        key: &str,
        policy: &RateLimitConfig,
        enforce_spacing: bool,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        if !policy.enabled {
            return RateLimitDecision::Allowed {
                remaining: policy.requests_per_window,
            };
        }

        let span = Duration::seconds(policy.window_seconds as i64);
        let spacing = Duration::seconds(policy.min_interval_seconds as i64);

        let mut windows = self.windows.lock().await;
        if !windows.contains_key(key) {
            windows.retain(|_, window| window.is_live(now));
        }

        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| Window::new(span));
        window.span = span;
        window.prune(now);

        let decision = decide(&mut window.stamps, policy, span, spacing, enforce_spacing, now);
        if window.stamps.is_empty() {
            windows.remove(key);
        }
        decision
    }

    /// Number of keys currently holding permits
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

fn decide(
    stamps: &mut VecDeque<DateTime<Utc>>,
    policy: &RateLimitConfig,
    span: Duration,
    spacing: Duration,
    enforce_spacing: bool,
    now: DateTime<Utc>,
) -> RateLimitDecision {
    if enforce_spacing {
        if let Some(last) = stamps.back() {
            let elapsed = now - *last;
            if elapsed < spacing {
                return RateLimitDecision::Denied {
                    retry_after_seconds: ceil_seconds(spacing - elapsed),
                    reason: DenialReason::Spacing,
                };
            }
        }
    }

    if stamps.len() >= policy.requests_per_window as usize {
        let oldest = stamps.front().copied().unwrap_or(now);
        return RateLimitDecision::Denied {
            retry_after_seconds: ceil_seconds(oldest + span - now),
            reason: DenialReason::Quota,
        };
    }

    stamps.push_back(now);
    RateLimitDecision::Allowed {
        remaining: policy.requests_per_window - stamps.len() as u32,
    }
}

/// Whole seconds to wait, at least one
fn ceil_seconds(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0) as u64;
    ((millis + 999) / 1000).max(1)
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn try_acquire(
        &self,
        key: &str,
        policy: &RateLimitConfig,
        enforce_spacing: bool,
    ) -> DomainResult<RateLimitDecision> {
        Ok(self
            .try_acquire_at(key, policy, enforce_spacing, Utc::now())
            .await)
    }

    async fn reset(&self, key: &str) -> DomainResult<()> {
        self.windows.lock().await.remove(key);
        Ok(())
    }
}
