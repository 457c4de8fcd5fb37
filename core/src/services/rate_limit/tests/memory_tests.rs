//! Unit tests for the in-memory rate limiter

use chrono::{Duration, Utc};
use cv_shared::RateLimitConfig;

use crate::domain::value_objects::UserId;
use crate::services::rate_limit::{
    request_key, reset_key, DenialReason, InMemoryRateLimiter, RateLimitDecision, RateLimiter,
};

fn policy(requests: u32, window: u64, spacing: u64) -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        requests_per_window: requests,
        window_seconds: window,
        min_interval_seconds: spacing,
    }
}

#[tokio::test]
async fn test_quota_exhaustion() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(3, 3600, 0);
    let now = Utc::now();

    for expected in [2, 1, 0] {
        assert_eq!(
            limiter.try_acquire_at("k", &policy, true, now).await,
            RateLimitDecision::Allowed {
                remaining: expected
            }
        );
    }

    match limiter.try_acquire_at("k", &policy, true, now).await {
        RateLimitDecision::Denied {
            retry_after_seconds,
            reason,
        } => {
            assert_eq!(reason, DenialReason::Quota);
            assert_eq!(retry_after_seconds, 3600);
        }
        other => panic!("expected denial, got {:?}", other),
    }
}

#[tokio::test]
async fn test_window_slides() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(2, 60, 0);
    let start = Utc::now();

    assert!(limiter.try_acquire_at("k", &policy, true, start).await.is_allowed());
    assert!(limiter
        .try_acquire_at("k", &policy, true, start + Duration::seconds(30))
        .await
        .is_allowed());
    assert!(!limiter
        .try_acquire_at("k", &policy, true, start + Duration::seconds(59))
        .await
        .is_allowed());

    // The first permit left the window
    assert!(limiter
        .try_acquire_at("k", &policy, true, start + Duration::seconds(61))
        .await
        .is_allowed());
}

#[tokio::test]
async fn test_spacing_enforced() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(10, 3600, 60);
    let now = Utc::now();

    assert!(limiter.try_acquire_at("k", &policy, true, now).await.is_allowed());

    match limiter
        .try_acquire_at("k", &policy, true, now + Duration::seconds(20))
        .await
    {
        RateLimitDecision::Denied {
            retry_after_seconds,
            reason,
        } => {
            assert_eq!(reason, DenialReason::Spacing);
            assert_eq!(retry_after_seconds, 40);
        }
        other => panic!("expected denial, got {:?}", other),
    }

    assert!(limiter
        .try_acquire_at("k", &policy, true, now + Duration::seconds(60))
        .await
        .is_allowed());
}

#[tokio::test]
async fn test_spacing_skipped_when_not_enforced() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(2, 3600, 60);
    let now = Utc::now();

    assert!(limiter.try_acquire_at("k", &policy, true, now).await.is_allowed());
    assert!(limiter.try_acquire_at("k", &policy, false, now).await.is_allowed());

    // Quota still applies
    assert!(!limiter.try_acquire_at("k", &policy, false, now).await.is_allowed());
}

#[tokio::test]
async fn test_keys_are_independent() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(1, 3600, 0);

    assert!(limiter.try_acquire("a", &policy, true).await.unwrap().is_allowed());
    assert!(limiter.try_acquire("b", &policy, true).await.unwrap().is_allowed());
    assert!(!limiter.try_acquire("a", &policy, true).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_reset_clears_key() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(1, 3600, 0);

    assert!(limiter.try_acquire("a", &policy, true).await.unwrap().is_allowed());
    limiter.reset("a").await.unwrap();
    assert!(limiter.try_acquire("a", &policy, true).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_disabled_policy_always_allows() {
    let limiter = InMemoryRateLimiter::new();
    let policy = RateLimitConfig::disabled();
    for _ in 0..100 {
        assert!(limiter.try_acquire("a", &policy, true).await.unwrap().is_allowed());
    }
}

#[test]
fn test_keys_do_not_leak_values() {
    let user = UserId::new("usr1").unwrap();
    let key = request_key("tel", &user, "+15551234567");
    assert!(key.starts_with("request:tel:usr1:"));
    assert!(!key.contains("5551234567"));

    let key = reset_key("tel", "+15551234567");
    assert!(key.starts_with("reset:tel:"));
    assert!(!key.contains("5551234567"));
    assert_eq!(key, reset_key("tel", "+15551234567"));
}

#[tokio::test]
async fn test_idle_keys_are_dropped() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(1, 60, 0);
    let start = Utc::now();

    for key in ["a", "b", "c"] {
        assert!(limiter.try_acquire_at(key, &policy, true, start).await.is_allowed());
    }
    assert_eq!(limiter.tracked_keys().await, 3);

    // A new key sweeps every window that has run out
    let later = start + Duration::seconds(61);
    assert!(limiter.try_acquire_at("d", &policy, true, later).await.is_allowed());
    assert_eq!(limiter.tracked_keys().await, 1);
}

#[tokio::test]
async fn test_denial_does_not_track_key() {
    let limiter = InMemoryRateLimiter::new();
    let policy = policy(0, 60, 0);

    let decision = limiter.try_acquire_at("a", &policy, true, Utc::now()).await;
    assert!(!decision.is_allowed());
    assert_eq!(limiter.tracked_keys().await, 0);
}
