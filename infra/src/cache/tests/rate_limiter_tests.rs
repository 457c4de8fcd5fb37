//! Unit tests for the Redis rate limiter reply decoding

use cv_core::{DenialReason, RateLimitDecision};

use crate::cache::rate_limiter::decode_reply;

#[test]
fn test_decode_allowed() {
    assert_eq!(
        decode_reply(&[1, 4, 0]).unwrap(),
        RateLimitDecision::Allowed { remaining: 4 }
    );
}

#[test]
fn test_decode_denied_rounds_wait_up() {
    assert_eq!(
        decode_reply(&[0, 1500, 1]).unwrap(),
        RateLimitDecision::Denied {
            retry_after_seconds: 2,
            reason: DenialReason::Spacing,
        }
    );
    assert_eq!(
        decode_reply(&[0, 0, 2]).unwrap(),
        RateLimitDecision::Denied {
            retry_after_seconds: 1,
            reason: DenialReason::Quota,
        }
    );
}

#[test]
fn test_decode_malformed_reply() {
    assert!(decode_reply(&[]).is_err());
    assert!(decode_reply(&[7, 1, 1]).is_err());
}
