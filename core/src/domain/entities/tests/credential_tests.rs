//! Unit tests for the credential record state machine

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::credential::{CredentialRecord, CredentialState};
use crate::domain::value_objects::UserId;

fn record() -> CredentialRecord {
    CredentialRecord::new(UserId::new("usr1").unwrap(), "tel", "+15551234567")
}

fn armed() -> CredentialRecord {
    let mut record = record();
    record.arm(
        "hash".to_string(),
        Uuid::new_v4(),
        vec![1, 2, 3],
        Duration::seconds(300),
        Utc::now(),
    );
    record
}

#[test]
fn test_new_record_is_unconfirmed() {
    let record = record();
    assert_eq!(record.state, CredentialState::Unconfirmed);
    assert!(!record.has_token_material());
    assert_eq!(record.retry_count, 0);
    assert_eq!(record.revision, 0);
    assert!(record.is_expired_at(Utc::now()));
}

#[test]
fn test_arm_sets_pending_and_ttl() {
    let now = Utc::now();
    let mut record = record();
    record.retry_count = 4;
    record.arm(
        "hash".to_string(),
        Uuid::new_v4(),
        vec![9],
        Duration::seconds(300),
        now,
    );

    assert_eq!(record.state, CredentialState::Pending);
    assert_eq!(record.retry_count, 0);
    assert_eq!(record.expires_at, Some(now + Duration::seconds(300)));
    assert!(record.is_live_pending(now));
    assert!(record.is_resend_eligible(now));
    assert!(!record.is_live_pending(now + Duration::seconds(301)));
}

#[test]
fn test_mark_delivered_ends_resend_eligibility() {
    let mut record = armed();
    let now = Utc::now();
    record.mark_delivered("msg-1".to_string(), now);
    assert!(!record.is_resend_eligible(now));
    assert_eq!(record.message_id.as_deref(), Some("msg-1"));
}

#[test]
fn test_mark_verified_clears_token_material() {
    let mut record = armed();
    record.retry_count = 2;
    record.mark_verified(true, Utc::now());

    assert_eq!(record.state, CredentialState::Verified);
    assert_eq!(record.retry_count, 0);
    assert!(!record.has_token_material());
    assert!(record.verified_at.is_some());
}

#[test]
fn test_record_failure_locks_at_limit() {
    let mut record = armed();
    let now = Utc::now();

    for expected_remaining in (1..5).rev() {
        assert!(!record.record_failure(5, now));
        assert_eq!(record.state, CredentialState::Pending);
        assert_eq!(record.remaining_attempts(5), expected_remaining);
    }

    assert!(record.record_failure(5, now));
    assert_eq!(record.state, CredentialState::Failed);
    assert_eq!(record.remaining_attempts(5), 0);
    assert!(!record.has_token_material());
}

#[test]
fn test_expire_resets_to_unconfirmed() {
    let mut record = armed();
    record.expire(Utc::now());
    assert_eq!(record.state, CredentialState::Unconfirmed);
    assert!(!record.has_token_material());
}

#[test]
fn test_debug_redacts_secrets() {
    let record = armed();
    let debug = format!("{:?}", record);
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("\"hash\""));
    assert!(!debug.contains("+15551234567"));
}

#[test]
fn test_state_string_round_trip() {
    for state in [
        CredentialState::Unconfirmed,
        CredentialState::Pending,
        CredentialState::Verified,
        CredentialState::Failed,
    ] {
        assert_eq!(state.as_str().parse::<CredentialState>(), Ok(state));
    }
    assert!("locked".parse::<CredentialState>().is_err());
}
