//! Unit tests for the validator registry

use std::sync::Arc;

use crate::errors::{DomainError, VerificationError};
use crate::repositories::InMemoryCredentialStore;
use crate::services::rate_limit::InMemoryRateLimiter;
use crate::services::verification::{
    CredentialDescriptor, CredentialValidator, ValidatorRegistry, VerificationEngine,
};

use super::mocks::{MockNormalizer, MockSender};

fn engine(method: &str) -> Arc<dyn CredentialValidator> {
    Arc::new(VerificationEngine::new(
        method,
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(InMemoryRateLimiter::new()),
        Arc::new(MockSender::new()),
        Arc::new(MockNormalizer),
    ))
}

#[test]
fn test_register_and_get() {
    let registry = ValidatorRegistry::builder()
        .register(engine("tel"), "{}")
        .unwrap()
        .register(engine("email"), r#"{"ttl_seconds": 900}"#)
        .unwrap()
        .build();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.methods(), vec!["email", "tel"]);
    let tel = registry.get("tel").unwrap();
    assert_eq!(tel.method(), "tel");
    assert!(tel.is_initialized());
}

#[test]
fn test_unknown_method() {
    let registry = ValidatorRegistry::builder().build();
    assert!(registry.is_empty());
    match registry.get("fax") {
        Err(DomainError::Verification(VerificationError::UnknownMethod { method })) => {
            assert_eq!(method, "fax")
        }
        _ => panic!("expected UnknownMethod"),
    }
}

#[test]
fn test_duplicate_tag_rejected() {
    let result = ValidatorRegistry::builder()
        .register(engine("tel"), "{}")
        .unwrap()
        .register(engine("tel"), "{}");
    match result {
        Err(DomainError::Configuration { message }) => assert!(message.contains("tel")),
        _ => panic!("expected configuration error"),
    }
}

#[test]
fn test_bad_config_fails_fast_with_method_name() {
    let result = ValidatorRegistry::builder().register(engine("tel"), r#"{"ttl_seconds": 0}"#);
    match result {
        Err(DomainError::Configuration { message }) => {
            assert!(message.starts_with("Validator 'tel'"));
            assert!(message.contains("ttl_seconds"));
        }
        _ => panic!("expected configuration error"),
    }
}

#[test]
fn test_descriptor_parsing() {
    let descriptor: CredentialDescriptor = "TEL:+15551234567".parse().unwrap();
    assert_eq!(descriptor.method, "tel");
    assert_eq!(descriptor.value, "+15551234567");

    let list =
        CredentialDescriptor::parse_list("email:test@example.com, tel:12345,").unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].method, "email");
    assert_eq!(list[1].value, "12345");

    assert!("no-colon".parse::<CredentialDescriptor>().is_err());
    assert!("tel:".parse::<CredentialDescriptor>().is_err());
}

#[test]
fn test_resolve_descriptor() {
    let registry = ValidatorRegistry::builder()
        .register(engine("tel"), "{}")
        .unwrap()
        .build();

    let descriptor: CredentialDescriptor = "tel:+15551234567".parse().unwrap();
    assert_eq!(registry.resolve(&descriptor).unwrap().method(), "tel");

    let descriptor: CredentialDescriptor = "email:a@b.c".parse().unwrap();
    assert!(registry.resolve(&descriptor).is_err());
}
