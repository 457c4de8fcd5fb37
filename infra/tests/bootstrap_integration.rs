//! Integration tests for registry bootstrap over in-memory backends

use cv_core::{
    CredentialStore, CredentialValidator, RequestOutcome, RequestParams, UserId, VerificationError,
};
use cv_infra::bootstrap::{build_registry_with, Backends};
use cv_infra::{build_registry, InfrastructureError};
use cv_shared::{AppConfig, Language};

fn config(source: &str) -> AppConfig {
    AppConfig::from_toml_str(source).unwrap()
}

#[tokio::test]
async fn test_default_config_registers_tel() {
    let registry = build_registry(&AppConfig::default()).await.unwrap();

    assert_eq!(registry.methods(), vec!["tel"]);
    assert!(registry.get("tel").unwrap().is_initialized());
}

#[tokio::test]
async fn test_disabled_validators_are_skipped() {
    let config = config(
        r#"
        [validators.tel]
        normalizer = "e164"

        [validators.email]
        enabled = false
        provider = "log"
        normalizer = "email"
        "#,
    );

    let registry = build_registry_with(&config, &Backends::in_memory()).unwrap();
    assert!(registry.contains("tel"));
    assert!(!registry.contains("email"));
}

#[tokio::test]
async fn test_production_refuses_accept_any_response() {
    let config = config(
        r#"
        environment = "production"

        [validators.tel]
        normalizer = "e164"
        config = { accept_any_response = true }
        "#,
    );

    match build_registry_with(&config, &Backends::in_memory()) {
        Err(InfrastructureError::Config(message)) => {
            assert!(message.contains("accept_any_response"));
            assert!(message.contains("tel"));
        }
        _ => panic!("expected configuration error"),
    }
}

#[tokio::test]
async fn test_bad_method_config_fails_startup() {
    let config = config(
        r#"
        [validators.tel]
        normalizer = "e164"
        config = { code_length = 2 }
        "#,
    );

    assert!(matches!(
        build_registry_with(&config, &Backends::in_memory()),
        Err(InfrastructureError::Config(_))
    ));
}

#[tokio::test]
async fn test_unknown_normalizer_fails_startup() {
    let config = config(
        r#"
        [validators.fax]
        normalizer = "g3"
        "#,
    );

    assert!(build_registry_with(&config, &Backends::in_memory()).is_err());
}

#[tokio::test]
async fn test_email_flow_through_log_sender() {
    let config = config(
        r#"
        [validators.email]
        provider = "log"
        normalizer = "email"
        config = { accept_any_response = true }
        "#,
    );
    let registry = build_registry_with(&config, &Backends::in_memory()).unwrap();
    let email = registry.get("email").unwrap();
    let user = UserId::new("usr1").unwrap();

    let canonical = email
        .pre_check(&user, " Alice@Example.com ", &serde_json::Value::Null)
        .await
        .unwrap();
    assert_eq!(canonical, "alice@example.com");

    let outcome = email
        .request(&user, "Alice@Example.com", RequestParams::new(Language::English))
        .await
        .unwrap();
    assert!(matches!(outcome, RequestOutcome::Sent { .. }));

    let checked = email.check(&user, "anything").await.unwrap();
    assert_eq!(checked.value, "alice@example.com");

    let other = UserId::new("usr2").unwrap();
    match email
        .pre_check(&other, "alice@example.com", &serde_json::Value::Null)
        .await
    {
        Err(e) => assert_eq!(e.as_verification(), Some(&VerificationError::AlreadyClaimed)),
        Ok(_) => panic!("expected AlreadyClaimed"),
    }
}

#[tokio::test]
async fn test_validators_share_backends() {
    let config = config(
        r#"
        [validators.tel]
        normalizer = "e164"

        [validators.email]
        provider = "log"
        normalizer = "email"
        "#,
    );
    let backends = Backends::in_memory();
    let registry = build_registry_with(&config, &backends).unwrap();
    assert_eq!(registry.methods(), vec!["email", "tel"]);

    let user = UserId::new("usr1").unwrap();
    registry
        .get("email")
        .unwrap()
        .request(&user, "bob@example.org", RequestParams::default())
        .await
        .unwrap();

    let stored = backends.store.find_by_user(&user, "email").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(backends.store.find_by_user(&user, "tel").await.unwrap().is_empty());
}
