//! Unit tests for SMS service creation

use crate::sms::create_sms_service;

#[test]
fn test_create_mock_service() {
    let service = create_sms_service("mock").unwrap();
    assert_eq!(service.provider_name(), "Mock");
}

#[test]
fn test_create_unknown_provider_fallback() {
    let service = create_sms_service("carrier-pigeon").unwrap();
    assert_eq!(service.provider_name(), "Mock");
}
