//! Unit tests for the token generator

use std::collections::HashSet;

use crate::errors::DomainError;
use crate::services::token::{TokenGenerator, TEMP_TOKEN_BYTES};

#[test]
fn test_code_format() {
    let generator = TokenGenerator::new(6).unwrap();
    for _ in 0..200 {
        let code = generator.generate_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}

#[test]
fn test_code_length_bounds() {
    assert!(matches!(
        TokenGenerator::new(3),
        Err(DomainError::Configuration { .. })
    ));
    assert!(TokenGenerator::new(11).is_err());
    assert_eq!(TokenGenerator::new(10).unwrap().code_space(), 10_000_000_000);
}

#[test]
fn test_codes_are_not_constant() {
    let generator = TokenGenerator::new(8).unwrap();
    let codes: HashSet<String> = (0..50).map(|_| generator.generate_code()).collect();
    assert!(codes.len() > 40);
}

#[test]
fn test_issue_generates_temp_token_when_missing() {
    let generator = TokenGenerator::new(6).unwrap();
    let issued = generator.issue(None, &[]).unwrap();
    assert_eq!(issued.temp_token.len(), TEMP_TOKEN_BYTES);
    assert_eq!(issued.secret_hash, TokenGenerator::hash_code(&issued.code));

    let issued = generator.issue(Some(Vec::new()), &[]).unwrap();
    assert_eq!(issued.temp_token.len(), TEMP_TOKEN_BYTES);
}

#[test]
fn test_issue_keeps_caller_temp_token() {
    let generator = TokenGenerator::new(6).unwrap();
    let issued = generator.issue(Some(vec![7, 7, 7]), &[]).unwrap();
    assert_eq!(issued.temp_token, vec![7, 7, 7]);
}

#[test]
fn test_issue_avoids_sibling_codes() {
    let generator = TokenGenerator::new(4).unwrap();
    // Block all but one code in a small space
    let avoid: Vec<String> = (1..10_000)
        .map(|n| TokenGenerator::hash_code(&format!("{:04}", n)))
        .collect();

    // Drawing "0000" within 16 tries is unlikely; only assert the invariant
    match generator.issue(None, &avoid) {
        Ok(issued) => assert_eq!(issued.code, "0000"),
        Err(DomainError::Internal { .. }) => {}
        Err(other) => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_issue_distinct_token_ids() {
    let generator = TokenGenerator::new(6).unwrap();
    let first = generator.issue(None, &[]).unwrap();
    let second = generator.issue(None, &[]).unwrap();
    assert_ne!(first.token_id, second.token_id);
}

#[test]
fn test_verify_constant_time() {
    let hash = TokenGenerator::hash_code("482193");
    assert!(TokenGenerator::verify("482193", &hash));
    assert!(TokenGenerator::verify(" 482193\n", &hash));
    assert!(!TokenGenerator::verify("482194", &hash));
    assert!(!TokenGenerator::verify("", &hash));
}

#[test]
fn test_debug_hides_code() {
    let generator = TokenGenerator::new(6).unwrap();
    let issued = generator.issue(None, &[]).unwrap();
    let debug = format!("{:?}", issued);
    assert!(!debug.contains(&issued.code));
}
