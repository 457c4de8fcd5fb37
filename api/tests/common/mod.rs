//! Test application wiring over in-memory backends

use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;

use cv_api::AppState;
use cv_core::{
    DeliveryError, DeliveryPayload, InMemoryCredentialStore, InMemoryRateLimiter, Sender,
    ValidatorRegistry, VerificationEngine,
};
use cv_infra::normalizer::{E164Normalizer, EmailNormalizer};
use cv_shared::Language;

/// Sender that keeps every payload so tests can read the delivered code
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, DeliveryPayload, Language)>>,
}

impl RecordingSender {
    pub fn last_code(&self, destination: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _, _)| to == destination)
            .and_then(|(_, payload, _)| payload.code.clone())
    }

    pub fn last_payload(&self) -> Option<(String, DeliveryPayload, Language)> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Sender for RecordingSender {
    async fn deliver(
        &self,
        destination: &str,
        payload: &DeliveryPayload,
        lang: Language,
    ) -> Result<String, DeliveryError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((destination.to_string(), payload.clone(), lang));
        Ok(format!("test_{}", sent.len()))
    }
}

/// State with `tel` and `email` validators sharing one store and limiter
pub fn test_state(sender: Arc<RecordingSender>) -> web::Data<AppState> {
    let store = Arc::new(InMemoryCredentialStore::new());
    let limiter = Arc::new(InMemoryRateLimiter::new());

    let tel = VerificationEngine::new(
        "tel",
        store.clone(),
        limiter.clone(),
        sender.clone(),
        Arc::new(E164Normalizer::new()),
    );
    let email = VerificationEngine::new(
        "email",
        store,
        limiter,
        sender,
        Arc::new(EmailNormalizer),
    );

    let registry = ValidatorRegistry::builder()
        .register(Arc::new(tel), r#"{"max_attempts": 3}"#)
        .unwrap()
        .register(Arc::new(email), "{}")
        .unwrap()
        .build();

    web::Data::new(AppState::new(Arc::new(registry)))
}
