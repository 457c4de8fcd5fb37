//! Sender delivering over an SMS provider

use async_trait::async_trait;
use chrono::Utc;
use cv_core::{DeliveryError, DeliveryPayload, Sender};
use cv_shared::phone::mask_phone_number;
use cv_shared::Language;
use std::sync::Arc;

use super::templates::MessageTemplates;
use crate::sms::SmsService;
use crate::InfrastructureError;

/// Renders payloads and hands them to an [`SmsService`]
pub struct SmsSender<S: SmsService + ?Sized> {
    service: Arc<S>,
    templates: MessageTemplates,
}

impl<S: SmsService + ?Sized> SmsSender<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_templates(service, MessageTemplates::default())
    }

    pub fn with_templates(service: Arc<S>, templates: MessageTemplates) -> Self {
        Self { service, templates }
    }
}

/// Whether resending could succeed after `error`
pub(crate) fn classify(error: InfrastructureError) -> DeliveryError {
    match error {
        InfrastructureError::InvalidRecipient(message) | InfrastructureError::Config(message) => {
            DeliveryError::Fatal(message)
        }
        other => DeliveryError::Retryable(other.to_string()),
    }
}

#[async_trait]
impl<S: SmsService + ?Sized> Sender for SmsSender<S> {
    async fn deliver(
        &self,
        destination: &str,
        payload: &DeliveryPayload,
        lang: Language,
    ) -> Result<String, DeliveryError> {
        let body = self.templates.render(payload, lang, Utc::now());

        match self.service.send_sms(destination, &body).await {
            Ok(message_id) => {
                tracing::debug!(
                    provider = %self.service.provider_name(),
                    phone = %mask_phone_number(destination),
                    message_id = %message_id,
                    event = "sms_delivered",
                    "Delivered verification SMS"
                );
                Ok(message_id)
            }
            Err(e) => {
                tracing::warn!(
                    provider = %self.service.provider_name(),
                    phone = %mask_phone_number(destination),
                    error = %e,
                    event = "sms_delivery_failed",
                    "SMS delivery failed"
                );
                Err(classify(e))
            }
        }
    }
}
