//! Sender implementations
//!
//! A sender turns a [`cv_core::DeliveryPayload`] into user-facing text and
//! hands it to a transport, reporting provider failures as retryable or
//! fatal so the engine can decide whether to try again.

mod log_sender;
mod sms_sender;
mod templates;

#[cfg(test)]
mod tests;

pub use log_sender::LogSender;
pub use sms_sender::SmsSender;
pub use templates::{MessageTemplates, DEFAULT_BRAND, DEFAULT_RESET_URL};

use cv_core::Sender;
use std::sync::Arc;

use crate::sms::create_sms_service;
use crate::InfrastructureError;

/// Create the sender for a provider name
///
/// `log` prints to the console; every other name selects an SMS provider.
pub fn create_sender(
    provider: &str,
    templates: MessageTemplates,
) -> Result<Arc<dyn Sender>, InfrastructureError> {
    match provider {
        "log" => Ok(Arc::new(LogSender::new(templates))),
        sms => Ok(Arc::new(SmsSender::with_templates(
            create_sms_service(sms)?,
            templates,
        ))),
    }
}
