//! SMS Service Module
//!
//! Provider clients that put a rendered text message on the wire. Message
//! wording lives in [`crate::sender`]; this module only transports.
//!
//! - **SMS Service Trait**: Common interface for all SMS providers
//! - **Mock Implementation**: Console output for development
//! - **Twilio Support**: Production SMS via Twilio API (`twilio-sms` feature)

pub mod mock_sms;
pub mod sms_service;
#[cfg(feature = "twilio-sms")]
pub mod twilio;

pub use mock_sms::MockSmsService;
pub use sms_service::{SmsService, MAX_MESSAGE_LENGTH};
#[cfg(feature = "twilio-sms")]
pub use twilio::{TwilioConfig, TwilioSmsService};

use std::sync::Arc;

use crate::InfrastructureError;

#[cfg(test)]
mod tests;

/// Create an SMS service for a provider name
///
/// Unknown providers fall back to the mock implementation with a warning.
/// Twilio reads its credentials from the environment and fails if they are
/// missing.
pub fn create_sms_service(provider: &str) -> Result<Arc<dyn SmsService>, InfrastructureError> {
    match provider {
        "mock" => Ok(Arc::new(MockSmsService::new())),
        #[cfg(feature = "twilio-sms")]
        "twilio" => Ok(Arc::new(TwilioSmsService::from_env()?)),
        _ => {
            tracing::warn!(
                provider = %provider,
                event = "sms_provider_fallback",
                "Unknown SMS provider, using mock implementation"
            );
            Ok(Arc::new(MockSmsService::new()))
        }
    }
}
