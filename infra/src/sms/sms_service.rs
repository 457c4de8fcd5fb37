//! SMS Service Interface

use async_trait::async_trait;

use crate::InfrastructureError;

/// Longest body any provider accepts (Twilio concatenated SMS limit)
pub const MAX_MESSAGE_LENGTH: usize = 1600;

/// SMS service trait for sending text messages
///
/// Implementations report a destination the provider refuses as
/// [`InfrastructureError::InvalidRecipient`]; every other error is treated
/// as transient by the sender layer.
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Send an SMS message to an E.164 phone number
    ///
    /// # Returns
    ///
    /// * `Ok(message_id)` - Provider identifier of the accepted message
    /// * `Err(InfrastructureError)` - If sending fails
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError>;

    /// Get the service provider name
    fn provider_name(&self) -> &str;

    /// Check if the service is available
    async fn is_available(&self) -> bool {
        true
    }
}
