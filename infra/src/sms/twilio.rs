//! Twilio SMS Service Implementation
//!
//! Production SMS delivery through the Twilio API with retry on rate limiting
//! and server errors. Client errors (bad number, unreachable destination) are
//! reported as [`InfrastructureError::InvalidRecipient`] without retrying.

use async_trait::async_trait;
use cv_shared::phone::mask_phone_number;
use phonenumber::{Mode, PhoneNumber};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use twilio::{Client, OutboundMessage};

use super::sms_service::{SmsService, MAX_MESSAGE_LENGTH};
use crate::InfrastructureError;

/// Twilio SMS service configuration
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    pub auth_token: String,
    /// From phone number (must be a Twilio phone number)
    pub from_number: String,
    /// Maximum attempts per message, including the first
    pub max_retries: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
}

impl TwilioConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| InfrastructureError::Config("TWILIO_ACCOUNT_SID not set".to_string()))?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| InfrastructureError::Config("TWILIO_AUTH_TOKEN not set".to_string()))?;
        let from_number = std::env::var("TWILIO_FROM_NUMBER")
            .map_err(|_| InfrastructureError::Config("TWILIO_FROM_NUMBER not set".to_string()))?;

        let config = Self {
            account_sid,
            auth_token,
            from_number,
            max_retries: std::env::var("TWILIO_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            retry_delay_ms: std::env::var("TWILIO_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the sender number and retry settings
    pub fn validate(&self) -> Result<(), InfrastructureError> {
        if !self.from_number.starts_with('+') {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format (starting with '+')".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(InfrastructureError::Config(
                "TWILIO_MAX_RETRIES must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a failed Twilio call should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    RateLimited,
    ServerError,
    ClientError,
    Unknown,
}

/// Classify a Twilio error from its rendered message
pub(crate) fn classify_failure(message: &str) -> FailureKind {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("429") || lowered.contains("rate") {
        FailureKind::RateLimited
    } else if ["500", "502", "503", "504"].iter().any(|code| lowered.contains(code)) {
        FailureKind::ServerError
    } else if lowered.contains("400") || lowered.contains("invalid") || lowered.contains("21211") {
        FailureKind::ClientError
    } else {
        FailureKind::Unknown
    }
}

/// Twilio SMS service implementation
pub struct TwilioSmsService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioSmsService {
    /// Create a new Twilio SMS service
    pub fn new(config: TwilioConfig) -> Result<Self, InfrastructureError> {
        config.validate()?;
        let client = Client::new(&config.account_sid, &config.auth_token);

        info!(
            from = %mask_phone_number(&config.from_number),
            "Twilio SMS service initialized"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(TwilioConfig::from_env()?)
    }

    /// Re-format an E.164 number through the phone number metadata
    fn validate_phone_number(&self, phone: &str) -> Result<String, InfrastructureError> {
        match phone.parse::<PhoneNumber>() {
            Ok(parsed) => Ok(parsed.format().mode(Mode::E164).to_string()),
            Err(e) => {
                error!(phone = %mask_phone_number(phone), "Invalid phone number format: {}", e);
                Err(InfrastructureError::InvalidRecipient(format!(
                    "Invalid phone number format: {}",
                    e
                )))
            }
        }
    }

    /// Send SMS with retry logic
    async fn send_with_retry(&self, to: &str, message: &str) -> Result<String, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);

        loop {
            attempts += 1;

            debug!(
                "Sending SMS attempt {}/{} to {}",
                attempts,
                self.config.max_retries,
                mask_phone_number(to)
            );

            let msg = OutboundMessage::new(&self.config.from_number, to, message);

            match self.client.send_message(msg).await {
                Ok(response) => {
                    info!(
                        phone = %mask_phone_number(to),
                        message_id = %response.sid,
                        "SMS sent successfully"
                    );
                    return Ok(response.sid);
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    error!(
                        "Failed to send SMS (attempt {}/{}): {}",
                        attempts, self.config.max_retries, error_msg
                    );

                    match classify_failure(&error_msg) {
                        FailureKind::ClientError => {
                            return Err(InfrastructureError::InvalidRecipient(format!(
                                "Invalid request: {}",
                                error_msg
                            )));
                        }
                        FailureKind::RateLimited => {
                            warn!("Rate limit detected, backing off for {:?}", delay);
                        }
                        FailureKind::ServerError => {
                            warn!("Server error detected, retrying after {:?}", delay);
                        }
                        FailureKind::Unknown => {}
                    }

                    if attempts >= self.config.max_retries {
                        return Err(InfrastructureError::Sms(format!(
                            "Failed to send SMS after {} attempts: {}",
                            attempts, error_msg
                        )));
                    }

                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
}

#[async_trait]
impl SmsService for TwilioSmsService {
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError> {
        let normalized_phone = self.validate_phone_number(phone_number)?;

        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(InfrastructureError::InvalidRecipient(format!(
                "Message exceeds maximum length of {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        self.send_with_retry(&normalized_phone, message).await
    }

    fn provider_name(&self) -> &str {
        "Twilio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "ACtest".to_string(),
            auth_token: "test".to_string(),
            from_number: "+15005550006".to_string(),
            max_retries: 2,
            retry_delay_ms: 10,
        }
    }

    #[test]
    fn test_phone_validation() {
        let service = TwilioSmsService::new(config()).unwrap();

        assert_eq!(
            service.validate_phone_number("+14155552671").unwrap(),
            "+14155552671"
        );
        assert!(matches!(
            service.validate_phone_number("not a number"),
            Err(InfrastructureError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut bad = config();
        bad.from_number = "15551234567".to_string();
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("E.164 format"));

        let mut bad = config();
        bad.max_retries = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(classify_failure("HTTP 429 Too Many Requests"), FailureKind::RateLimited);
        assert_eq!(classify_failure("status 503"), FailureKind::ServerError);
        assert_eq!(
            classify_failure("21211: Invalid 'To' Phone Number"),
            FailureKind::ClientError
        );
        assert_eq!(classify_failure("connection reset"), FailureKind::Unknown);
    }
}
