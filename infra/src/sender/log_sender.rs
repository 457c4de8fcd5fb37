//! Console sender for channels without a gateway in development

use async_trait::async_trait;
use chrono::Utc;
use cv_core::{DeliveryError, DeliveryPayload, Sender};
use cv_shared::email::mask_credential;
use cv_shared::Language;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::templates::MessageTemplates;

/// Prints rendered messages to stdout instead of delivering them
pub struct LogSender {
    templates: MessageTemplates,
    console_output: bool,
    delivered: AtomicU64,
}

impl LogSender {
    pub fn new(templates: MessageTemplates) -> Self {
        Self {
            templates,
            console_output: true,
            delivered: AtomicU64::new(0),
        }
    }

    /// A sender that only counts deliveries
    pub fn silent() -> Self {
        Self {
            console_output: false,
            ..Self::new(MessageTemplates::default())
        }
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sender for LogSender {
    async fn deliver(
        &self,
        destination: &str,
        payload: &DeliveryPayload,
        lang: Language,
    ) -> Result<String, DeliveryError> {
        let message_id = format!("log_{}", Uuid::new_v4());
        self.delivered.fetch_add(1, Ordering::SeqCst);

        if self.console_output {
            println!("\n{}", "=".repeat(60));
            println!("LOG SENDER - {} MESSAGE", payload.method.to_uppercase());
            println!("To: {}", destination);
            println!("Message ID: {}", message_id);
            println!("Content: {}", self.templates.render(payload, lang, Utc::now()));
            println!("{}\n", "=".repeat(60));
        }

        tracing::info!(
            method = %payload.method,
            destination = %mask_credential(destination),
            message_id = %message_id,
            event = "log_delivered",
            "Message written to console"
        );

        Ok(message_id)
    }
}
