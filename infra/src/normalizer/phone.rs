//! Phone numbers in E.164 form

use cv_core::{Normalizer, VerificationError};
use cv_shared::phone::{is_e164, strip_formatting};
use phonenumber::{country, Mode};

/// Normalizes phone numbers to E.164 (`+15551234567`)
///
/// Input without a leading `+` is only accepted when a default region is set.
#[derive(Debug, Clone, Default)]
pub struct E164Normalizer {
    default_region: Option<country::Id>,
}

impl E164Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret national numbers as belonging to `region`
    pub fn with_default_region(region: country::Id) -> Self {
        Self {
            default_region: Some(region),
        }
    }
}

impl Normalizer for E164Normalizer {
    fn normalize(&self, raw: &str) -> Result<String, VerificationError> {
        let stripped = strip_formatting(raw);
        if stripped.is_empty() {
            return Err(VerificationError::InvalidFormat {
                reason: "phone number is empty".to_string(),
            });
        }
        if !stripped.starts_with('+') && self.default_region.is_none() {
            return Err(VerificationError::InvalidFormat {
                reason: "phone number must include a country code".to_string(),
            });
        }

        let parsed = phonenumber::parse(self.default_region, &stripped).map_err(|e| {
            VerificationError::InvalidFormat {
                reason: format!("unparseable phone number: {}", e),
            }
        })?;

        let formatted = parsed.format().mode(Mode::E164).to_string();
        if !is_e164(&formatted) {
            return Err(VerificationError::InvalidFormat {
                reason: "phone number has the wrong length".to_string(),
            });
        }
        Ok(formatted)
    }
}
