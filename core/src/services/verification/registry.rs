//! Process-wide map from method tag to configured validator
//!
//! Built once during startup with [`ValidatorRegistryBuilder`], then shared
//! read-only (behind an `Arc`) with the credential-management layer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::{DomainError, DomainResult, VerificationError};

use super::validator::CredentialValidator;

/// Registered validators keyed by method tag
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn CredentialValidator>>,
}

impl ValidatorRegistry {
    pub fn builder() -> ValidatorRegistryBuilder {
        ValidatorRegistryBuilder::default()
    }

    /// Validator registered under `method`
    pub fn get(&self, method: &str) -> DomainResult<Arc<dyn CredentialValidator>> {
        self.validators.get(method).cloned().ok_or_else(|| {
            VerificationError::UnknownMethod {
                method: method.to_string(),
            }
            .into()
        })
    }

    pub fn contains(&self, method: &str) -> bool {
        self.validators.contains_key(method)
    }

    /// Registered tags in lexical order
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validator responsible for a `method:value` descriptor
    pub fn resolve(
        &self,
        descriptor: &CredentialDescriptor,
    ) -> DomainResult<Arc<dyn CredentialValidator>> {
        self.get(&descriptor.method)
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

/// Collects validators during startup
#[derive(Default)]
pub struct ValidatorRegistryBuilder {
    validators: HashMap<String, Arc<dyn CredentialValidator>>,
}

impl ValidatorRegistryBuilder {
    /// Initialize `validator` with `jsonconf` and register it under its tag
    ///
    /// Fails fast on a duplicate tag or malformed configuration.
    pub fn register(
        mut self,
        validator: Arc<dyn CredentialValidator>,
        jsonconf: &str,
    ) -> DomainResult<Self> {
        let method = validator.method().to_string();
        if self.validators.contains_key(&method) {
            return Err(DomainError::Configuration {
                message: format!("Validator '{}' is registered twice", method),
            });
        }

        validator.init(jsonconf).map_err(|e| match e {
            DomainError::Configuration { message } => DomainError::Configuration {
                message: format!("Validator '{}': {}", method, message),
            },
            other => other,
        })?;

        tracing::info!(method = %method, event = "validator_registered", "Registered validator");
        self.validators.insert(method, validator);
        Ok(self)
    }

    pub fn build(self) -> ValidatorRegistry {
        ValidatorRegistry {
            validators: self.validators,
        }
    }
}

/// A user-submitted credential in `method:value` form, e.g. `tel:+15551234567`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescriptor {
    pub method: String,
    pub value: String,
}

impl CredentialDescriptor {
    /// Parse a comma separated list of descriptors
    pub fn parse_list(input: &str) -> DomainResult<Vec<Self>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for CredentialDescriptor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, value) = s.split_once(':').ok_or_else(|| DomainError::Validation {
            message: "Credential must be in method:value format".to_string(),
        })?;
        let (method, value) = (method.trim(), value.trim());
        if method.is_empty() || value.is_empty() {
            return Err(DomainError::Validation {
                message: "Credential method and value must not be empty".to_string(),
            });
        }
        Ok(Self {
            method: method.to_ascii_lowercase(),
            value: value.to_string(),
        })
    }
}
