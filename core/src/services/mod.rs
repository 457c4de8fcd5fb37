//! Business services containing domain logic and use cases.

pub mod rate_limit;
pub mod token;
pub mod verification;

// Re-export commonly used types
pub use rate_limit::{DenialReason, InMemoryRateLimiter, RateLimitDecision, RateLimiter};
pub use token::TokenGenerator;
pub use verification::{
    CheckOutcome, CredentialDescriptor, CredentialValidator, DeliveryError, DeliveryPayload,
    DeliveryPurpose, MethodConfig, Normalizer, RequestOutcome, RequestParams, ResetDispatch,
    Sender, ValidatorRegistry, ValidatorRegistryBuilder, VerificationEngine,
};
