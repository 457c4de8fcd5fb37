//! Rate limiting for confirmation and reset deliveries
//!
//! A [`RateLimiter`] keeps, per key, a sliding window of delivery timestamps
//! and the time of the last delivery. The engine asks for one permit before
//! every delivery; a denial is surfaced as `RateLimited` and never retried.

mod limiter;
mod memory;

#[cfg(test)]
mod tests;

pub use limiter::{
    request_key, reset_key, DenialReason, RateLimitDecision, RateLimiter,
};
pub use memory::InMemoryRateLimiter;
