//! Resend attempt ledger module for sliding-window rate limiting.

mod r#trait;
pub use r#trait::{RateLimitRepository, ResendAttempt};

mod mock;
pub use mock::MockRateLimitRepository;

#[cfg(test)]
mod tests;
