//! Verification orchestrator module.
//!
//! Composes the token generator, token store, rate limiter, audit service
//! and mail sender into the three public operations of the subsystem:
//! - issuing the initial token at registration
//! - rate-limited resends with a replacement token
//! - completing verification by consuming a presented secret

mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use service::VerificationService;
pub use traits::MailSenderTrait;
pub use types::{IssueOutcome, RequestContext, ResendOutcome};
