//! Business services containing domain logic and use cases.

pub mod audit;
pub mod rate_limit;
pub mod token;
pub mod verification;

// Re-export commonly used types
pub use audit::{AuditService, AuditServiceConfig};
pub use rate_limit::{RateLimitDecision, ResendRateLimiter};
pub use token::{is_valid_token_format, TokenGenerator};
pub use verification::{
    IssueOutcome, MailSenderTrait, RequestContext, ResendOutcome, VerificationService,
};
