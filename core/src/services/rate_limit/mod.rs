//! Sliding-window admission control for resend requests.

mod limiter;

pub use limiter::{RateLimitDecision, ResendRateLimiter};
