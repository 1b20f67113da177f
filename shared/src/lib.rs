//! # Mailproof Shared
//!
//! Configuration structs and cross-cutting utilities shared by the Mailproof
//! backend crates: database/mail/rate-limit/verification configuration,
//! email validation and masking, and audit-text sanitization.

pub mod config;
pub mod utils;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, MailConfig, RateLimitConfig, VerificationConfig};
