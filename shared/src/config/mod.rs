//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `database` - Database connection and pool configuration
//! - `mail` - Outbound mail provider configuration
//! - `rate_limit` - Sliding-window resend rate limiting
//! - `verification` - Token lifecycle configuration

pub mod database;
pub mod mail;
pub mod rate_limit;
pub mod verification;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use database::DatabaseConfig;
pub use mail::MailConfig;
pub use rate_limit::RateLimitConfig;
pub use verification::VerificationConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Resend rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Token lifecycle configuration
    #[serde(default)]
    pub verification: VerificationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            mail: MailConfig::default(),
            rate_limit: RateLimitConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
            mail: MailConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            verification: VerificationConfig::from_env(),
        }
    }

    /// Create configuration for development environments
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig::new("mysql://localhost:3306/mailproof_dev"),
            mail: MailConfig::mock(),
            rate_limit: RateLimitConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}
