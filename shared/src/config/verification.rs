//! Token lifecycle configuration module

use serde::{Deserialize, Serialize};

/// Configuration for verification token issuance and consumption
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Minutes until a newly issued token expires
    pub token_ttl_minutes: i64,

    /// Entropy of the secret token in bytes (minimum 32)
    pub token_byte_length: usize,

    /// Failed-validation attempts tolerated per token before it is
    /// invalidated outright
    pub max_attempts: i32,

    /// Minimum wall-clock duration of a `complete` call in milliseconds;
    /// every branch is padded to this floor so response timing does not
    /// reveal which validation step failed
    #[serde(default = "default_complete_floor_ms")]
    pub complete_floor_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 24 * 60,
            token_byte_length: 32,
            max_attempts: 5,
            complete_floor_ms: default_complete_floor_ms(),
        }
    }
}

impl VerificationConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            token_ttl_minutes: std::env::var("VERIFICATION_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_ttl_minutes),
            token_byte_length: std::env::var("VERIFICATION_TOKEN_BYTE_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_byte_length),
            max_attempts: std::env::var("VERIFICATION_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            complete_floor_ms: std::env::var("VERIFICATION_COMPLETE_FLOOR_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_complete_floor_ms),
        }
    }
}

fn default_complete_floor_ms() -> u64 {
    250
}
