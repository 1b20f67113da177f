//! Outbound mail configuration module

use serde::{Deserialize, Serialize};

/// Configuration for the outbound mail provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// Provider selector: "mock" or "brevo"
    pub provider: String,

    /// Base URL of the provider's HTTP API
    pub api_base_url: String,

    /// API key for the provider
    pub api_key: String,

    /// Sender address
    pub from_address: String,

    /// Sender display name
    pub from_name: String,

    /// Base URL the verification link points at; the secret token is
    /// appended as a path segment by the template
    pub verification_url_base: String,

    /// Maximum retry attempts for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: String::from("mock"),
            api_base_url: String::from("https://api.brevo.com"),
            api_key: String::new(),
            from_address: String::from("no-reply@mailproof.dev"),
            from_name: String::from("Mailproof"),
            verification_url_base: String::from("https://app.mailproof.dev/verify"),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl MailConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("MAIL_PROVIDER").unwrap_or(defaults.provider),
            api_base_url: std::env::var("MAIL_API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_key: std::env::var("MAIL_API_KEY").unwrap_or_default(),
            from_address: std::env::var("MAIL_FROM_ADDRESS").unwrap_or(defaults.from_address),
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or(defaults.from_name),
            verification_url_base: std::env::var("MAIL_VERIFICATION_URL_BASE")
                .unwrap_or(defaults.verification_url_base),
            max_retries: std::env::var("MAIL_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
            retry_delay_ms: std::env::var("MAIL_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_retry_delay_ms),
            request_timeout_secs: std::env::var("MAIL_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_request_timeout_secs),
        }
    }

    /// Configuration for the mock provider (development and tests)
    pub fn mock() -> Self {
        Self {
            provider: String::from("mock"),
            ..Default::default()
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}
