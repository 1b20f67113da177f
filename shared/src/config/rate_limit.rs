//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Sliding-window rate limiting for verification resend requests.
///
/// The window is half-open: an attempt stamped exactly `window_minutes` ago
/// no longer counts against the budget.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum resend requests per subject within the trailing window
    pub max_resends_per_window: u32,

    /// Length of the trailing window in minutes
    pub window_minutes: i64,

    /// Policy when the limiter's own storage fails: `true` admits the
    /// request, `false` surfaces the storage error and the request is not
    /// admitted. Fail-closed is the default for this endpoint.
    #[serde(default)]
    pub fail_open: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_resends_per_window: 3,
            window_minutes: 60,
            fail_open: false,
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let max_resends_per_window = std::env::var("RATE_LIMIT_MAX_RESENDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let window_minutes = std::env::var("RATE_LIMIT_WINDOW_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        let fail_open = std::env::var("RATE_LIMIT_FAIL_OPEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        Self {
            enabled: default_enabled(),
            max_resends_per_window,
            window_minutes,
            fail_open,
        }
    }

    /// Window length in seconds
    pub fn window_seconds(&self) -> u64 {
        (self.window_minutes.max(0) as u64) * 60
    }
}

fn default_enabled() -> bool {
    true
}
