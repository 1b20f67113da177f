//! Types for verification orchestrator results.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Request metadata threaded through for audit correlation
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// IP address the request arrived from
    pub source_ip: Option<String>,
    /// User agent header, untrusted
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(source_ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            source_ip,
            user_agent,
        }
    }
}

/// Result of issuing a token.
///
/// `secret_token` is the only copy of the raw secret that will ever exist;
/// the store keeps just its hash.
#[derive(Debug, Clone)]
pub struct IssueOutcome {
    /// The raw secret to embed in the verification link
    pub secret_token: String,
    /// Row id of the stored token
    pub token_id: Uuid,
    /// When the token expires (exclusive)
    pub expires_at: DateTime<Utc>,
}

/// Result of an admitted resend
#[derive(Debug, Clone)]
pub struct ResendOutcome {
    /// Resend budget left in the current window
    pub remaining_attempts: u32,
    /// Provider id of the delivered message
    pub message_id: String,
    /// Row id of the replacement token
    pub token_id: Uuid,
    /// When the replacement token expires (exclusive)
    pub expires_at: DateTime<Utc>,
}
