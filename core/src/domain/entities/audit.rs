//! Audit log entity for recording verification and security events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use mp_shared::utils::sanitize::{sanitize_opt, sanitize_text};

/// Event types recorded by the verification subsystem
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A new verification token was issued
    TokenCreated,
    /// A token was presented for completion
    VerificationAttempt,
    /// Completion succeeded and the subject was confirmed
    VerificationSuccess,
    /// Completion failed (reason in details/error_message)
    VerificationFailure,
    /// A resend was admitted and a replacement token issued
    ResendRequested,
    /// A resend was denied by the rate limiter
    ResendBlocked,
    /// The verification email could not be delivered
    MailDeliveryFailed,
}

impl AuditAction {
    /// Convert to string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenCreated => "TOKEN_CREATED",
            Self::VerificationAttempt => "VERIFICATION_ATTEMPT",
            Self::VerificationSuccess => "VERIFICATION_SUCCESS",
            Self::VerificationFailure => "VERIFICATION_FAILURE",
            Self::ResendRequested => "RESEND_REQUESTED",
            Self::ResendBlocked => "RESEND_BLOCKED",
            Self::MailDeliveryFailed => "MAIL_DELIVERY_FAILED",
        }
    }

    /// Parse from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TOKEN_CREATED" => Some(Self::TokenCreated),
            "VERIFICATION_ATTEMPT" => Some(Self::VerificationAttempt),
            "VERIFICATION_SUCCESS" => Some(Self::VerificationSuccess),
            "VERIFICATION_FAILURE" => Some(Self::VerificationFailure),
            "RESEND_REQUESTED" => Some(Self::ResendRequested),
            "RESEND_BLOCKED" => Some(Self::ResendBlocked),
            "MAIL_DELIVERY_FAILED" => Some(Self::MailDeliveryFailed),
            _ => None,
        }
    }
}

/// An append-only audit record. Entries are never mutated after creation.
///
/// Free-text fields pass through the sanitizer before they are stored, and
/// token secrets never appear in any field; correlation uses the row id of
/// the token or a truncated hash prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Unique identifier for the log entry
    pub id: Uuid,

    /// Subject the event relates to, if known
    pub subject_id: Option<Uuid>,

    /// Type of event
    pub action: AuditAction,

    /// IP address of the request
    pub source_ip: Option<String>,

    /// User agent string from the request (sanitized)
    pub user_agent: Option<String>,

    /// Token row the event relates to, if any
    pub token_id: Option<Uuid>,

    /// Structured event data; string values are sanitized on insertion
    pub details: JsonValue,

    /// Whether the action succeeded
    pub success: bool,

    /// Error message for failed actions (sanitized)
    pub error_message: Option<String>,

    /// Timestamp when the event occurred
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Create a new audit entry for the given action
    pub fn new(action: AuditAction) -> Self {
        let success = matches!(
            action,
            AuditAction::TokenCreated
                | AuditAction::VerificationSuccess
                | AuditAction::ResendRequested
        );

        Self {
            id: Uuid::new_v4(),
            subject_id: None,
            action,
            source_ip: None,
            user_agent: None,
            token_id: None,
            details: JsonValue::Null,
            success,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Add subject context
    pub fn with_subject(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    /// Add the related token row id
    pub fn with_token(mut self, token_id: Uuid) -> Self {
        self.token_id = Some(token_id);
        self
    }

    /// Add request context (IP and user agent). The user agent is untrusted
    /// input and is sanitized here.
    pub fn with_request_context(
        mut self,
        source_ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.source_ip = source_ip;
        self.user_agent = sanitize_opt(user_agent.as_deref());
        self
    }

    /// Add error context for failed actions
    pub fn with_error(mut self, error_message: impl AsRef<str>) -> Self {
        self.error_message = Some(sanitize_text(error_message.as_ref()));
        self.success = false;
        self
    }

    /// Add one structured detail. String values are sanitized; other JSON
    /// values are stored as-is.
    pub fn with_detail(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        let value = match value {
            JsonValue::String(s) => JsonValue::String(sanitize_text(&s)),
            other => other,
        };

        match &mut self.details {
            JsonValue::Object(map) => {
                map.insert(key.into(), value);
            }
            _ => {
                let mut map = Map::new();
                map.insert(key.into(), value);
                self.details = JsonValue::Object(map);
            }
        }
        self
    }

    /// Truncated prefix of a token hash, safe for correlation in logs
    pub fn hash_prefix(token_hash: &str) -> String {
        token_hash.chars().take(8).collect()
    }
}
