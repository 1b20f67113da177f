//! Single-use verification token entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Default time-to-live for a newly issued token (24 hours)
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 24 * 60;

/// Default number of failed validations tolerated per token
pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Purpose of a verification token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Proves control of an email address during registration
    EmailVerification,
    /// Proves control of an email address for a password reset
    PasswordReset,
}

impl TokenType {
    /// Convert to string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }

    /// Parse from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "email_verification" => Some(Self::EmailVerification),
            "password_reset" => Some(Self::PasswordReset),
            _ => None,
        }
    }
}

/// A single-use verification token.
///
/// Only the SHA-256 hash of the secret is ever stored; the raw secret exists
/// exclusively in the issuing response. A token reaches exactly one of two
/// terminal states, `used` or `invalidated`, while expiry is a predicate
/// derived from `expires_at` at read time. `expires_at` is an exclusive
/// bound: a token expiring exactly now is already expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationToken {
    /// Unique identifier for the token row
    pub id: Uuid,

    /// Subject (user) this token belongs to
    pub subject_id: Uuid,

    /// SHA-256 hex digest of the secret token value
    pub token_hash: String,

    /// Purpose of the token
    pub token_type: TokenType,

    /// Timestamp when the token was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp when the token expires (exclusive)
    pub expires_at: DateTime<Utc>,

    /// Set exactly once on successful consumption
    pub used_at: Option<DateTime<Utc>>,

    /// Set when superseded by a newer token of the same type
    pub invalidated_at: Option<DateTime<Utc>>,

    /// Requesting IP at issuance, for audit correlation
    pub issued_from_ip: Option<String>,

    /// Failed-validation counter for this token
    pub attempt_count: i32,

    /// Failed validations tolerated before the token is invalidated
    pub max_attempts: i32,

    /// Free-form metadata (e.g. which resend iteration produced it)
    pub metadata: JsonValue,
}

impl VerificationToken {
    /// Creates a new token issued now with the given time-to-live
    pub fn new(subject_id: Uuid, token_hash: String, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject_id,
            token_hash,
            token_type,
            issued_at: now,
            expires_at: now + ttl,
            used_at: None,
            invalidated_at: None,
            issued_from_ip: None,
            attempt_count: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            metadata: JsonValue::Null,
        }
    }

    /// Record the IP address the issuing request came from
    pub fn with_issued_from_ip(mut self, ip: Option<String>) -> Self {
        self.issued_from_ip = ip;
        self
    }

    /// Attach issuance metadata
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the failed-validation budget
    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether the token is expired at the given instant.
    ///
    /// The bound is exclusive: `at == expires_at` is expired.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.expires_at
    }

    /// Whether the token has been consumed
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Whether the token was superseded or revoked
    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some()
    }

    /// Whether the token is valid at the given instant: never used, never
    /// invalidated, and not yet expired.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        !self.is_used() && !self.is_invalidated() && !self.is_expired_at(at)
    }

    /// Whether the token is valid right now
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Mark the token as used. Write-once: returns `false` when the token
    /// already reached a terminal state, leaving it untouched.
    pub fn mark_used_at(&mut self, at: DateTime<Utc>) -> bool {
        if self.used_at.is_some() || self.invalidated_at.is_some() {
            return false;
        }
        self.used_at = Some(at);
        true
    }

    /// Mark the token as invalidated. Write-once: returns `false` when the
    /// token already reached a terminal state.
    pub fn invalidate_at(&mut self, at: DateTime<Utc>) -> bool {
        if self.used_at.is_some() || self.invalidated_at.is_some() {
            return false;
        }
        self.invalidated_at = Some(at);
        true
    }

    /// Count a failed validation against this token. Once the budget is
    /// exhausted the token is invalidated outright (unless already terminal).
    pub fn register_failed_attempt(&mut self, at: DateTime<Utc>) {
        self.attempt_count += 1;
        if self.attempt_count >= self.max_attempts {
            self.invalidate_at(at);
        }
    }

    /// Remaining failed-validation budget
    pub fn remaining_attempts(&self) -> i32 {
        (self.max_attempts - self.attempt_count).max(0)
    }

    /// Time remaining until expiry at the given instant, zero if expired
    pub fn time_until_expiration_at(&self, at: DateTime<Utc>) -> Duration {
        if self.expires_at > at {
            self.expires_at - at
        } else {
            Duration::zero()
        }
    }
}
