//! Error types for the verification subsystem.
//!
//! Every failure mode is a closed tagged variant; callers dispatch on the
//! type, never on message text.

use thiserror::Error;

/// Store-layer failure (connectivity, constraint violation). Transient and
/// safe to retry; never silently swallowed by the repositories.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("storage error: {message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a failed token consumption at the store layer.
///
/// These variants are audit detail, not user messaging: the orchestrator
/// collapses all of them into [`CompleteError::InvalidToken`] before anything
/// leaves the subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsumeError {
    #[error("no token matches the presented secret")]
    NotFound,

    #[error("token has expired")]
    Expired,

    #[error("token has already been used")]
    AlreadyUsed,

    #[error("token was superseded by a newer one")]
    Invalidated,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ConsumeError {
    /// Stable label for audit records
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::AlreadyUsed => "already_used",
            Self::Invalidated => "invalidated",
            Self::Storage(_) => "storage_error",
        }
    }
}

/// Failure modes of the `complete` operation as seen by callers.
///
/// Exactly two outward states exist: verified, or the single generic
/// `InvalidToken`. `NotFound`, `Expired`, `AlreadyUsed`, `Invalidated` and
/// malformed input are deliberately indistinguishable so responses cannot be
/// used as a token-existence oracle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompleteError {
    #[error("verification link is invalid or has expired; request a new one")]
    InvalidToken,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Mail sender failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail provider rejected the message: {message}")]
    Rejected { message: String },

    #[error("mail delivery failed: {message}")]
    Delivery { message: String },

    #[error("mail provider timed out")]
    Timeout,
}

/// Failure modes of the `resend` operation.
///
/// `RateLimited` and `AlreadyVerified` carry specific, actionable messages;
/// neither leaks token-existence information.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResendError {
    #[error("email address is not syntactically valid")]
    InvalidEmail,

    #[error("no account exists for this email address")]
    UserNotFound,

    #[error("email address is already verified")]
    AlreadyVerified,

    #[error("too many resend requests; retry in {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    #[error("verification email could not be delivered")]
    MailDeliveryFailed(#[source] MailError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_error_message_is_generic() {
        // one message for every internal failure kind; no state leaks
        let msg = CompleteError::InvalidToken.to_string();
        assert!(!msg.contains("already been used"));
        assert!(!msg.contains("superseded"));
        assert!(!msg.contains("no token"));
        assert!(msg.contains("request a new one"));
    }

    #[test]
    fn test_consume_reason_labels() {
        assert_eq!(ConsumeError::NotFound.reason(), "not_found");
        assert_eq!(ConsumeError::Expired.reason(), "expired");
        assert_eq!(ConsumeError::AlreadyUsed.reason(), "already_used");
        assert_eq!(ConsumeError::Invalidated.reason(), "invalidated");
    }

    #[test]
    fn test_rate_limited_message_carries_retry_after() {
        let err = ResendError::RateLimited {
            retry_after_seconds: 1800,
        };
        assert!(err.to_string().contains("1800"));
    }

    #[test]
    fn test_storage_error_bridges() {
        let storage = StorageError::new("connection reset");
        let consume: ConsumeError = storage.clone().into();
        assert_eq!(consume, ConsumeError::Storage(storage.clone()));
        let resend: ResendError = storage.clone().into();
        assert_eq!(resend, ResendError::Storage(storage));
    }
}
