//! Subject entity: the identity-store view of a registered account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account as seen by the verification subsystem.
///
/// The identity store owns the full user record; this subsystem only reads
/// the email and writes the confirmation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique identifier for the subject
    pub id: Uuid,

    /// Email address, stored normalized (trimmed, lowercased)
    pub email: String,

    /// When the email address was confirmed; `None` until verification
    /// completes
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,
}

impl Subject {
    /// Creates a new unconfirmed subject
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            confirmed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the email address has been confirmed
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Set the confirmation timestamp. Write-once: returns `false` if the
    /// subject was already confirmed.
    pub fn confirm_at(&mut self, at: DateTime<Utc>) -> bool {
        if self.confirmed_at.is_some() {
            return false;
        }
        self.confirmed_at = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subject_unconfirmed() {
        let s = Subject::new("user@example.com");
        assert!(!s.is_confirmed());
        assert_eq!(s.email, "user@example.com");
    }

    #[test]
    fn test_confirm_is_write_once() {
        let mut s = Subject::new("user@example.com");
        let first = Utc::now();
        assert!(s.confirm_at(first));
        assert!(!s.confirm_at(first + chrono::Duration::seconds(10)));
        assert_eq!(s.confirmed_at, Some(first));
    }
}
