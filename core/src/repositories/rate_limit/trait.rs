//! Persisted resend-attempt ledger backing the sliding-window rate limiter.
//!
//! Admission counters live in the database rather than in process memory so
//! the limit holds across restarts and replicas. The window is the half-open
//! interval `(window_start, now]`: an attempt stamped exactly `window_start`
//! has aged out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StorageError;

/// One admitted resend attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendAttempt {
    /// Unique identifier for the attempt row
    pub id: Uuid,

    /// Subject the attempt was made for
    pub subject_id: Uuid,

    /// When the attempt was admitted
    pub attempted_at: DateTime<Utc>,
}

/// Repository trait for the resend-attempt ledger
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Atomically admit and record an attempt iff the subject has fewer than
    /// `limit` attempts inside `(window_start, now]`.
    ///
    /// The count check and the insert must be a single server-side decision
    /// (a conditional insert, or a transactional locked read-then-insert):
    /// two concurrent callers both seeing `limit - 1` and both inserting
    /// would break the limit. Returns the recorded attempt when admitted,
    /// `None` when the budget is exhausted.
    async fn reserve_if_below(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<ResendAttempt>, StorageError>;

    /// Count attempts inside `(window_start, now]`
    async fn count_in_window(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError>;

    /// Timestamp of the oldest attempt inside `(window_start, now]`
    async fn oldest_in_window(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StorageError>;

    /// Remove a previously recorded attempt so it no longer counts against
    /// the budget (used when mail delivery fails after admission). Returns
    /// whether a row was removed.
    async fn release(&self, attempt_id: Uuid) -> Result<bool, StorageError>;

    /// Delete attempts older than `cutoff`. Storage hygiene only.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError>;
}
