//! Token repository trait defining the interface for verification token
//! persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::verification_token::{TokenType, VerificationToken};
use crate::errors::{ConsumeError, StorageError};

/// Repository trait for [`VerificationToken`] persistence.
///
/// Implementations carry the subsystem's concurrency guarantees: `issue`
/// supersedes the previous active token and inserts the new one inside a
/// single transaction, and `consume` marks a token used through an atomic
/// conditional update so that at most one of any number of concurrent
/// consumers succeeds. No in-process locking is assumed; the service may run
/// as multiple replicas against one database.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a freshly issued token.
    ///
    /// Inside one transaction: any currently-active token for the same
    /// `(subject_id, token_type)` gets `invalidated_at` set, then the new row
    /// is inserted. This is what maintains the single-active-token invariant.
    ///
    /// # Returns
    /// * `Ok(VerificationToken)` - the stored token
    /// * `Err(StorageError)` - the transaction failed; nothing was written
    async fn issue(&self, token: VerificationToken) -> Result<VerificationToken, StorageError>;

    /// Consume the token with the given hash at the given instant.
    ///
    /// Fails with `NotFound` when no row matches, `Expired` when
    /// `now >= expires_at`, `AlreadyUsed` when `used_at` is set, and
    /// `Invalidated` when superseded. On the happy path the implementation
    /// must perform a conditional update (`SET used_at = now WHERE id = ?
    /// AND used_at IS NULL AND invalidated_at IS NULL`) and report
    /// `AlreadyUsed` when zero rows were affected: that losing side of the
    /// race is what guarantees at-most-once consumption.
    ///
    /// State failures on a matched row count against the token's
    /// failed-validation budget; a token that exhausts the budget is
    /// invalidated outright.
    async fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationToken, ConsumeError>;

    /// Find a token by its hash
    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, StorageError>;

    /// Find the active (never used, never invalidated, unexpired) token for
    /// a subject and type, if one exists
    async fn find_active(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationToken>, StorageError>;

    /// Count tokens issued for the subject and type since `window_start`
    /// (exclusive). Read-only ranged query over `issued_at`.
    async fn count_issued_since(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
        window_start: DateTime<Utc>,
    ) -> Result<u32, StorageError>;

    /// Delete rows whose `expires_at` has passed. Storage hygiene only:
    /// expiry is always re-derived at read time and never depends on this
    /// sweep having run.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError>;
}
