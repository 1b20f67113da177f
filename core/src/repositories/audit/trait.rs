//! Audit log repository trait defining the interface for audit persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::audit::{AuditAction, AuditEntry};
use crate::errors::StorageError;

/// Repository trait for [`AuditEntry`] persistence.
///
/// The table is append-only: rows are created and read, never updated or
/// deleted. Write failures surface as `StorageError` here; the audit service
/// above this trait absorbs them so user-facing verification never fails on
/// a broken audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit entry
    async fn create(&self, entry: &AuditEntry) -> Result<(), StorageError>;

    /// Most recent entries for a subject, newest first
    async fn find_by_subject(
        &self,
        subject_id: Uuid,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, StorageError>;

    /// Count failed entries of the given action since `since`, optionally
    /// filtered by subject
    async fn count_failures_since(
        &self,
        action: AuditAction,
        subject_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<usize, StorageError>;
}
