//! No-op implementation of AuditLogRepository for deployments that disable
//! auditing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::audit::{AuditAction, AuditEntry};
use crate::errors::StorageError;

use super::AuditLogRepository;

/// Discards every entry and reports success
pub struct NoOpAuditLogRepository;

impl NoOpAuditLogRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepository for NoOpAuditLogRepository {
    async fn create(&self, _entry: &AuditEntry) -> Result<(), StorageError> {
        Ok(())
    }

    async fn find_by_subject(
        &self,
        _subject_id: Uuid,
        _limit: usize,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        Ok(Vec::new())
    }

    async fn count_failures_since(
        &self,
        _action: AuditAction,
        _subject_id: Option<Uuid>,
        _since: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        Ok(0)
    }
}
