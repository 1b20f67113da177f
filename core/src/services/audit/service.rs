//! Audit service for recording verification attempts and security events.
//!
//! Writes are absorb-only: a failed audit write is reported through tracing
//! and never propagates to the caller, so user-facing verification never
//! depends on audit availability.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task;
use tracing::error;
use uuid::Uuid;

use crate::domain::entities::audit::{AuditAction, AuditEntry};
use crate::errors::DomainResult;
use crate::repositories::AuditLogRepository;

/// Configuration for the audit service
#[derive(Debug, Clone)]
pub struct AuditServiceConfig {
    /// Whether to run audit writes in a background task
    pub async_writes: bool,
}

impl Default for AuditServiceConfig {
    fn default() -> Self {
        Self { async_writes: true }
    }
}

/// Service for recording and querying the audit trail
pub struct AuditService<R>
where
    R: AuditLogRepository,
{
    repository: Arc<R>,
    config: AuditServiceConfig,
}

impl<R> AuditService<R>
where
    R: AuditLogRepository + 'static,
{
    /// Create a new audit service
    pub fn new(repository: Arc<R>, config: AuditServiceConfig) -> Self {
        Self { repository, config }
    }

    /// Record an audit entry.
    ///
    /// Never fails: write errors are logged and swallowed. With
    /// `async_writes` the call returns before the row is persisted.
    pub async fn record(&self, entry: AuditEntry) {
        if self.config.async_writes {
            let repository = Arc::clone(&self.repository);
            task::spawn(async move {
                if let Err(e) = repository.create(&entry).await {
                    error!(
                        action = entry.action.as_str(),
                        error = %e,
                        event = "audit_write_failed",
                        "Failed to write audit entry"
                    );
                }
            });
        } else if let Err(e) = self.repository.create(&entry).await {
            error!(
                action = entry.action.as_str(),
                error = %e,
                event = "audit_write_failed",
                "Failed to write audit entry"
            );
        }
    }

    /// Most recent entries for a subject, newest first
    pub async fn recent_for_subject(
        &self,
        subject_id: Uuid,
        limit: usize,
    ) -> DomainResult<Vec<AuditEntry>> {
        Ok(self.repository.find_by_subject(subject_id, limit).await?)
    }

    /// Count failed entries of the given action since `since`
    pub async fn count_failures_since(
        &self,
        action: AuditAction,
        subject_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> DomainResult<usize> {
        Ok(self
            .repository
            .count_failures_since(action, subject_id, since)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::repositories::MockAuditLogRepository;

    fn sync_service(repo: Arc<MockAuditLogRepository>) -> AuditService<MockAuditLogRepository> {
        AuditService::new(repo, AuditServiceConfig { async_writes: false })
    }

    #[tokio::test]
    async fn test_record_persists_entry() {
        let repo = Arc::new(MockAuditLogRepository::new());
        let service = sync_service(Arc::clone(&repo));
        let subject_id = Uuid::new_v4();

        service
            .record(AuditEntry::new(AuditAction::TokenCreated).with_subject(subject_id))
            .await;

        let recent = service.recent_for_subject(subject_id, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].action, AuditAction::TokenCreated);
    }

    #[tokio::test]
    async fn test_write_failure_is_absorbed() {
        let repo = Arc::new(MockAuditLogRepository::new());
        repo.set_fail_writes(true).await;
        let service = sync_service(Arc::clone(&repo));

        // no panic, no error surfaced
        service.record(AuditEntry::new(AuditAction::VerificationFailure)).await;
        assert!(repo.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_count_failures_since() {
        let repo = Arc::new(MockAuditLogRepository::new());
        let service = sync_service(Arc::clone(&repo));
        let subject_id = Uuid::new_v4();

        service
            .record(
                AuditEntry::new(AuditAction::VerificationFailure)
                    .with_subject(subject_id)
                    .with_error("expired"),
            )
            .await;
        service
            .record(AuditEntry::new(AuditAction::VerificationSuccess).with_subject(subject_id))
            .await;

        let since = Utc::now() - Duration::minutes(15);
        let failures = service
            .count_failures_since(AuditAction::VerificationFailure, Some(subject_id), since)
            .await
            .unwrap();
        assert_eq!(failures, 1);
    }
}
