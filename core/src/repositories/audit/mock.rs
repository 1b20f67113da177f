//! In-memory implementation of AuditLogRepository for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::audit::{AuditAction, AuditEntry};
use crate::errors::StorageError;

use super::AuditLogRepository;

/// In-memory, append-only audit store
pub struct MockAuditLogRepository {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
    fail_writes: Arc<RwLock<bool>>,
}

impl MockAuditLogRepository {
    /// Create an empty mock repository
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            fail_writes: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every subsequent write fail (read-back still works)
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    /// All recorded entries in insertion order (test inspection)
    pub async fn all(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Entries recorded for the given action (test inspection)
    pub async fn entries_for(&self, action: AuditAction) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl Default for MockAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepository for MockAuditLogRepository {
    async fn create(&self, entry: &AuditEntry) -> Result<(), StorageError> {
        if *self.fail_writes.read().await {
            return Err(StorageError::new("simulated audit write failure"));
        }
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn find_by_subject(
        &self,
        subject_id: Uuid,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        let entries = self.entries.read().await;
        let mut matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| e.subject_id == Some(subject_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(limit);
        Ok(matched)
    }

    async fn count_failures_since(
        &self,
        action: AuditAction,
        subject_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| {
                e.action == action
                    && !e.success
                    && e.created_at >= since
                    && subject_id.map_or(true, |id| e.subject_id == Some(id))
            })
            .count())
    }
}
