//! In-memory implementation of RateLimitRepository for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::StorageError;

use super::r#trait::{RateLimitRepository, ResendAttempt};

/// In-memory attempt ledger.
///
/// `reserve_if_below` holds one mutex across the count and the insert,
/// standing in for the database's conditional insert.
pub struct MockRateLimitRepository {
    attempts: Arc<Mutex<Vec<ResendAttempt>>>,
    fail_storage: Arc<Mutex<bool>>,
}

impl MockRateLimitRepository {
    /// Create an empty mock ledger
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(Vec::new())),
            fail_storage: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent call fail with a storage error
    pub async fn set_fail_storage(&self, fail: bool) {
        *self.fail_storage.lock().await = fail;
    }

    /// Total recorded attempts, regardless of window (test inspection)
    pub async fn total_recorded(&self) -> usize {
        self.attempts.lock().await.len()
    }

    async fn check_storage(&self) -> Result<(), StorageError> {
        if *self.fail_storage.lock().await {
            Err(StorageError::new("simulated storage failure"))
        } else {
            Ok(())
        }
    }

    fn in_window(
        attempt: &ResendAttempt,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        attempt.subject_id == subject_id
            && attempt.attempted_at > window_start
            && attempt.attempted_at <= now
    }
}

impl Default for MockRateLimitRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitRepository for MockRateLimitRepository {
    async fn reserve_if_below(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<ResendAttempt>, StorageError> {
        self.check_storage().await?;
        let mut attempts = self.attempts.lock().await;

        let count = attempts
            .iter()
            .filter(|a| Self::in_window(a, subject_id, window_start, now))
            .count() as u32;
        if count >= limit {
            return Ok(None);
        }

        let attempt = ResendAttempt {
            id: Uuid::new_v4(),
            subject_id,
            attempted_at: now,
        };
        attempts.push(attempt.clone());
        Ok(Some(attempt))
    }

    async fn count_in_window(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        self.check_storage().await?;
        let attempts = self.attempts.lock().await;
        Ok(attempts
            .iter()
            .filter(|a| Self::in_window(a, subject_id, window_start, now))
            .count() as u32)
    }

    async fn oldest_in_window(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.check_storage().await?;
        let attempts = self.attempts.lock().await;
        Ok(attempts
            .iter()
            .filter(|a| Self::in_window(a, subject_id, window_start, now))
            .map(|a| a.attempted_at)
            .min())
    }

    async fn release(&self, attempt_id: Uuid) -> Result<bool, StorageError> {
        self.check_storage().await?;
        let mut attempts = self.attempts.lock().await;
        let before = attempts.len();
        attempts.retain(|a| a.id != attempt_id);
        Ok(attempts.len() < before)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        self.check_storage().await?;
        let mut attempts = self.attempts.lock().await;
        let before = attempts.len();
        attempts.retain(|a| a.attempted_at >= cutoff);
        Ok(before - attempts.len())
    }
}
