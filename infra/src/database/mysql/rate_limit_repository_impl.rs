//! MySQL implementation of the RateLimitRepository trait.
//!
//! The reservation path runs a locked count inside a transaction so that
//! concurrent callers for the same subject serialize: a plain read-then-
//! insert would let two requests both observe `limit - 1` and both insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use mp_core::errors::StorageError;
use mp_core::repositories::{RateLimitRepository, ResendAttempt};

use crate::database::storage_err;

/// MySQL implementation of RateLimitRepository
pub struct MySqlRateLimitRepository {
    pool: MySqlPool,
}

impl MySqlRateLimitRepository {
    /// Create a new MySQL attempt ledger
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRepository for MySqlRateLimitRepository {
    async fn reserve_if_below(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Option<ResendAttempt>, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("failed to begin reservation transaction", e))?;

        // FOR UPDATE locks the subject's attempt rows (and the gap) until
        // commit, serializing concurrent reservations
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt FROM resend_attempts
            WHERE subject_id = ? AND attempted_at > ? AND attempted_at <= ?
            FOR UPDATE
            "#,
        )
        .bind(subject_id.to_string())
        .bind(window_start)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("failed to count attempts in window", e))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| storage_err("failed to get count", e))?;

        if count as u32 >= limit {
            tx.rollback()
                .await
                .map_err(|e| storage_err("failed to roll back reservation", e))?;
            return Ok(None);
        }

        let attempt = ResendAttempt {
            id: Uuid::new_v4(),
            subject_id,
            attempted_at: now,
        };

        sqlx::query(
            "INSERT INTO resend_attempts (id, subject_id, attempted_at) VALUES (?, ?, ?)",
        )
        .bind(attempt.id.to_string())
        .bind(attempt.subject_id.to_string())
        .bind(attempt.attempted_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("failed to insert attempt", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("failed to commit reservation", e))?;

        Ok(Some(attempt))
    }

    async fn count_in_window(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt FROM resend_attempts
            WHERE subject_id = ? AND attempted_at > ? AND attempted_at <= ?
            "#,
        )
        .bind(subject_id.to_string())
        .bind(window_start)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("failed to count attempts", e))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| storage_err("failed to get count", e))?;
        Ok(count as u32)
    }

    async fn oldest_in_window(
        &self,
        subject_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT MIN(attempted_at) AS oldest FROM resend_attempts
            WHERE subject_id = ? AND attempted_at > ? AND attempted_at <= ?
            "#,
        )
        .bind(subject_id.to_string())
        .bind(window_start)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("failed to find oldest attempt", e))?;

        row.try_get::<Option<DateTime<Utc>>, _>("oldest")
            .map_err(|e| storage_err("failed to get oldest attempt", e))
    }

    async fn release(&self, attempt_id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM resend_attempts WHERE id = ?")
            .bind(attempt_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("failed to release attempt", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM resend_attempts WHERE attempted_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("failed to delete old attempts", e))?;

        Ok(result.rows_affected() as usize)
    }
}
