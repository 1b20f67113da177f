//! MySQL implementation of the TokenRepository trait.
//!
//! The single-active-token invariant and at-most-once consumption both rest
//! on this file: supersession happens transactionally inside `issue`, and
//! `consume` finishes with a conditional update whose affected-row count
//! decides the race between concurrent consumers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use tracing::warn;
use uuid::Uuid;

use mp_core::domain::entities::verification_token::{TokenType, VerificationToken};
use mp_core::errors::{ConsumeError, StorageError};
use mp_core::repositories::TokenRepository;

use crate::database::storage_err;

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a database row to a VerificationToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<VerificationToken, StorageError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| storage_err("failed to get id", e))?;
        let subject_id: String = row
            .try_get("subject_id")
            .map_err(|e| storage_err("failed to get subject_id", e))?;
        let token_type: String = row
            .try_get("token_type")
            .map_err(|e| storage_err("failed to get token_type", e))?;
        let metadata: Option<String> = row
            .try_get("metadata")
            .map_err(|e| storage_err("failed to get metadata", e))?;

        Ok(VerificationToken {
            id: Uuid::parse_str(&id)
                .map_err(|e| StorageError::new(format!("invalid token UUID: {}", e)))?,
            subject_id: Uuid::parse_str(&subject_id)
                .map_err(|e| StorageError::new(format!("invalid subject UUID: {}", e)))?,
            token_hash: row
                .try_get("token_hash")
                .map_err(|e| storage_err("failed to get token_hash", e))?,
            token_type: TokenType::from_str(&token_type).ok_or_else(|| {
                StorageError::new(format!("unknown token type: {}", token_type))
            })?,
            issued_at: row
                .try_get::<DateTime<Utc>, _>("issued_at")
                .map_err(|e| storage_err("failed to get issued_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| storage_err("failed to get expires_at", e))?,
            used_at: row
                .try_get::<Option<DateTime<Utc>>, _>("used_at")
                .map_err(|e| storage_err("failed to get used_at", e))?,
            invalidated_at: row
                .try_get::<Option<DateTime<Utc>>, _>("invalidated_at")
                .map_err(|e| storage_err("failed to get invalidated_at", e))?,
            issued_from_ip: row
                .try_get("issued_from_ip")
                .map_err(|e| storage_err("failed to get issued_from_ip", e))?,
            attempt_count: row
                .try_get("attempt_count")
                .map_err(|e| storage_err("failed to get attempt_count", e))?,
            max_attempts: row
                .try_get("max_attempts")
                .map_err(|e| storage_err("failed to get max_attempts", e))?,
            metadata: metadata
                .and_then(|m| serde_json::from_str(&m).ok())
                .unwrap_or(serde_json::Value::Null),
        })
    }

    /// Count a failed validation against the row; exhausting the budget
    /// invalidates a still-pending token. Best effort: the consume outcome
    /// stands even when this bookkeeping write fails.
    async fn record_failed_attempt(&self, token_id: Uuid, now: DateTime<Utc>) {
        // MySQL applies SET clauses left to right, so the CASE already sees
        // the incremented attempt_count
        let query = r#"
            UPDATE verification_tokens
            SET attempt_count = attempt_count + 1,
                invalidated_at = CASE
                    WHEN attempt_count >= max_attempts
                         AND used_at IS NULL AND invalidated_at IS NULL
                    THEN ?
                    ELSE invalidated_at
                END
            WHERE id = ?
        "#;

        if let Err(e) = sqlx::query(query)
            .bind(now)
            .bind(token_id.to_string())
            .execute(&self.pool)
            .await
        {
            warn!(
                token_id = %token_id,
                error = %e,
                "Failed to record failed validation attempt"
            );
        }
    }
}

const TOKEN_COLUMNS: &str = "id, subject_id, token_hash, token_type, issued_at, expires_at, \
     used_at, invalidated_at, issued_from_ip, attempt_count, max_attempts, metadata";

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn issue(&self, token: VerificationToken) -> Result<VerificationToken, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("failed to begin issue transaction", e))?;

        // supersede the currently-active token for this subject and type
        sqlx::query(
            r#"
            UPDATE verification_tokens
            SET invalidated_at = ?
            WHERE subject_id = ? AND token_type = ?
                AND used_at IS NULL AND invalidated_at IS NULL
            "#,
        )
        .bind(token.issued_at)
        .bind(token.subject_id.to_string())
        .bind(token.token_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("failed to invalidate previous token", e))?;

        let metadata = if token.metadata.is_null() {
            None
        } else {
            Some(token.metadata.to_string())
        };

        sqlx::query(
            r#"
            INSERT INTO verification_tokens (
                id, subject_id, token_hash, token_type, issued_at, expires_at,
                used_at, invalidated_at, issued_from_ip, attempt_count,
                max_attempts, metadata
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(token.subject_id.to_string())
        .bind(&token.token_hash)
        .bind(token.token_type.as_str())
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.invalidated_at)
        .bind(&token.issued_from_ip)
        .bind(token.attempt_count)
        .bind(token.max_attempts)
        .bind(metadata)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("failed to insert token", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("failed to commit issue transaction", e))?;

        Ok(token)
    }

    async fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationToken, ConsumeError> {
        let query = format!(
            "SELECT {} FROM verification_tokens WHERE token_hash = ? LIMIT 1",
            TOKEN_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ConsumeError::Storage(storage_err("failed to look up token", e)))?;

        let token = match row {
            Some(row) => Self::row_to_token(&row)?,
            None => return Err(ConsumeError::NotFound),
        };

        if token.is_expired_at(now) {
            self.record_failed_attempt(token.id, now).await;
            return Err(ConsumeError::Expired);
        }
        if token.is_used() {
            self.record_failed_attempt(token.id, now).await;
            return Err(ConsumeError::AlreadyUsed);
        }
        if token.is_invalidated() {
            self.record_failed_attempt(token.id, now).await;
            return Err(ConsumeError::Invalidated);
        }

        // the deciding write: zero affected rows means a concurrent consumer
        // got here between our read and this statement
        let result = sqlx::query(
            r#"
            UPDATE verification_tokens
            SET used_at = ?
            WHERE id = ? AND used_at IS NULL AND invalidated_at IS NULL
            "#,
        )
        .bind(now)
        .bind(token.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| ConsumeError::Storage(storage_err("failed to consume token", e)))?;

        if result.rows_affected() == 0 {
            return Err(ConsumeError::AlreadyUsed);
        }

        Ok(VerificationToken {
            used_at: Some(now),
            ..token
        })
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, StorageError> {
        let query = format!(
            "SELECT {} FROM verification_tokens WHERE token_hash = ? LIMIT 1",
            TOKEN_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("failed to find token by hash", e))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_active(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationToken>, StorageError> {
        let query = format!(
            r#"
            SELECT {} FROM verification_tokens
            WHERE subject_id = ? AND token_type = ?
                AND used_at IS NULL AND invalidated_at IS NULL AND expires_at > ?
            ORDER BY issued_at DESC
            LIMIT 1
            "#,
            TOKEN_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(subject_id.to_string())
            .bind(token_type.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("failed to find active token", e))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    async fn count_issued_since(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
        window_start: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt FROM verification_tokens
            WHERE subject_id = ? AND token_type = ? AND issued_at > ?
            "#,
        )
        .bind(subject_id.to_string())
        .bind(token_type.as_str())
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("failed to count issued tokens", e))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| storage_err("failed to get count", e))?;
        Ok(count as u32)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("failed to delete expired tokens", e))?;

        Ok(result.rows_affected() as usize)
    }
}
