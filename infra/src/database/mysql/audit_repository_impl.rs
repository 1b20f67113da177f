//! MySQL implementation of the AuditLogRepository trait.
//!
//! The table is append-only; no update or delete statements exist here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use mp_core::domain::entities::audit::{AuditAction, AuditEntry};
use mp_core::errors::StorageError;
use mp_core::repositories::AuditLogRepository;

use crate::database::storage_err;

/// MySQL implementation of AuditLogRepository
pub struct MySqlAuditLogRepository {
    pool: MySqlPool,
}

impl MySqlAuditLogRepository {
    /// Create a new MySQL audit repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &sqlx::mysql::MySqlRow) -> Result<AuditEntry, StorageError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| storage_err("failed to get id", e))?;
        let subject_id: Option<String> = row
            .try_get("subject_id")
            .map_err(|e| storage_err("failed to get subject_id", e))?;
        let action: String = row
            .try_get("action")
            .map_err(|e| storage_err("failed to get action", e))?;
        let token_id: Option<String> = row
            .try_get("token_id")
            .map_err(|e| storage_err("failed to get token_id", e))?;
        let details: Option<String> = row
            .try_get("details")
            .map_err(|e| storage_err("failed to get details", e))?;

        Ok(AuditEntry {
            id: Uuid::parse_str(&id)
                .map_err(|e| StorageError::new(format!("invalid entry UUID: {}", e)))?,
            subject_id: subject_id
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StorageError::new(format!("invalid subject UUID: {}", e)))?,
            action: AuditAction::from_str(&action)
                .ok_or_else(|| StorageError::new(format!("unknown audit action: {}", action)))?,
            source_ip: row
                .try_get("source_ip")
                .map_err(|e| storage_err("failed to get source_ip", e))?,
            user_agent: row
                .try_get("user_agent")
                .map_err(|e| storage_err("failed to get user_agent", e))?,
            token_id: token_id
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StorageError::new(format!("invalid token UUID: {}", e)))?,
            details: details
                .and_then(|d| serde_json::from_str(&d).ok())
                .unwrap_or(serde_json::Value::Null),
            success: row
                .try_get("success")
                .map_err(|e| storage_err("failed to get success", e))?,
            error_message: row
                .try_get("error_message")
                .map_err(|e| storage_err("failed to get error_message", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| storage_err("failed to get created_at", e))?,
        })
    }
}

#[async_trait]
impl AuditLogRepository for MySqlAuditLogRepository {
    async fn create(&self, entry: &AuditEntry) -> Result<(), StorageError> {
        let details = if entry.details.is_null() {
            None
        } else {
            Some(entry.details.to_string())
        };

        sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, subject_id, action, source_ip, user_agent, token_id,
                details, success, error_message, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.subject_id.map(|id| id.to_string()))
        .bind(entry.action.as_str())
        .bind(&entry.source_ip)
        .bind(&entry.user_agent)
        .bind(entry.token_id.map(|id| id.to_string()))
        .bind(details)
        .bind(entry.success)
        .bind(&entry.error_message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("failed to insert audit entry", e))?;

        Ok(())
    }

    async fn find_by_subject(
        &self,
        subject_id: Uuid,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, subject_id, action, source_ip, user_agent, token_id,
                   details, success, error_message, created_at
            FROM audit_log
            WHERE subject_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(subject_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("failed to find audit entries", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Self::row_to_entry(&row)?);
        }
        Ok(entries)
    }

    async fn count_failures_since(
        &self,
        action: AuditAction,
        subject_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt FROM audit_log
            WHERE action = ? AND success = FALSE AND created_at >= ?
                AND (? IS NULL OR subject_id = ?)
            "#,
        )
        .bind(action.as_str())
        .bind(since)
        .bind(subject_id.map(|id| id.to_string()))
        .bind(subject_id.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("failed to count audit failures", e))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| storage_err("failed to get count", e))?;
        Ok(count as usize)
    }
}
