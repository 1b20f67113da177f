//! MySQL implementation of the SubjectRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use mp_core::domain::entities::subject::Subject;
use mp_core::errors::StorageError;
use mp_core::repositories::SubjectRepository;

use crate::database::storage_err;

/// MySQL implementation of SubjectRepository
pub struct MySqlSubjectRepository {
    pool: MySqlPool,
}

impl MySqlSubjectRepository {
    /// Create a new MySQL subject repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_subject(row: &sqlx::mysql::MySqlRow) -> Result<Subject, StorageError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| storage_err("failed to get id", e))?;

        Ok(Subject {
            id: Uuid::parse_str(&id)
                .map_err(|e| StorageError::new(format!("invalid subject UUID: {}", e)))?,
            email: row
                .try_get("email")
                .map_err(|e| storage_err("failed to get email", e))?,
            confirmed_at: row
                .try_get::<Option<DateTime<Utc>>, _>("confirmed_at")
                .map_err(|e| storage_err("failed to get confirmed_at", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| storage_err("failed to get created_at", e))?,
        })
    }
}

#[async_trait]
impl SubjectRepository for MySqlSubjectRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subject>, StorageError> {
        let row = sqlx::query(
            "SELECT id, email, confirmed_at, created_at FROM subjects WHERE email = ? LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("failed to find subject by email", e))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_subject(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>, StorageError> {
        let row = sqlx::query(
            "SELECT id, email, confirmed_at, created_at FROM subjects WHERE id = ? LIMIT 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("failed to find subject by id", e))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_subject(&row)?)),
            None => Ok(None),
        }
    }

    async fn mark_confirmed(
        &self,
        subject_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        // conditional write: only the first confirmation applies
        let result = sqlx::query(
            "UPDATE subjects SET confirmed_at = ? WHERE id = ? AND confirmed_at IS NULL",
        )
        .bind(at)
        .bind(subject_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("failed to mark subject confirmed", e))?;

        Ok(result.rows_affected() > 0)
    }
}
