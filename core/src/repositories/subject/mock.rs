//! In-memory implementation of SubjectRepository for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::subject::Subject;
use crate::errors::StorageError;

use super::r#trait::SubjectRepository;

/// In-memory subject store
pub struct MockSubjectRepository {
    subjects: Arc<RwLock<HashMap<Uuid, Subject>>>,
    confirm_calls: Arc<RwLock<u32>>,
}

impl MockSubjectRepository {
    /// Create an empty mock repository
    pub fn new() -> Self {
        Self {
            subjects: Arc::new(RwLock::new(HashMap::new())),
            confirm_calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Seed a subject (test setup)
    pub async fn insert(&self, subject: Subject) {
        self.subjects.write().await.insert(subject.id, subject);
    }

    /// Number of `mark_confirmed` calls that actually applied
    pub async fn applied_confirmations(&self) -> u32 {
        *self.confirm_calls.read().await
    }
}

impl Default for MockSubjectRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubjectRepository for MockSubjectRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subject>, StorageError> {
        let subjects = self.subjects.read().await;
        Ok(subjects.values().find(|s| s.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>, StorageError> {
        Ok(self.subjects.read().await.get(&id).cloned())
    }

    async fn mark_confirmed(
        &self,
        subject_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut subjects = self.subjects.write().await;
        match subjects.get_mut(&subject_id) {
            Some(subject) => {
                let applied = subject.confirm_at(at);
                if applied {
                    *self.confirm_calls.write().await += 1;
                }
                Ok(applied)
            }
            None => Ok(false),
        }
    }
}
