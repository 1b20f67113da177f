//! Subject repository trait: the narrow interface onto the identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::subject::Subject;
use crate::errors::StorageError;

/// The slice of the identity store this subsystem needs: email lookup and
/// the confirmation timestamp. Passwords, sessions and the rest of the user
/// record stay on the other side of this boundary.
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Find a subject by normalized email address
    async fn find_by_email(&self, email: &str) -> Result<Option<Subject>, StorageError>;

    /// Find a subject by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>, StorageError>;

    /// Set `confirmed_at` if it is still unset.
    ///
    /// Conditional update: returns `true` when this call performed the
    /// confirmation, `false` when the subject was already confirmed (or does
    /// not exist). Callers rely on the report to guarantee the identity
    /// store is mutated at most once per subject.
    async fn mark_confirmed(
        &self,
        subject_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;
}
