//! In-memory implementation of TokenRepository for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::verification_token::{TokenType, VerificationToken};
use crate::errors::{ConsumeError, StorageError};

use super::r#trait::TokenRepository;

/// In-memory token repository keyed by token hash.
///
/// All state transitions run under a single write lock, which stands in for
/// the database's conditional updates: concurrent `consume` calls serialize
/// and only the first one finds the token untouched.
pub struct MockTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, VerificationToken>>>,
    fail_storage: Arc<RwLock<bool>>,
}

impl MockTokenRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            fail_storage: Arc::new(RwLock::new(false)),
        }
    }

    /// Make every subsequent call fail with a storage error
    pub async fn set_fail_storage(&self, fail: bool) {
        *self.fail_storage.write().await = fail;
    }

    /// Fetch a token by row id (test inspection)
    pub async fn get(&self, id: Uuid) -> Option<VerificationToken> {
        self.tokens.read().await.get(&id).cloned()
    }

    /// All stored tokens for a subject and type (test inspection)
    pub async fn all_for_subject(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
    ) -> Vec<VerificationToken> {
        self.tokens
            .read()
            .await
            .values()
            .filter(|t| t.subject_id == subject_id && t.token_type == token_type)
            .cloned()
            .collect()
    }

    async fn check_storage(&self) -> Result<(), StorageError> {
        if *self.fail_storage.read().await {
            Err(StorageError::new("simulated storage failure"))
        } else {
            Ok(())
        }
    }
}

impl Default for MockTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn issue(&self, token: VerificationToken) -> Result<VerificationToken, StorageError> {
        self.check_storage().await?;
        let mut tokens = self.tokens.write().await;

        // supersede the previous active token inside the same critical
        // section, mirroring the transactional invalidate-then-insert
        let now = token.issued_at;
        for existing in tokens.values_mut() {
            if existing.subject_id == token.subject_id
                && existing.token_type == token.token_type
                && !existing.is_used()
                && !existing.is_invalidated()
            {
                existing.invalidate_at(now);
            }
        }

        tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationToken, ConsumeError> {
        self.check_storage().await?;
        let mut tokens = self.tokens.write().await;

        let token = tokens
            .values_mut()
            .find(|t| t.token_hash == token_hash)
            .ok_or(ConsumeError::NotFound)?;

        if token.is_expired_at(now) {
            token.register_failed_attempt(now);
            return Err(ConsumeError::Expired);
        }
        if token.is_used() {
            token.register_failed_attempt(now);
            return Err(ConsumeError::AlreadyUsed);
        }
        if token.is_invalidated() {
            token.register_failed_attempt(now);
            return Err(ConsumeError::Invalidated);
        }

        // the conditional-update equivalent: under the write lock, a token
        // that reached a terminal state since the checks reports AlreadyUsed
        if !token.mark_used_at(now) {
            return Err(ConsumeError::AlreadyUsed);
        }

        Ok(token.clone())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, StorageError> {
        self.check_storage().await?;
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn find_active(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationToken>, StorageError> {
        self.check_storage().await?;
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .find(|t| {
                t.subject_id == subject_id && t.token_type == token_type && t.is_valid_at(now)
            })
            .cloned())
    }

    async fn count_issued_since(
        &self,
        subject_id: Uuid,
        token_type: TokenType,
        window_start: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        self.check_storage().await?;
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| {
                t.subject_id == subject_id
                    && t.token_type == token_type
                    && t.issued_at > window_start
            })
            .count() as u32)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        self.check_storage().await?;
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired_at(now));
        Ok(before - tokens.len())
    }
}
