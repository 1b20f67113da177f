//! Database connection pool management and MySQL repository
//! implementations.
//!
//! Expected schema (managed by the deployment's migration tooling):
//!
//! ```sql
//! CREATE TABLE subjects (
//!     id            CHAR(36)     PRIMARY KEY,
//!     email         VARCHAR(254) NOT NULL UNIQUE,
//!     confirmed_at  DATETIME(3)  NULL,
//!     created_at    DATETIME(3)  NOT NULL
//! );
//!
//! CREATE TABLE verification_tokens (
//!     id             CHAR(36)    PRIMARY KEY,
//!     subject_id     CHAR(36)    NOT NULL,
//!     token_hash     CHAR(64)    NOT NULL UNIQUE,
//!     token_type     VARCHAR(32) NOT NULL,
//!     issued_at      DATETIME(3) NOT NULL,
//!     expires_at     DATETIME(3) NOT NULL,
//!     used_at        DATETIME(3) NULL,
//!     invalidated_at DATETIME(3) NULL,
//!     issued_from_ip VARCHAR(45) NULL,
//!     attempt_count  INT         NOT NULL DEFAULT 0,
//!     max_attempts   INT         NOT NULL,
//!     metadata       TEXT        NULL,
//!     INDEX idx_tokens_subject (subject_id, token_type, issued_at)
//! );
//!
//! CREATE TABLE resend_attempts (
//!     id           CHAR(36)    PRIMARY KEY,
//!     subject_id   CHAR(36)    NOT NULL,
//!     attempted_at DATETIME(3) NOT NULL,
//!     INDEX idx_attempts_subject (subject_id, attempted_at)
//! );
//!
//! CREATE TABLE audit_log (
//!     id            CHAR(36)     PRIMARY KEY,
//!     subject_id    CHAR(36)     NULL,
//!     action        VARCHAR(40)  NOT NULL,
//!     source_ip     VARCHAR(45)  NULL,
//!     user_agent    VARCHAR(512) NULL,
//!     token_id      CHAR(36)     NULL,
//!     details       TEXT         NULL,
//!     success       BOOLEAN      NOT NULL,
//!     error_message VARCHAR(512) NULL,
//!     created_at    DATETIME(3)  NOT NULL,
//!     INDEX idx_audit_subject (subject_id, created_at),
//!     INDEX idx_audit_action (action, success, created_at)
//! );
//! ```

pub mod mysql;

use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::time::Duration;
use tracing::info;

use mp_core::errors::StorageError;
use mp_shared::config::DatabaseConfig;

use crate::InfraError;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    /// Create a new connection pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self, InfraError> {
        info!(
            max_connections = config.max_connections,
            "Creating database connection pool"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .test_before_acquire(true)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Access the underlying SQLx pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Check connectivity with a trivial query
    pub async fn health_check(&self) -> Result<(), InfraError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close all connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Map a SQLx error into the domain's storage error kind, keeping the
/// operation context
pub(crate) fn storage_err(context: &str, e: sqlx::Error) -> StorageError {
    StorageError::new(format!("{}: {}", context, e))
}
