//! Domain-specific error types and error handling.

mod types;

// Re-export all error types
pub use types::{CompleteError, ConsumeError, MailError, ResendError, StorageError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    // Bridges to specific error types
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

pub type DomainResult<T> = Result<T, DomainError>;
