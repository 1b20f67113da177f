//! # Mailproof Infrastructure
//!
//! Infrastructure layer for the Mailproof backend: MySQL implementations of
//! the core repository traits and outbound mail service implementations
//! (mock and Brevo HTTP API), plus configuration loading.

pub mod config;
pub mod database;
pub mod mail;

use thiserror::Error;

pub use config::load_config;
pub use database::DatabasePool;

/// Infrastructure-level errors
#[derive(Error, Debug)]
pub enum InfraError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mail service error
    #[error("Mail service error: {0}")]
    Mail(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}
