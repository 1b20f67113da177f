//! Mock Mail Service Implementation
//!
//! Logs messages through tracing instead of delivering them. Used in
//! development and as the fallback when no provider is configured.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use mp_shared::utils::email::mask_email;

use crate::InfraError;

use super::mail_service::MailService;

/// Mock mail service for development and testing
#[derive(Clone)]
pub struct MockMailService {
    /// Counter for messages "sent"
    message_count: Arc<AtomicU64>,
    /// Whether to simulate failures (for testing)
    simulate_failure: bool,
}

impl MockMailService {
    /// Create a new mock mail service
    pub fn new() -> Self {
        Self {
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: false,
        }
    }

    /// Create a mock service that fails every send
    pub fn failing() -> Self {
        Self {
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: true,
        }
    }

    /// Total number of messages accepted
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Reset the message counter
    pub fn reset_counter(&self) {
        self.message_count.store(0, Ordering::SeqCst);
    }
}

impl Default for MockMailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailService for MockMailService {
    async fn send_mail(
        &self,
        to: &str,
        subject: &str,
        _html_body: &str,
        text_body: &str,
    ) -> Result<String, InfraError> {
        if self.simulate_failure {
            return Err(InfraError::Mail(
                "simulated mail delivery failure".to_string(),
            ));
        }

        self.message_count.fetch_add(1, Ordering::SeqCst);
        let message_id = format!("mock-{}", Uuid::new_v4());

        info!(
            to = %mask_email(to),
            subject = subject,
            body_length = text_body.len(),
            message_id = %message_id,
            event = "mock_mail_sent",
            "Mock mail service accepted message"
        );

        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }
}
