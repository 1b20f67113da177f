//! Mail Service Module
//!
//! Outbound mail implementations for delivering verification links:
//!
//! - **Mail Service Trait**: common interface for all providers
//! - **Mock Implementation**: tracing output for development and tests
//! - **Brevo Support**: production delivery via the Brevo HTTP API
//! - **Core adapter**: bridges the infra trait to `mp_core::MailSenderTrait`
//! - **Security**: recipient addresses are masked in logs, secrets never
//!   appear in them

pub mod adapter;
pub mod brevo;
pub mod mail_service;
pub mod mock_mail;

pub use adapter::MailSenderAdapter;
pub use brevo::BrevoMailService;
pub use mail_service::MailService;
pub use mock_mail::MockMailService;

#[cfg(test)]
mod tests;

use tracing::{error, info};

use mp_shared::config::MailConfig;

/// Create a mail service based on configuration.
///
/// Unknown providers and a misconfigured Brevo client fall back to the mock
/// implementation so development environments start without credentials.
pub fn create_mail_service(config: &MailConfig) -> Box<dyn MailService> {
    match config.provider.as_str() {
        "brevo" => match BrevoMailService::new(config.clone()) {
            Ok(service) => {
                info!("Brevo mail service initialized");
                Box::new(service)
            }
            Err(e) => {
                error!("Failed to initialize Brevo mail service: {}", e);
                tracing::warn!("Falling back to mock mail service");
                Box::new(MockMailService::new())
            }
        },
        _ => Box::new(MockMailService::new()),
    }
}
