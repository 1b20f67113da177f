//! Mail Service Interface
//!
//! Defines the trait for outbound mail implementations and renders the
//! verification message. Templates live here so the core never touches
//! HTML.

use async_trait::async_trait;

use crate::InfraError;

/// Mail service trait for sending messages
///
/// Implementations include:
/// - Brevo HTTP API
/// - Mock implementation for development
#[async_trait]
pub trait MailService: Send + Sync {
    /// Send a rendered message to a recipient
    ///
    /// # Returns
    /// * `Ok(message_id)` - provider identifier for the accepted message
    /// * `Err(InfraError)` - if sending fails
    async fn send_mail(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<String, InfraError>;

    /// Render and send the verification message for the given link
    async fn send_verification_mail(
        &self,
        to: &str,
        verification_url: &str,
    ) -> Result<String, InfraError> {
        let subject = "Confirm your email address";
        let html_body = format!(
            "<p>Welcome! Please confirm your email address by clicking the \
             link below.</p>\
             <p><a href=\"{url}\">Confirm my email</a></p>\
             <p>The link is valid for 24 hours and can be used once. If you \
             did not create an account, you can ignore this message.</p>",
            url = verification_url
        );
        let text_body = format!(
            "Welcome! Please confirm your email address by opening this link:\n\
             \n{url}\n\n\
             The link is valid for 24 hours and can be used once. If you did \
             not create an account, you can ignore this message.\n",
            url = verification_url
        );
        self.send_mail(to, subject, &html_body, &text_body).await
    }

    /// Get the service provider name
    fn provider_name(&self) -> &str;

    /// Check if the service is available
    ///
    /// Default implementation always returns true.
    async fn is_available(&self) -> bool {
        true
    }
}
