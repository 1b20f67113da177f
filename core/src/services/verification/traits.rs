//! Trait for outbound mail integration.

use async_trait::async_trait;

use crate::errors::MailError;

/// Seam to the outbound mail sender.
///
/// Implementations render the verification message (subject, HTML and text
/// bodies carrying the secret link) and attempt delivery; the core never
/// renders templates. The secret passes through here exactly once and must
/// not be logged by implementations.
#[async_trait]
pub trait MailSenderTrait: Send + Sync {
    /// Deliver the verification email for the given secret token.
    ///
    /// # Returns
    /// * `Ok(message_id)` - provider identifier of the accepted message
    /// * `Err(MailError)` - delivery failed or was rejected
    async fn send_verification_mail(&self, to: &str, secret_token: &str)
        -> Result<String, MailError>;
}
