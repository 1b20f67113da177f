//! Adapter bridging the infrastructure mail services to the core
//! `MailSenderTrait` seam.

use async_trait::async_trait;

use mp_core::errors::MailError;
use mp_core::services::verification::MailSenderTrait;
use mp_shared::config::MailConfig;

use crate::InfraError;

use super::mail_service::MailService;
use super::create_mail_service;

/// Adapter exposing any [`MailService`] implementation to the core
pub struct MailSenderAdapter {
    inner: Box<dyn MailService>,
    verification_url_base: String,
}

impl MailSenderAdapter {
    /// Wrap an existing mail service
    pub fn new(inner: Box<dyn MailService>, verification_url_base: impl Into<String>) -> Self {
        Self {
            inner,
            verification_url_base: verification_url_base.into(),
        }
    }

    /// Build the provider selected by the configuration and wrap it
    pub fn from_config(config: &MailConfig) -> Self {
        Self::new(
            create_mail_service(config),
            config.verification_url_base.clone(),
        )
    }

    fn verification_url(&self, secret_token: &str) -> String {
        format!(
            "{}/{}",
            self.verification_url_base.trim_end_matches('/'),
            secret_token
        )
    }
}

#[async_trait]
impl MailSenderTrait for MailSenderAdapter {
    async fn send_verification_mail(
        &self,
        to: &str,
        secret_token: &str,
    ) -> Result<String, MailError> {
        let url = self.verification_url(secret_token);
        self.inner
            .send_verification_mail(to, &url)
            .await
            .map_err(|e| match e {
                InfraError::Http(http) if http.is_timeout() => MailError::Timeout,
                InfraError::Mail(message) => MailError::Rejected { message },
                other => MailError::Delivery {
                    message: other.to_string(),
                },
            })
    }
}
