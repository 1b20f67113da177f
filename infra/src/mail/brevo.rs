//! Brevo Mail Service Implementation
//!
//! Sends transactional mail through the Brevo (`/v3/smtp/email`) HTTP API.
//!
//! ## Features
//!
//! - Automatic retry with exponential backoff for transport failures
//! - Request timeouts
//! - Recipient masking in logs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use mp_shared::config::MailConfig;
use mp_shared::utils::email::mask_email;

use crate::InfraError;

use super::mail_service::MailService;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendRequest {
    sender: BrevoAddress,
    to: Vec<BrevoAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendResponse {
    message_id: String,
}

/// Brevo mail service implementation
pub struct BrevoMailService {
    client: reqwest::Client,
    config: MailConfig,
}

impl BrevoMailService {
    /// Create a new Brevo mail service
    pub fn new(config: MailConfig) -> Result<Self, InfraError> {
        if config.api_key.is_empty() {
            return Err(InfraError::Config("Brevo API key not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            from = %mask_email(&config.from_address),
            "Brevo mail service initialized"
        );

        Ok(Self { client, config })
    }

    async fn send_once(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<String, InfraError> {
        let request = BrevoSendRequest {
            sender: BrevoAddress {
                email: self.config.from_address.clone(),
                name: Some(self.config.from_name.clone()),
            },
            to: vec![BrevoAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: html_body.to_string(),
            text_content: text_body.to_string(),
        };

        let url = format!(
            "{}/v3/smtp/email",
            self.config.api_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .header("accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let parsed: BrevoSendResponse = response.json().await?;
            debug!(
                to = %mask_email(to),
                message_id = %parsed.message_id,
                "Brevo accepted message"
            );
            Ok(parsed.message_id)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(InfraError::Mail(format!(
                "Brevo rejected the message (status {}): {}",
                status, body
            )))
        }
    }

    /// Transport failures are worth retrying; a provider rejection is not
    fn is_retryable(error: &InfraError) -> bool {
        matches!(error, InfraError::Http(_))
    }
}

#[async_trait]
impl MailService for BrevoMailService {
    async fn send_mail(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<String, InfraError> {
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.send_once(to, subject, html_body, text_body).await {
                Ok(message_id) => return Ok(message_id),
                Err(e) if Self::is_retryable(&e) && attempt < self.config.max_retries => {
                    warn!(
                        to = %mask_email(to),
                        attempt = attempt + 1,
                        error = %e,
                        "Mail delivery attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    last_error = Some(e);
                }
                Err(e) => {
                    error!(
                        to = %mask_email(to),
                        error = %e,
                        "Mail delivery failed"
                    );
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| InfraError::Mail("mail delivery failed".to_string())))
    }

    fn provider_name(&self) -> &str {
        "Brevo"
    }
}
