//! Tests for the core-facing mail adapter.

use mp_core::errors::MailError;
use mp_core::services::verification::MailSenderTrait;
use mp_shared::config::MailConfig;

use crate::mail::adapter::MailSenderAdapter;
use crate::mail::mock_mail::MockMailService;

#[tokio::test]
async fn test_adapter_delivers_through_the_inner_service() {
    let mock = MockMailService::new();
    let counter = mock.clone();
    let adapter = MailSenderAdapter::new(Box::new(mock), "https://app.test/verify/");

    let message_id = adapter
        .send_verification_mail("user@example.com", "secret-token-value")
        .await
        .unwrap();
    assert!(message_id.starts_with("mock-"));
    assert_eq!(counter.message_count(), 1);
}

#[tokio::test]
async fn test_adapter_maps_rejections_to_mail_error() {
    let adapter = MailSenderAdapter::new(
        Box::new(MockMailService::failing()),
        "https://app.test/verify",
    );

    let err = adapter
        .send_verification_mail("user@example.com", "secret-token-value")
        .await
        .unwrap_err();
    assert!(matches!(err, MailError::Rejected { .. }));
}

#[tokio::test]
async fn test_from_config_defaults_to_the_mock_provider() {
    let adapter = MailSenderAdapter::from_config(&MailConfig::mock());
    assert!(adapter
        .send_verification_mail("user@example.com", "secret-token-value")
        .await
        .is_ok());
}
