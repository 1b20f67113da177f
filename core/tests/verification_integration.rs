//! End-to-end exercise of the verification lifecycle through the public
//! crate API: register, deliver, complete, and the failure paths around
//! them.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use mp_core::domain::entities::subject::Subject;
use mp_core::errors::{CompleteError, MailError, ResendError};
use mp_core::repositories::{
    MockAuditLogRepository, MockRateLimitRepository, MockSubjectRepository, MockTokenRepository,
    SubjectRepository,
};
use mp_core::services::audit::AuditServiceConfig;
use mp_core::services::verification::{MailSenderTrait, RequestContext, VerificationService};
use mp_shared::config::{RateLimitConfig, VerificationConfig};

// Mail sender that hands captured secrets back to the test
struct CapturingMailSender {
    outbox: Arc<RwLock<Vec<String>>>,
}

impl CapturingMailSender {
    fn new() -> Self {
        Self {
            outbox: Arc::new(RwLock::new(Vec::new())),
        }
    }

    async fn last_secret(&self) -> Option<String> {
        self.outbox.read().await.last().cloned()
    }
}

#[async_trait]
impl MailSenderTrait for CapturingMailSender {
    async fn send_verification_mail(
        &self,
        _to: &str,
        secret_token: &str,
    ) -> Result<String, MailError> {
        let mut outbox = self.outbox.write().await;
        outbox.push(secret_token.to_string());
        Ok(format!("msg-{}", outbox.len()))
    }
}

fn build_service(
    subjects: Arc<MockSubjectRepository>,
    mail: Arc<CapturingMailSender>,
) -> VerificationService<
    MockTokenRepository,
    MockSubjectRepository,
    MockAuditLogRepository,
    MockRateLimitRepository,
    CapturingMailSender,
> {
    VerificationService::new(
        Arc::new(MockTokenRepository::new()),
        subjects,
        Arc::new(MockAuditLogRepository::new()),
        Arc::new(MockRateLimitRepository::new()),
        mail,
        VerificationConfig {
            complete_floor_ms: 0,
            ..VerificationConfig::default()
        },
        RateLimitConfig::default(),
        AuditServiceConfig { async_writes: false },
    )
}

#[tokio::test]
async fn test_register_resend_and_complete() {
    let subjects = Arc::new(MockSubjectRepository::new());
    let mail = Arc::new(CapturingMailSender::new());
    let service = build_service(Arc::clone(&subjects), Arc::clone(&mail));

    let subject = Subject::new("newcomer@example.com");
    subjects.insert(subject.clone()).await;
    let ctx = RequestContext::new(Some("198.51.100.4".to_string()), None);

    // registration issues the first token
    let initial = service
        .issue_initial(subject.id, &subject.email, &ctx)
        .await
        .unwrap();

    // the user never got the mail and asks again; the old link dies
    service.resend(&subject.email, &ctx).await.unwrap();
    let replacement = mail.last_secret().await.unwrap();
    assert_ne!(replacement, initial.secret_token);

    assert_eq!(
        service.complete(&initial.secret_token, &ctx).await.unwrap_err(),
        CompleteError::InvalidToken
    );

    // the replacement verifies and confirms the subject exactly once
    let verified = service.complete(&replacement, &ctx).await.unwrap();
    assert_eq!(verified, subject.id);
    assert!(subjects
        .find_by_id(subject.id)
        .await
        .unwrap()
        .unwrap()
        .is_confirmed());

    // a verified subject cannot request further mails
    assert_eq!(
        service.resend(&subject.email, &ctx).await.unwrap_err(),
        ResendError::AlreadyVerified
    );
}

#[tokio::test]
async fn test_resend_budget_is_exhausted_by_the_fourth_request() {
    let subjects = Arc::new(MockSubjectRepository::new());
    let mail = Arc::new(CapturingMailSender::new());
    let service = build_service(Arc::clone(&subjects), mail);

    let subject = Subject::new("eager@example.com");
    subjects.insert(subject.clone()).await;
    let ctx = RequestContext::default();

    for _ in 0..3 {
        service.resend(&subject.email, &ctx).await.unwrap();
    }
    assert!(matches!(
        service.resend(&subject.email, &ctx).await.unwrap_err(),
        ResendError::RateLimited { .. }
    ));
}
