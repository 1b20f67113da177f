//! Orchestrator tests: issuance, completion, and the anti-enumeration
//! properties of `complete`.

use std::sync::Arc;
use uuid::Uuid;

use mp_shared::config::VerificationConfig;

use crate::domain::entities::audit::AuditAction;
use crate::domain::entities::subject::Subject;
use crate::domain::entities::verification_token::TokenType;
use crate::errors::CompleteError;
use crate::repositories::SubjectRepository;
use crate::services::token::{is_valid_token_format, TokenGenerator};
use crate::services::verification::RequestContext;

use super::mocks::{harness, harness_with};

fn ctx() -> RequestContext {
    RequestContext::new(
        Some("203.0.113.7".to_string()),
        Some("integration-test/1.0".to_string()),
    )
}

#[tokio::test]
async fn test_issue_initial_returns_secret_and_stores_only_the_hash() {
    let h = harness();
    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;

    let outcome = h
        .service
        .issue_initial(subject.id, &subject.email, &ctx())
        .await
        .unwrap();

    assert!(is_valid_token_format(&outcome.secret_token));

    let stored = h.tokens.get(outcome.token_id).await.unwrap();
    assert_eq!(stored.token_hash, TokenGenerator::hash(&outcome.secret_token));
    assert_ne!(stored.token_hash, outcome.secret_token);
    assert_eq!(stored.subject_id, subject.id);
    assert_eq!(stored.issued_from_ip.as_deref(), Some("203.0.113.7"));

    let created = h.audit.entries_for(AuditAction::TokenCreated).await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].token_id, Some(outcome.token_id));
}

#[tokio::test]
async fn test_issue_initial_rejects_invalid_email() {
    let h = harness();
    let result = h
        .service
        .issue_initial(Uuid::new_v4(), "not-an-email", &ctx())
        .await;
    assert!(result.is_err());
    assert!(h.audit.all().await.is_empty());
}

#[tokio::test]
async fn test_complete_confirms_subject() {
    let h = harness();
    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;
    let outcome = h
        .service
        .issue_initial(subject.id, &subject.email, &ctx())
        .await
        .unwrap();

    let verified = h
        .service
        .complete(&outcome.secret_token, &ctx())
        .await
        .unwrap();
    assert_eq!(verified, subject.id);

    let stored_subject = h.subjects.find_by_id(subject.id).await.unwrap().unwrap();
    assert!(stored_subject.is_confirmed());

    let stored_token = h.tokens.get(outcome.token_id).await.unwrap();
    assert!(stored_token.is_used());

    let successes = h.audit.entries_for(AuditAction::VerificationSuccess).await;
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].subject_id, Some(subject.id));
}

#[tokio::test]
async fn test_complete_malformed_input_never_reaches_the_store() {
    let h = harness();
    // a storage failure would surface as CompleteError::Storage, so a
    // generic InvalidToken here proves the store was never consulted
    h.tokens.set_fail_storage(true).await;

    let err = h.service.complete("short", &ctx()).await.unwrap_err();
    assert_eq!(err, CompleteError::InvalidToken);

    let attempts = h.audit.entries_for(AuditAction::VerificationAttempt).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].error_message.as_deref(), Some("invalid_format"));
}

#[tokio::test]
async fn test_complete_unknown_token_is_indistinguishable_from_expired() {
    let h = harness();
    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;

    // unknown secret
    let unknown = TokenGenerator::default().generate();
    let err_unknown = h.service.complete(&unknown, &ctx()).await.unwrap_err();

    // expired secret
    let h_expired = harness_with(VerificationConfig {
        token_ttl_minutes: 0,
        complete_floor_ms: 0,
        ..VerificationConfig::default()
    });
    h_expired.subjects.insert(subject.clone()).await;
    let outcome = h_expired
        .service
        .issue_initial(subject.id, &subject.email, &ctx())
        .await
        .unwrap();
    let err_expired = h_expired
        .service
        .complete(&outcome.secret_token, &ctx())
        .await
        .unwrap_err();

    // same outward error for both; the difference lives only in the trail
    assert_eq!(err_unknown, CompleteError::InvalidToken);
    assert_eq!(err_expired, err_unknown);

    let failures = h_expired.audit.entries_for(AuditAction::VerificationFailure).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].details["reason"], "expired");
}

#[tokio::test]
async fn test_complete_twice_mutates_identity_store_exactly_once() {
    let h = harness();
    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;
    let outcome = h
        .service
        .issue_initial(subject.id, &subject.email, &ctx())
        .await
        .unwrap();

    assert!(h.service.complete(&outcome.secret_token, &ctx()).await.is_ok());

    // retry after a client-side timeout: same secret, generic refusal
    let err = h
        .service
        .complete(&outcome.secret_token, &ctx())
        .await
        .unwrap_err();
    assert_eq!(err, CompleteError::InvalidToken);
    assert_eq!(h.subjects.applied_confirmations().await, 1);

    let failures = h.audit.entries_for(AuditAction::VerificationFailure).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].details["reason"], "already_used");
}

#[tokio::test]
async fn test_concurrent_complete_admits_exactly_one() {
    let h = harness();
    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;
    let outcome = h
        .service
        .issue_initial(subject.id, &subject.email, &ctx())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&h.service);
        let secret = outcome.secret_token.clone();
        handles.push(tokio::spawn(async move {
            service.complete(&secret, &RequestContext::default()).await
        }));
    }

    let mut successes = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(id) => {
                assert_eq!(id, subject.id);
                successes += 1;
            }
            Err(CompleteError::InvalidToken) => refused += 1,
            Err(other) => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(refused, 7);
    assert_eq!(h.subjects.applied_confirmations().await, 1);
}

#[tokio::test]
async fn test_complete_pads_to_the_latency_floor() {
    let h = harness_with(VerificationConfig {
        complete_floor_ms: 50,
        ..VerificationConfig::default()
    });

    let started = std::time::Instant::now();
    let _ = h.service.complete("malformed", &ctx()).await;
    assert!(started.elapsed() >= std::time::Duration::from_millis(50));
}

#[tokio::test]
async fn test_audit_outage_never_breaks_verification() {
    let h = harness();
    h.audit.set_fail_writes(true).await;

    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;

    let outcome = h
        .service
        .issue_initial(subject.id, &subject.email, &ctx())
        .await
        .unwrap();
    let verified = h
        .service
        .complete(&outcome.secret_token, &ctx())
        .await
        .unwrap();
    assert_eq!(verified, subject.id);
}

#[tokio::test]
async fn test_single_active_token_invariant_across_issue_sequence() {
    let h = harness();
    let subject = Subject::new("user@example.com");
    h.subjects.insert(subject.clone()).await;

    for _ in 0..4 {
        h.service
            .issue_initial(subject.id, &subject.email, &ctx())
            .await
            .unwrap();
    }

    let all = h
        .tokens
        .all_for_subject(subject.id, TokenType::EmailVerification)
        .await;
    assert_eq!(all.len(), 4);
    let active: Vec<_> = all.iter().filter(|t| t.is_valid()).collect();
    assert_eq!(active.len(), 1);
}
