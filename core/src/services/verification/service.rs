//! Verification orchestrator implementation.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{info, warn};
use uuid::Uuid;

use mp_shared::config::{RateLimitConfig, VerificationConfig};
use mp_shared::utils::email::{is_valid_email, mask_email, normalize_email};

use crate::domain::entities::audit::{AuditAction, AuditEntry};
use crate::domain::entities::verification_token::{TokenType, VerificationToken};
use crate::errors::{CompleteError, ConsumeError, DomainError, DomainResult, ResendError};
use crate::repositories::{
    AuditLogRepository, RateLimitRepository, SubjectRepository, TokenRepository,
};
use crate::services::audit::{AuditService, AuditServiceConfig};
use crate::services::rate_limit::{RateLimitDecision, ResendRateLimiter};
use crate::services::token::{is_valid_token_format, TokenGenerator};

use super::traits::MailSenderTrait;
use super::types::{IssueOutcome, RequestContext, ResendOutcome};

/// Orchestrator for the verification token lifecycle.
///
/// All cross-request coordination is delegated to the repositories'
/// conditional updates; the orchestrator holds no mutable state of its own
/// and is safe to share across request handlers and replicas.
pub struct VerificationService<T, S, A, L, M>
where
    T: TokenRepository,
    S: SubjectRepository,
    A: AuditLogRepository,
    L: RateLimitRepository,
    M: MailSenderTrait,
{
    tokens: Arc<T>,
    subjects: Arc<S>,
    mail: Arc<M>,
    audit: AuditService<A>,
    limiter: ResendRateLimiter<L>,
    generator: TokenGenerator,
    config: VerificationConfig,
    rate_limit_config: RateLimitConfig,
}

impl<T, S, A, L, M> VerificationService<T, S, A, L, M>
where
    T: TokenRepository,
    S: SubjectRepository,
    A: AuditLogRepository + 'static,
    L: RateLimitRepository,
    M: MailSenderTrait,
{
    /// Create a new verification service
    pub fn new(
        tokens: Arc<T>,
        subjects: Arc<S>,
        audit_repository: Arc<A>,
        rate_limit_repository: Arc<L>,
        mail: Arc<M>,
        config: VerificationConfig,
        rate_limit_config: RateLimitConfig,
        audit_config: AuditServiceConfig,
    ) -> Self {
        let generator = TokenGenerator::new(config.token_byte_length);
        let audit = AuditService::new(audit_repository, audit_config);
        let limiter = ResendRateLimiter::new(rate_limit_repository, rate_limit_config.clone());

        Self {
            tokens,
            subjects,
            mail,
            audit,
            limiter,
            generator,
            config,
            rate_limit_config,
        }
    }

    /// Issue the first verification token for a freshly registered subject.
    ///
    /// Returns the raw secret; this is the only moment it exists outside the
    /// caller's hands. Mail delivery for the initial token is driven by the
    /// registration flow, not by this call.
    pub async fn issue_initial(
        &self,
        subject_id: Uuid,
        email: &str,
        ctx: &RequestContext,
    ) -> DomainResult<IssueOutcome> {
        if !is_valid_email(email) {
            return Err(DomainError::Validation {
                message: "invalid email address".to_string(),
            });
        }

        let outcome = self
            .issue_token(subject_id, json!({ "origin": "registration" }), ctx)
            .await?;

        info!(
            subject_id = %subject_id,
            token_id = %outcome.token_id,
            recipient = %mask_email(email),
            event = "token_issued",
            "Issued initial verification token"
        );

        Ok(outcome)
    }

    /// Re-send the verification email, superseding the previous token.
    ///
    /// Admission is decided by the sliding-window rate limiter before the
    /// token store is touched. When mail delivery fails the replacement
    /// token stays valid but the admission is refunded, so a provider
    /// outage never burns the subject's budget.
    pub async fn resend(
        &self,
        email: &str,
        ctx: &RequestContext,
    ) -> Result<ResendOutcome, ResendError> {
        let now = Utc::now();

        if !is_valid_email(email) {
            return Err(ResendError::InvalidEmail);
        }
        let normalized = normalize_email(email);

        let subject = match self.subjects.find_by_email(&normalized).await? {
            Some(subject) => subject,
            None => {
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::ResendRequested)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                            .with_error("user_not_found"),
                    )
                    .await;
                return Err(ResendError::UserNotFound);
            }
        };

        if subject.is_confirmed() {
            self.audit
                .record(
                    AuditEntry::new(AuditAction::ResendRequested)
                        .with_subject(subject.id)
                        .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                        .with_error("already_verified"),
                )
                .await;
            return Err(ResendError::AlreadyVerified);
        }

        let decision = self.limiter.check_and_reserve(subject.id, now).await?;
        let (remaining, reservation) = match decision {
            RateLimitDecision::Denied { retry_after_seconds } => {
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::ResendBlocked)
                            .with_subject(subject.id)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                            .with_detail("retry_after_seconds", json!(retry_after_seconds)),
                    )
                    .await;
                return Err(ResendError::RateLimited { retry_after_seconds });
            }
            RateLimitDecision::Allowed {
                remaining,
                reservation,
            } => (remaining, reservation),
        };

        // issuance history feeds the metadata only; admission was decided
        // above by the attempt ledger
        let window_start = now - Duration::minutes(self.rate_limit_config.window_minutes);
        let iteration = match self
            .tokens
            .count_issued_since(subject.id, TokenType::EmailVerification, window_start)
            .await
        {
            Ok(count) => count + 1,
            Err(e) => {
                warn!(
                    subject_id = %subject.id,
                    error = %e,
                    "Failed to count issued tokens for resend metadata"
                );
                1
            }
        };

        let outcome = match self
            .issue_token(
                subject.id,
                json!({ "origin": "resend", "resend_iteration": iteration }),
                ctx,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // nothing went out; refund the admission
                if let Some(reservation) = reservation {
                    self.limiter.release(reservation).await;
                }
                return Err(match e {
                    DomainError::Storage(storage) => ResendError::Storage(storage),
                    other => ResendError::Storage(crate::errors::StorageError::new(
                        other.to_string(),
                    )),
                });
            }
        };

        match self
            .mail
            .send_verification_mail(&subject.email, &outcome.secret_token)
            .await
        {
            Ok(message_id) => {
                info!(
                    subject_id = %subject.id,
                    token_id = %outcome.token_id,
                    recipient = %mask_email(&subject.email),
                    remaining = remaining,
                    event = "resend_delivered",
                    "Resent verification email"
                );
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::ResendRequested)
                            .with_subject(subject.id)
                            .with_token(outcome.token_id)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                            .with_detail("remaining_attempts", json!(remaining))
                            .with_detail("resend_iteration", json!(iteration)),
                    )
                    .await;

                Ok(ResendOutcome {
                    remaining_attempts: remaining,
                    message_id,
                    token_id: outcome.token_id,
                    expires_at: outcome.expires_at,
                })
            }
            Err(mail_error) => {
                // the token stays valid; only the budget charge is undone
                if let Some(reservation) = reservation {
                    self.limiter.release(reservation).await;
                }
                warn!(
                    subject_id = %subject.id,
                    token_id = %outcome.token_id,
                    recipient = %mask_email(&subject.email),
                    error = %mail_error,
                    event = "resend_delivery_failed",
                    "Verification email delivery failed"
                );
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::MailDeliveryFailed)
                            .with_subject(subject.id)
                            .with_token(outcome.token_id)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                            .with_error(mail_error.to_string()),
                    )
                    .await;
                Err(ResendError::MailDeliveryFailed(mail_error))
            }
        }
    }

    /// Consume a presented secret and confirm the subject.
    ///
    /// Exactly two outward outcomes exist: the subject id on success, or the
    /// generic [`CompleteError::InvalidToken`] for every validation failure.
    /// Each call is padded to a fixed response-time floor so the branch
    /// taken is not observable through latency either.
    pub async fn complete(
        &self,
        secret_token: &str,
        ctx: &RequestContext,
    ) -> Result<Uuid, CompleteError> {
        let started = tokio::time::Instant::now();
        let result = self.complete_inner(secret_token, ctx).await;

        let floor = StdDuration::from_millis(self.config.complete_floor_ms);
        let elapsed = started.elapsed();
        if elapsed < floor {
            tokio::time::sleep(floor - elapsed).await;
        }

        result
    }

    async fn complete_inner(
        &self,
        secret_token: &str,
        ctx: &RequestContext,
    ) -> Result<Uuid, CompleteError> {
        let now = Utc::now();

        // malformed input is rejected before any store lookup
        if !is_valid_token_format(secret_token) {
            self.audit
                .record(
                    AuditEntry::new(AuditAction::VerificationAttempt)
                        .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                        .with_error("invalid_format"),
                )
                .await;
            return Err(CompleteError::InvalidToken);
        }

        let token_hash = TokenGenerator::hash(secret_token);
        match self.tokens.consume(&token_hash, now).await {
            Ok(token) => {
                if let Err(e) = self.subjects.mark_confirmed(token.subject_id, now).await {
                    self.audit
                        .record(
                            AuditEntry::new(AuditAction::VerificationFailure)
                                .with_subject(token.subject_id)
                                .with_token(token.id)
                                .with_request_context(
                                    ctx.source_ip.clone(),
                                    ctx.user_agent.clone(),
                                )
                                .with_error("storage_error"),
                        )
                        .await;
                    return Err(CompleteError::Storage(e));
                }

                info!(
                    subject_id = %token.subject_id,
                    token_id = %token.id,
                    event = "verification_completed",
                    "Email address verified"
                );
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::VerificationSuccess)
                            .with_subject(token.subject_id)
                            .with_token(token.id)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone()),
                    )
                    .await;

                Ok(token.subject_id)
            }
            Err(ConsumeError::Storage(e)) => {
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::VerificationFailure)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                            .with_error("storage_error"),
                    )
                    .await;
                Err(CompleteError::Storage(e))
            }
            Err(state_failure) => {
                // the precise reason goes to the trail, never to the caller
                self.audit
                    .record(
                        AuditEntry::new(AuditAction::VerificationFailure)
                            .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                            .with_detail("reason", json!(state_failure.reason()))
                            .with_detail(
                                "token_hash_prefix",
                                json!(AuditEntry::hash_prefix(&token_hash)),
                            )
                            .with_error(state_failure.reason()),
                    )
                    .await;
                Err(CompleteError::InvalidToken)
            }
        }
    }

    /// Generate, hash and store a token; audits `TokenCreated`.
    async fn issue_token(
        &self,
        subject_id: Uuid,
        metadata: serde_json::Value,
        ctx: &RequestContext,
    ) -> DomainResult<IssueOutcome> {
        let secret = self.generator.generate();
        let token_hash = TokenGenerator::hash(&secret);

        let token = VerificationToken::new(
            subject_id,
            token_hash,
            TokenType::EmailVerification,
            Duration::minutes(self.config.token_ttl_minutes),
        )
        .with_max_attempts(self.config.max_attempts)
        .with_issued_from_ip(ctx.source_ip.clone())
        .with_metadata(metadata.clone());

        let stored = self.tokens.issue(token).await?;

        self.audit
            .record(
                AuditEntry::new(AuditAction::TokenCreated)
                    .with_subject(subject_id)
                    .with_token(stored.id)
                    .with_request_context(ctx.source_ip.clone(), ctx.user_agent.clone())
                    .with_detail("metadata", metadata),
            )
            .await;

        Ok(IssueOutcome {
            secret_token: secret,
            token_id: stored.id,
            expires_at: stored.expires_at,
        })
    }
}
