//! Sliding-window rate limiter over the persisted attempt ledger.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use mp_shared::config::RateLimitConfig;

use crate::errors::StorageError;
use crate::repositories::rate_limit::RateLimitRepository;

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request was admitted and recorded.
    ///
    /// `reservation` identifies the recorded attempt so a later mail-delivery
    /// failure can release it; it is `None` only when the limiter is
    /// disabled or failed open.
    Allowed {
        remaining: u32,
        reservation: Option<Uuid>,
    },
    /// The budget is exhausted; retry once the oldest attempt ages out
    Denied { retry_after_seconds: u64 },
}

/// Sliding-window limiter: at most N admissions per subject in the trailing
/// W minutes, counted over the half-open interval `(now - W, now]`.
///
/// All state lives in the [`RateLimitRepository`]; concurrent callers are
/// serialized by the ledger's conditional insert, so the bound holds across
/// process restarts and replicas.
pub struct ResendRateLimiter<R: RateLimitRepository> {
    repository: Arc<R>,
    config: RateLimitConfig,
}

impl<R: RateLimitRepository> ResendRateLimiter<R> {
    /// Create a new limiter over the given ledger
    pub fn new(repository: Arc<R>, config: RateLimitConfig) -> Self {
        Self { repository, config }
    }

    /// Check the subject's budget and record the attempt when admitted.
    ///
    /// When the ledger itself fails, the configured policy decides: fail-open
    /// admits the request without recording it, fail-closed (default)
    /// surfaces the storage error and nothing is admitted.
    pub async fn check_and_reserve(
        &self,
        subject_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, StorageError> {
        if !self.config.enabled {
            return Ok(RateLimitDecision::Allowed {
                remaining: self.config.max_resends_per_window,
                reservation: None,
            });
        }

        let window = Duration::minutes(self.config.window_minutes);
        let window_start = now - window;
        let limit = self.config.max_resends_per_window;

        let reserved = match self
            .repository
            .reserve_if_below(subject_id, window_start, now, limit)
            .await
        {
            Ok(reserved) => reserved,
            Err(e) if self.config.fail_open => {
                warn!(
                    subject_id = %subject_id,
                    error = %e,
                    event = "rate_limit_fail_open",
                    "Attempt ledger unavailable; admitting request per fail-open policy"
                );
                return Ok(RateLimitDecision::Allowed {
                    remaining: 0,
                    reservation: None,
                });
            }
            Err(e) => return Err(e),
        };

        match reserved {
            Some(attempt) => {
                let count = self
                    .repository
                    .count_in_window(subject_id, window_start, now)
                    .await
                    .unwrap_or(limit);
                Ok(RateLimitDecision::Allowed {
                    remaining: limit.saturating_sub(count),
                    reservation: Some(attempt.id),
                })
            }
            None => {
                let oldest = self
                    .repository
                    .oldest_in_window(subject_id, window_start, now)
                    .await?;
                let retry_after_seconds = match oldest {
                    Some(oldest) => (oldest + window - now).num_seconds().max(0) as u64,
                    None => self.config.window_seconds(),
                };
                Ok(RateLimitDecision::Denied { retry_after_seconds })
            }
        }
    }

    /// Release a recorded attempt so the subject is not charged for it.
    /// Best-effort: a failed release only narrows the budget, so the error
    /// is logged and absorbed.
    pub async fn release(&self, reservation: Uuid) {
        if let Err(e) = self.repository.release(reservation).await {
            warn!(
                reservation = %reservation,
                error = %e,
                event = "rate_limit_release_failed",
                "Failed to release resend attempt reservation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::repositories::rate_limit::MockRateLimitRepository;

    fn limiter(config: RateLimitConfig) -> ResendRateLimiter<MockRateLimitRepository> {
        ResendRateLimiter::new(Arc::new(MockRateLimitRepository::new()), config)
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_worked_example_from_three_per_hour_policy() {
        // resends at t=0, 10, 20 succeed with remaining 2, 1, 0; t=30 is
        // denied with retry_after of about 30 minutes; t=61 succeeds again
        let limiter = limiter(RateLimitConfig::default());
        let subject_id = Uuid::new_v4();
        let t0 = base_time();

        let mut remaining_seen = Vec::new();
        for minutes in [0, 10, 20] {
            match limiter
                .check_and_reserve(subject_id, t0 + Duration::minutes(minutes))
                .await
                .unwrap()
            {
                RateLimitDecision::Allowed { remaining, reservation } => {
                    assert!(reservation.is_some());
                    remaining_seen.push(remaining);
                }
                other => panic!("expected admission, got {other:?}"),
            }
        }
        assert_eq!(remaining_seen, vec![2, 1, 0]);

        match limiter
            .check_and_reserve(subject_id, t0 + Duration::minutes(30))
            .await
            .unwrap()
        {
            RateLimitDecision::Denied { retry_after_seconds } => {
                assert_eq!(retry_after_seconds, 30 * 60);
            }
            other => panic!("expected denial, got {other:?}"),
        }

        match limiter
            .check_and_reserve(subject_id, t0 + Duration::minutes(61))
            .await
            .unwrap()
        {
            RateLimitDecision::Allowed { remaining, .. } => assert_eq!(remaining, 0),
            other => panic!("expected admission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attempt_on_window_edge_does_not_count() {
        let limiter = limiter(RateLimitConfig {
            max_resends_per_window: 1,
            ..RateLimitConfig::default()
        });
        let subject_id = Uuid::new_v4();
        let t0 = base_time();

        assert!(matches!(
            limiter.check_and_reserve(subject_id, t0).await.unwrap(),
            RateLimitDecision::Allowed { .. }
        ));

        // exactly one window later the t0 attempt is outside `(now-W, now]`
        let now = t0 + Duration::minutes(60);
        assert!(matches!(
            limiter.check_and_reserve(subject_id, now).await.unwrap(),
            RateLimitDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_denied_one_millisecond_before_the_edge() {
        let limiter = limiter(RateLimitConfig {
            max_resends_per_window: 1,
            ..RateLimitConfig::default()
        });
        let subject_id = Uuid::new_v4();
        let t0 = base_time();

        limiter.check_and_reserve(subject_id, t0).await.unwrap();

        let now = t0 + Duration::minutes(60) - Duration::milliseconds(1);
        match limiter.check_and_reserve(subject_id, now).await.unwrap() {
            RateLimitDecision::Denied { retry_after_seconds } => {
                // the t0 attempt ages out one millisecond from now
                assert_eq!(retry_after_seconds, 0);
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_release_refunds_the_budget() {
        let limiter = limiter(RateLimitConfig {
            max_resends_per_window: 1,
            ..RateLimitConfig::default()
        });
        let subject_id = Uuid::new_v4();
        let now = base_time();

        let reservation = match limiter.check_and_reserve(subject_id, now).await.unwrap() {
            RateLimitDecision::Allowed { reservation, .. } => reservation.unwrap(),
            other => panic!("expected admission, got {other:?}"),
        };
        assert!(matches!(
            limiter.check_and_reserve(subject_id, now).await.unwrap(),
            RateLimitDecision::Denied { .. }
        ));

        limiter.release(reservation).await;
        assert!(matches!(
            limiter.check_and_reserve(subject_id, now).await.unwrap(),
            RateLimitDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_disabled_limiter_admits_without_recording() {
        let repo = Arc::new(MockRateLimitRepository::new());
        let limiter = ResendRateLimiter::new(
            Arc::clone(&repo),
            RateLimitConfig {
                enabled: false,
                ..RateLimitConfig::default()
            },
        );

        let decision = limiter
            .check_and_reserve(Uuid::new_v4(), base_time())
            .await
            .unwrap();
        assert_eq!(
            decision,
            RateLimitDecision::Allowed {
                remaining: 3,
                reservation: None
            }
        );
        assert_eq!(repo.total_recorded().await, 0);
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_the_storage_error() {
        let repo = Arc::new(MockRateLimitRepository::new());
        repo.set_fail_storage(true).await;
        let limiter = ResendRateLimiter::new(Arc::clone(&repo), RateLimitConfig::default());

        assert!(limiter
            .check_and_reserve(Uuid::new_v4(), base_time())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fail_open_admits_without_reservation() {
        let repo = Arc::new(MockRateLimitRepository::new());
        repo.set_fail_storage(true).await;
        let limiter = ResendRateLimiter::new(
            Arc::clone(&repo),
            RateLimitConfig {
                fail_open: true,
                ..RateLimitConfig::default()
            },
        );

        let decision = limiter
            .check_and_reserve(Uuid::new_v4(), base_time())
            .await
            .unwrap();
        assert_eq!(
            decision,
            RateLimitDecision::Allowed {
                remaining: 0,
                reservation: None
            }
        );
    }
}
