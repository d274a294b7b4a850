//! Process-wide cooldown gate for LLM calls.
//!
//! A quota error disables all LLM calls for a long cooldown, a rate-limit
//! error for a short one. While the gate is open, guarded extractors return
//! "no result" and guarded classifiers signal `Disabled` so the rules
//! fallback takes over. Other errors never open the gate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use zakazflow_types::error::ExtractError;

use crate::classify::Classifier;
use crate::extract::FactExtractor;
use zakazflow_types::extraction::{Classification, ExtractedFacts};

/// Shared breaker state. One instance guards every LLM-backed port.
#[derive(Debug)]
pub struct LlmBreaker {
    disabled_until: Mutex<Option<Instant>>,
    quota_cooldown: Duration,
    rate_limit_cooldown: Duration,
}

impl LlmBreaker {
    pub fn new(quota_cooldown: Duration, rate_limit_cooldown: Duration) -> Self {
        Self {
            disabled_until: Mutex::new(None),
            quota_cooldown,
            rate_limit_cooldown,
        }
    }

    /// True while calls should be skipped. Clears an expired cooldown.
    pub fn is_open(&self) -> bool {
        let mut until = self.disabled_until.lock().expect("breaker lock poisoned");
        match *until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                *until = None;
                false
            }
            None => false,
        }
    }

    /// Record a call failure, opening the gate for quota and rate-limit
    /// errors. Other errors leave the gate untouched.
    pub fn record_failure(&self, error: &ExtractError) {
        let cooldown = match error {
            ExtractError::QuotaExhausted => self.quota_cooldown,
            ExtractError::RateLimited { retry_after_ms } => retry_after_ms
                .map(Duration::from_millis)
                .unwrap_or(self.rate_limit_cooldown)
                .min(self.rate_limit_cooldown),
            _ => return,
        };

        let deadline = Instant::now() + cooldown;
        let mut until = self.disabled_until.lock().expect("breaker lock poisoned");
        // Never shorten an already-set cooldown.
        if until.map_or(true, |current| deadline > current) {
            warn!(cooldown_secs = cooldown.as_secs(), error = %error, "llm calls disabled");
            *until = Some(deadline);
        }
    }
}

/// Fact extractor wrapper that consults the breaker before every call.
///
/// A skipped call is `Ok(None)`: callers degrade to ingestion facts, same
/// as when the extractor finds nothing.
pub struct GuardedExtractor<X> {
    inner: X,
    breaker: Arc<LlmBreaker>,
}

impl<X> GuardedExtractor<X> {
    pub fn new(inner: X, breaker: Arc<LlmBreaker>) -> Self {
        Self { inner, breaker }
    }
}

impl<X: FactExtractor> FactExtractor for GuardedExtractor<X> {
    async fn extract(
        &self,
        text: &str,
        context: &[String],
    ) -> Result<Option<ExtractedFacts>, ExtractError> {
        if self.breaker.is_open() {
            return Ok(None);
        }
        match self.inner.extract(text, context).await {
            Ok(facts) => Ok(facts),
            Err(err) => {
                self.breaker.record_failure(&err);
                Err(err)
            }
        }
    }
}

/// Classifier wrapper that consults the breaker before every call.
///
/// A skipped call is `Err(Disabled)` so a `FallbackClassifier` drops to
/// its rules fallback immediately.
pub struct GuardedClassifier<C> {
    inner: C,
    breaker: Arc<LlmBreaker>,
}

impl<C> GuardedClassifier<C> {
    pub fn new(inner: C, breaker: Arc<LlmBreaker>) -> Self {
        Self { inner, breaker }
    }
}

impl<C: Classifier> Classifier for GuardedClassifier<C> {
    async fn classify(
        &self,
        text: &str,
        context: &[String],
    ) -> Result<Classification, ExtractError> {
        if self.breaker.is_open() {
            return Err(ExtractError::Disabled);
        }
        match self.inner.classify(text, context).await {
            Ok(result) => Ok(result),
            Err(err) => {
                self.breaker.record_failure(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const QUOTA: Duration = Duration::from_secs(1800);
    const RATE: Duration = Duration::from_secs(60);

    struct CountingExtractor {
        calls: AtomicUsize,
        error: fn() -> ExtractError,
    }

    impl FactExtractor for &CountingExtractor {
        async fn extract(
            &self,
            _text: &str,
            _context: &[String],
        ) -> Result<Option<ExtractedFacts>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    #[test]
    fn test_breaker_starts_closed() {
        let breaker = LlmBreaker::new(QUOTA, RATE);
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_provider_error_does_not_open() {
        let breaker = LlmBreaker::new(QUOTA, RATE);
        breaker.record_failure(&ExtractError::Provider {
            message: "500".to_string(),
        });
        assert!(!breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_opens_for_long_cooldown() {
        let breaker = LlmBreaker::new(QUOTA, RATE);
        breaker.record_failure(&ExtractError::QuotaExhausted);
        assert!(breaker.is_open());

        tokio::time::advance(Duration::from_secs(1799)).await;
        assert!(breaker.is_open());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_opens_for_short_cooldown() {
        let breaker = LlmBreaker::new(QUOTA, RATE);
        breaker.record_failure(&ExtractError::RateLimited {
            retry_after_ms: None,
        });
        assert!(breaker.is_open());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint_capped_by_configured_cooldown() {
        let breaker = LlmBreaker::new(QUOTA, RATE);
        breaker.record_failure(&ExtractError::RateLimited {
            retry_after_ms: Some(5_000),
        });
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_never_shortens_quota_cooldown() {
        let breaker = LlmBreaker::new(QUOTA, RATE);
        breaker.record_failure(&ExtractError::QuotaExhausted);
        breaker.record_failure(&ExtractError::RateLimited {
            retry_after_ms: None,
        });

        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_extractor_skips_while_open() {
        let breaker = Arc::new(LlmBreaker::new(QUOTA, RATE));
        let inner = CountingExtractor {
            calls: AtomicUsize::new(0),
            error: || ExtractError::QuotaExhausted,
        };
        let guarded = GuardedExtractor::new(&inner, Arc::clone(&breaker));

        // First call reaches the backend and trips the breaker.
        assert!(guarded.extract("latte", &[]).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        // Subsequent calls are skipped with "no result".
        let skipped = guarded.extract("latte", &[]).await.unwrap();
        assert!(skipped.is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        // After the cooldown, calls reach the backend again.
        tokio::time::advance(QUOTA + Duration::from_secs(1)).await;
        assert!(guarded.extract("latte", &[]).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_classifier_signals_disabled() {
        let breaker = Arc::new(LlmBreaker::new(QUOTA, RATE));
        breaker.record_failure(&ExtractError::QuotaExhausted);

        let guarded =
            GuardedClassifier::new(crate::classify::rules::RuleBasedClassifier, breaker);
        let err = guarded.classify("latte 2ta", &[]).await.unwrap_err();
        assert!(matches!(err, ExtractError::Disabled));
    }
}
