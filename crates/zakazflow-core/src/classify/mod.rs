//! The `Classifier` port and the fallback combinator.
//!
//! Two variants exist: the keyword rules in [`rules`] and the LLM-backed
//! classifier in `zakazflow-infra`. [`FallbackClassifier`] makes either one
//! pluggable as the other's safety net.

pub mod rules;

use tracing::debug;

use zakazflow_types::error::ExtractError;
use zakazflow_types::extraction::Classification;

/// Message role / order-relatedness classification.
pub trait Classifier: Send + Sync {
    /// Classify `text` given the most recent transcript messages as context.
    fn classify(
        &self,
        text: &str,
        context: &[String],
    ) -> impl std::future::Future<Output = Result<Classification, ExtractError>> + Send;
}

/// Try the primary classifier, fall back to the secondary on any error.
///
/// The usual wiring is LLM primary with rules fallback, so a skipped or
/// failed LLM call degrades precision instead of failing the message.
pub struct FallbackClassifier<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackClassifier<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: Classifier, F: Classifier> Classifier for FallbackClassifier<P, F> {
    async fn classify(
        &self,
        text: &str,
        context: &[String],
    ) -> Result<Classification, ExtractError> {
        match self.primary.classify(text, context).await {
            Ok(result) => Ok(result),
            Err(err) => {
                debug!(error = %err, "primary classifier failed, using fallback");
                self.fallback.classify(text, context).await
            }
        }
    }
}
