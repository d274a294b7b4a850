//! Rule-based fact extraction and the `FactExtractor` port.
//!
//! The rule-based helpers here are the fast path run on every message.
//! The `FactExtractor` trait is the authoritative (LLM-backed) variant used
//! at reconciliation time; its implementation lives in `zakazflow-infra`.

pub mod amounts;
pub mod keywords;
pub mod links;
pub mod phones;

use zakazflow_types::error::ExtractError;
use zakazflow_types::extraction::ExtractedFacts;

/// Authoritative fact extraction over text.
///
/// `Ok(None)` means "no result": the extractor saw nothing order-shaped,
/// or the circuit breaker skipped the call. Callers degrade to the facts
/// gathered rule-based during ingestion.
pub trait FactExtractor: Send + Sync {
    fn extract(
        &self,
        text: &str,
        context: &[String],
    ) -> impl std::future::Future<Output = Result<Option<ExtractedFacts>, ExtractError>> + Send;
}

/// Extractor that never finds anything. Useful when running without an
/// LLM backend: reconciliation then relies purely on ingestion facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExtractor;

impl FactExtractor for NullExtractor {
    async fn extract(
        &self,
        _text: &str,
        _context: &[String],
    ) -> Result<Option<ExtractedFacts>, ExtractError> {
        Ok(None)
    }
}
