//! Session aggregation engine and port trait definitions for Zakazflow.
//!
//! This crate defines the "ports" (extractor, classifier, and sink traits)
//! that the infrastructure layer implements, plus the whole aggregation
//! pipeline: rule-based fact extraction, the session store, the aggregation
//! engine with its debounced finalizer, the amendment handler, and the LLM
//! circuit breaker. It depends only on `zakazflow-types` -- never on
//! `zakazflow-infra` or any network crate.

pub mod breaker;
pub mod classify;
pub mod effects;
pub mod engine;
pub mod extract;
pub mod notice;
pub mod session;
pub mod sinks;
