//! Observability for Zakazflow.

pub mod tracing_setup;
