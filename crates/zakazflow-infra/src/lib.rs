//! Infrastructure layer for Zakazflow.
//!
//! Implementations of the ports defined in `zakazflow-core`: the REST
//! persistence client, the OpenAI-backed classifier and fact extractor,
//! and the JSONL dataset sink.

pub mod dataset;
pub mod http;
pub mod llm;
