//! Shared domain types for Zakazflow.
//!
//! This crate contains the core domain types used across the Zakazflow
//! pipeline: sessions, inbound messages, locations, extraction and
//! classification results, finalized orders, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod extraction;
pub mod location;
pub mod message;
pub mod order;
pub mod session;
