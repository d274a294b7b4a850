//! Outbound ports: persistence, dataset, notifications.
//!
//! Implementations live in `zakazflow-infra`. Everything here is a trait
//! seam so the engine tests run against in-memory mocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use zakazflow_types::error::SinkError;
use zakazflow_types::extraction::Classification;
use zakazflow_types::order::FinalizedOrder;
use zakazflow_types::session::SessionKey;

/// Durable order persistence. The backend assigns order ids.
pub trait OrderRepository: Send + Sync {
    /// Persist a finalized order, returning its assigned id.
    fn create_order(
        &self,
        order: &FinalizedOrder,
    ) -> impl std::future::Future<Output = Result<i64, SinkError>> + Send;

    /// Cancel an existing order. `Ok(false)` means the id was unknown or
    /// already cancelled; callers treat that as handled, not as an error.
    fn cancel_order(
        &self,
        order_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, SinkError>> + Send;
}

/// Append-only training/audit log. Fire-and-forget: failures are logged
/// by the caller and never block the order flow.
pub trait DatasetSink: Send + Sync {
    fn append(
        &self,
        record: DatasetRecord,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;
}

/// Operator-facing notification channel.
pub trait NotificationSink: Send + Sync {
    /// Send an order notice, optionally with a cancel affordance for the
    /// given order id. Returns the platform notice id.
    fn send_order_notice(
        &self,
        text: &str,
        cancel_order_id: Option<i64>,
    ) -> impl std::future::Future<Output = Result<i64, SinkError>> + Send;

    /// Replace the text of an existing notice.
    fn edit_notice(
        &self,
        notice_id: i64,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    /// Strip the cancel affordance from a notice, leaving its text alone.
    fn remove_keyboard(
        &self,
        notice_id: i64,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    /// Plain message without order semantics (non-order routing, amendment
    /// fallback replies).
    fn send_plain(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;
}

/// Which stream of the dataset a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// A finalized order.
    Order,
    /// An amendment that replaced an order.
    OrderUpdate,
    /// Per-message classifier verdict, for prompt auditing.
    AiCheck,
    /// A message routed away as definitively order-unrelated.
    NonOrder,
}

/// One JSONL dataset line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Time-sortable record id (UUID v7).
    pub record_id: Uuid,
    #[serde(rename = "type")]
    pub kind: DatasetKind,
    pub timestamp: DateTime<Utc>,
    pub chat_id: i64,
    pub participant_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
    /// Single message text (ai_check / non_order records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Full session transcript (order / order_update records).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl DatasetRecord {
    fn base(kind: DatasetKind, key: SessionKey) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            kind,
            timestamp: Utc::now(),
            chat_id: key.chat_id,
            participant_id: key.participant_id,
            order_id: None,
            phones: Vec::new(),
            text: None,
            transcript: Vec::new(),
            classification: None,
        }
    }

    /// `order_id` is absent when persistence failed but the dataset record
    /// is still worth keeping.
    pub fn order(key: SessionKey, order_id: Option<i64>, order: &FinalizedOrder) -> Self {
        Self {
            order_id,
            phones: order.phones.clone(),
            transcript: order.transcript.clone(),
            ..Self::base(DatasetKind::Order, key)
        }
    }

    pub fn order_update(key: SessionKey, order_id: i64, order: &FinalizedOrder) -> Self {
        Self {
            order_id: Some(order_id),
            phones: order.phones.clone(),
            transcript: order.transcript.clone(),
            ..Self::base(DatasetKind::OrderUpdate, key)
        }
    }

    pub fn ai_check(key: SessionKey, text: &str, classification: &Classification) -> Self {
        Self {
            text: Some(text.to_string()),
            classification: Some(classification.clone()),
            ..Self::base(DatasetKind::AiCheck, key)
        }
    }

    pub fn non_order(key: SessionKey, text: &str, classification: &Classification) -> Self {
        Self {
            text: Some(text.to_string()),
            classification: Some(classification.clone()),
            ..Self::base(DatasetKind::NonOrder, key)
        }
    }
}
