//! Finalized order and amendment types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::message::{ChatRef, ParticipantRef};

/// The immutable order composed from a session at finalize time.
///
/// Owned by this subsystem until handed to the persistence sink, which
/// assigns the durable order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedOrder {
    pub chat: ChatRef,
    pub customer: ParticipantRef,
    /// Reconciled customer phones: shop numbers excluded, canonical format
    /// with the machine-emitted `--` suffix.
    pub phones: Vec<String>,
    /// Reconciled amount in whole units.
    pub amount: Option<i64>,
    pub location: Option<Location>,
    /// Product description: transcript lines that survived cleanup, in
    /// original order.
    pub product_text: String,
    pub comment: String,
    /// Full raw transcript for audit.
    pub transcript: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Why a previous order was cancelled and replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendmentReason {
    Location,
    Phones,
    LocationAndPhones,
}

impl AmendmentReason {
    pub fn from_changes(location_changed: bool, phones_changed: bool) -> Option<Self> {
        match (location_changed, phones_changed) {
            (true, true) => Some(AmendmentReason::LocationAndPhones),
            (true, false) => Some(AmendmentReason::Location),
            (false, true) => Some(AmendmentReason::Phones),
            (false, false) => None,
        }
    }
}

impl fmt::Display for AmendmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmendmentReason::Location => write!(f, "lokatsiya o'zgartirildi"),
            AmendmentReason::Phones => write!(f, "telefon raqami(lar) o'zgartirildi"),
            AmendmentReason::LocationAndPhones => {
                write!(f, "lokatsiya o'zgartirildi, telefon raqami(lar) o'zgartirildi")
            }
        }
    }
}

/// Cancel-and-replace decision for an already sent order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAmendment {
    pub original_order_id: i64,
    pub reason: AmendmentReason,
    pub replacement: FinalizedOrder,
}
