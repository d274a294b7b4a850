//! Order session types.
//!
//! An [`OrderSession`] accumulates order facts for one participant in one
//! group chat between the first order-related message and finalize/clear.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Identity of an accumulating session: one participant in one chat.
///
/// Sessions are never merged across participants -- each person ordering
/// in the same group gets an independent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub chat_id: i64,
    pub participant_id: i64,
}

impl SessionKey {
    pub fn new(chat_id: i64, participant_id: i64) -> Self {
        Self {
            chat_id,
            participant_id,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chat_id, self.participant_id)
    }
}

/// Mutable per-(chat, participant) order state.
///
/// Mutation is monotonic or first-wins by design so that near-simultaneous
/// messages commute: the phone set only grows, location and amount keep the
/// first observed value. `completed` gates further ingestion once a
/// finalizer has claimed the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSession {
    pub key: SessionKey,
    /// Raw message texts in arrival order.
    pub transcript: Vec<String>,
    /// Normalized phone numbers, union-only.
    pub phones: BTreeSet<String>,
    /// First location seen wins.
    pub location: Option<Location>,
    /// First amount seen wins (whole units, pre-reconciliation).
    pub amount: Option<i64>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderSession {
    pub fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            transcript: Vec::new(),
            phones: BTreeSet::new(),
            location: None,
            amount: None,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a location if none is present yet.
    ///
    /// Returns true when this call set the location (the "just got location"
    /// finalize trigger).
    pub fn record_location(&mut self, location: Location) -> bool {
        if self.location.is_none() {
            self.location = Some(location);
            true
        } else {
            false
        }
    }

    /// Record an amount if none is present yet.
    pub fn record_amount(&mut self, amount: i64) {
        if self.amount.is_none() {
            self.amount = Some(amount);
        }
    }

    /// Union new phones into the set. Returns true when the set was empty
    /// before and is non-empty now (the "phones just arrived" trigger).
    pub fn union_phones<I: IntoIterator<Item = String>>(&mut self, phones: I) -> bool {
        let had_phones = !self.phones.is_empty();
        self.phones.extend(phones);
        !had_phones && !self.phones.is_empty()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Full transcript joined for reconciliation extraction.
    pub fn joined_transcript(&self) -> String {
        self.transcript.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(-100123, 42);
        assert_eq!(key.to_string(), "-100123:42");
    }

    #[test]
    fn test_union_phones_reports_first_arrival_only() {
        let mut session = OrderSession::new(SessionKey::new(1, 2));
        assert!(session.union_phones(["+998901234567".to_string()]));
        assert!(!session.union_phones(["+998907654321".to_string()]));
        assert_eq!(session.phones.len(), 2);
    }

    #[test]
    fn test_union_phones_never_shrinks() {
        let mut session = OrderSession::new(SessionKey::new(1, 2));
        session.union_phones(["+998901234567".to_string()]);
        session.union_phones(Vec::new());
        assert_eq!(session.phones.len(), 1);
    }

    #[test]
    fn test_record_location_first_wins() {
        let mut session = OrderSession::new(SessionKey::new(1, 2));
        assert!(session.record_location(Location::Native {
            lat: 41.3,
            lon: 69.2
        }));
        assert!(!session.record_location(Location::Native {
            lat: 40.0,
            lon: 65.0
        }));
        match session.location {
            Some(Location::Native { lat, .. }) => assert!((lat - 41.3).abs() < f64::EPSILON),
            other => panic!("unexpected location: {other:?}"),
        }
    }

    #[test]
    fn test_record_amount_first_wins() {
        let mut session = OrderSession::new(SessionKey::new(1, 2));
        session.record_amount(1000);
        session.record_amount(2000);
        assert_eq!(session.amount, Some(1000));
    }

    #[test]
    fn test_joined_transcript_preserves_order() {
        let mut session = OrderSession::new(SessionKey::new(1, 2));
        session.transcript.push("latte 2ta".to_string());
        session.transcript.push("Chilonzor 5".to_string());
        assert_eq!(session.joined_transcript(), "latte 2ta\nChilonzor 5");
    }

    #[test]
    fn test_session_serde_roundtrip() {
        let mut session = OrderSession::new(SessionKey::new(-5, 9));
        session.union_phones(["+998901234567".to_string()]);
        let json = serde_json::to_string(&session).unwrap();
        let parsed: OrderSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.key, session.key);
        assert_eq!(parsed.phones, session.phones);
    }
}
