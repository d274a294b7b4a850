//! DashMap-backed session store.
//!
//! All mutation happens inside short synchronous closures run under the
//! map's per-key shard lock; nothing here is held across an await. That
//! lock is also what makes [`SessionStore::begin_finalize`] the single
//! atomicity point for the claim-then-finalize protocol.

use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use zakazflow_types::session::{OrderSession, SessionKey};

pub struct SessionStore {
    sessions: DashMap<SessionKey, OrderSession>,
    /// Inactivity window after which a session is considered stale and
    /// replaced on next ingest.
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Run `mutate` on the session for `key`, creating a fresh session if
    /// none exists or the existing one went stale.
    ///
    /// A stale session is silently discarded, not finalized: the customer
    /// walked away mid-order and whatever was accumulated is abandoned.
    pub fn ingest<R>(&self, key: SessionKey, mutate: impl FnOnce(&mut OrderSession) -> R) -> R {
        let mut entry = self.sessions.entry(key).or_insert_with(|| {
            debug!(session = %key, "session created");
            OrderSession::new(key)
        });

        if self.is_stale(entry.value()) {
            debug!(session = %key, "stale session replaced");
            *entry.value_mut() = OrderSession::new(key);
        }

        mutate(entry.value_mut())
    }

    /// Snapshot of the current session, if any. Stale sessions are reported
    /// as absent.
    pub fn peek(&self, key: SessionKey) -> Option<OrderSession> {
        self.sessions.get(&key).and_then(|entry| {
            if self.is_stale(entry.value()) {
                None
            } else {
                Some(entry.value().clone())
            }
        })
    }

    /// Atomically claim the session for finalization.
    ///
    /// Exactly one caller gets `Some` per session lifetime: the session is
    /// marked completed under the shard lock, and completed or absent
    /// sessions yield `None`. The returned snapshot is what gets finalized.
    pub fn begin_finalize(&self, key: SessionKey) -> Option<OrderSession> {
        let mut entry = self.sessions.get_mut(&key)?;
        let session = entry.value_mut();
        if session.completed || self.is_stale(session) {
            return None;
        }
        session.completed = true;
        Some(session.clone())
    }

    /// Drop the session after finalization (or abandonment).
    pub fn clear(&self, key: SessionKey) {
        if self.sessions.remove(&key).is_some() {
            debug!(session = %key, "session cleared");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_stale(&self, session: &OrderSession) -> bool {
        let age = Utc::now().signed_duration_since(session.updated_at);
        age.num_milliseconds() > self.ttl.as_millis() as i64
    }

    /// Shift a session's `updated_at` into the past. Test-only TTL lever.
    #[cfg(test)]
    pub fn backdate(&self, key: SessionKey, by: Duration) {
        if let Some(mut entry) = self.sessions.get_mut(&key) {
            entry.value_mut().updated_at -=
                chrono::TimeDelta::milliseconds(by.as_millis() as i64);
        }
    }
}
