//! The aggregation engine.
//!
//! One [`Engine`] instance handles the whole inbound stream. Per message it
//! updates the session, classifies, routes definitively-unrelated chatter
//! away, and decides whether to schedule the debounced finalizer. Replies
//! to order notices go through the amendment handler first.

mod amend;
mod finalize;
mod reconcile;

use std::sync::Arc;

use tracing::{debug, info, warn};

use zakazflow_types::config::Settings;
use zakazflow_types::extraction::{Classification, MessageRole};
use zakazflow_types::message::InboundMessage;
use zakazflow_types::session::SessionKey;

use crate::classify::{rules, Classifier};
use crate::effects::SideEffects;
use crate::extract::{amounts, keywords, links, phones, FactExtractor};
use crate::session::SessionStore;
use crate::sinks::{DatasetRecord, DatasetSink, NotificationSink, OrderRepository};

pub(crate) struct EngineInner<X, C, R, D, N> {
    pub(crate) settings: Settings,
    pub(crate) store: SessionStore,
    pub(crate) extractor: X,
    pub(crate) classifier: C,
    pub(crate) repository: R,
    pub(crate) dataset: D,
    pub(crate) notifier: N,
    pub(crate) effects: SideEffects,
}

/// The message-handling engine, cheap to clone and share across tasks.
pub struct Engine<X, C, R, D, N> {
    inner: Arc<EngineInner<X, C, R, D, N>>,
}

impl<X, C, R, D, N> Clone for Engine<X, C, R, D, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// What one ingestion pass observed, for the readiness/trigger decision.
#[derive(Default)]
struct IngestOutcome {
    completed: bool,
    phones_new: bool,
    just_got_location: bool,
    context: Vec<String>,
}

impl<X, C, R, D, N> Engine<X, C, R, D, N>
where
    X: FactExtractor + 'static,
    C: Classifier + 'static,
    R: OrderRepository + 'static,
    D: DatasetSink + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        settings: Settings,
        extractor: X,
        classifier: C,
        repository: R,
        dataset: D,
        notifier: N,
    ) -> Self {
        let store = SessionStore::new(settings.max_silence());
        Self {
            inner: Arc::new(EngineInner {
                settings,
                store,
                extractor,
                classifier,
                repository,
                dataset,
                notifier,
                effects: SideEffects::default(),
            }),
        }
    }

    /// Drain detached side-effect tasks. Tests call this to observe
    /// dataset/notification work deterministically.
    pub async fn flush_effects(&self) {
        self.inner.effects.flush().await;
    }

    /// Handle one inbound group message end to end.
    pub async fn handle_message(&self, message: InboundMessage) {
        // Replies to an order notice are amendments, not ingestion.
        if message.reply_to_text.is_some()
            && amend::try_handle_reply(&self.inner, &message).await
        {
            return;
        }

        let key = message.session_key();
        let text = message.text.clone();

        let location = message
            .location
            .clone()
            .or_else(|| links::detect_map_link(&text));

        let mut msg_phones = phones::extract(&text);
        if message.from_speech {
            for candidate in phones::spoken_digit_candidates(&text) {
                if let Some(p) = phones::normalize(&candidate) {
                    if !msg_phones.contains(&p) {
                        msg_phones.push(p);
                    }
                }
            }
        }
        let msg_amount = amounts::extract_amount(&text);

        let context_window = self.inner.settings.context_window;
        let outcome = self.inner.store.ingest(key, |session| {
            if session.completed {
                return IngestOutcome {
                    completed: true,
                    ..IngestOutcome::default()
                };
            }
            if !text.trim().is_empty() {
                session.transcript.push(text.clone());
            }
            let phones_new = session.union_phones(msg_phones.iter().cloned());
            let just_got_location = match &location {
                Some(loc) => session.record_location(loc.clone()),
                None => false,
            };
            if let Some(amount) = msg_amount {
                session.record_amount(amount);
            }
            let context = session
                .transcript
                .iter()
                .rev()
                .take(context_window)
                .rev()
                .cloned()
                .collect();
            IngestOutcome {
                completed: false,
                phones_new,
                just_got_location,
                context,
            }
        });

        if outcome.completed {
            debug!(session = %key, "session already completed, message dropped");
            return;
        }

        let mut classification = match self
            .inner
            .classifier
            .classify(&text, &outcome.context)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!(session = %key, error = %err, "classification failed, using rules");
                rules::classify_rules(&text)
            }
        };

        // Keyword fallback for UNKNOWN verdicts.
        if classification.role == MessageRole::Unknown {
            let lower = text.to_lowercase();
            if amounts::has_amount_signal(&text) {
                classification.role = MessageRole::Product;
            }
            if keywords::contains_any(&lower, keywords::COMMENT_KEYWORDS) {
                classification.role = MessageRole::Comment;
            }
        }

        debug!(
            session = %key,
            role = %classification.role,
            order_related = classification.is_order_related,
            source = %classification.source,
            "message classified"
        );

        self.spawn_ai_check(key, &text, &classification);

        // Definitively unrelated: no phone, no location, classifier says no.
        if !classification.is_order_related
            && msg_phones.is_empty()
            && location.is_none()
            && !text.trim().is_empty()
        {
            self.route_non_order(key, &message, &text, &classification);
            return;
        }

        let snapshot = self.inner.store.ingest(key, |session| {
            session.touch();
            session.clone()
        });

        let amount_signal_in_transcript = snapshot.amount.is_some()
            || snapshot
                .transcript
                .iter()
                .any(|m| amounts::has_amount_signal(m));
        let ready = (!snapshot.phones.is_empty() && snapshot.location.is_some())
            || (snapshot.location.is_some() && amount_signal_in_transcript);

        let trigger = outcome.just_got_location
            || classification.role == MessageRole::Product
            || classification.has_address_keywords
            || outcome.phones_new
            || amounts::has_amount_signal(&text);

        if !ready || snapshot.completed {
            return;
        }
        if !trigger {
            debug!(session = %key, "session ready but message is not a finalize trigger");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let chat = message.chat.clone();
        let customer = message.sender.clone();
        tokio::spawn(async move {
            finalize::run(inner, key, chat, customer).await;
        });
        info!(
            session = %key,
            quiet_window_secs = self.inner.settings.quiet_window_seconds,
            "finalize scheduled"
        );
    }

    /// Graceful shutdown: wait out in-flight side effects.
    pub async fn shutdown(&self) {
        self.inner.effects.shutdown().await;
    }

    fn spawn_ai_check(&self, key: SessionKey, text: &str, classification: &Classification) {
        let record = DatasetRecord::ai_check(key, text, classification);
        let inner = Arc::clone(&self.inner);
        self.inner.effects.spawn(async move {
            if let Err(err) = inner.dataset.append(record).await {
                warn!(error = %err, "ai_check dataset append failed");
            }
        });
    }

    fn route_non_order(
        &self,
        key: SessionKey,
        message: &InboundMessage,
        text: &str,
        classification: &Classification,
    ) {
        info!(session = %key, "message routed as non-order");
        let record = DatasetRecord::non_order(key, text, classification);
        let notice = format!(
            "👥 Guruh: {}\n👤 User: {} (id: {})\n\n📩 Xabar:\n{}",
            message.chat.label(),
            message.sender.label(),
            message.sender.id,
            text,
        );
        let inner = Arc::clone(&self.inner);
        self.inner.effects.spawn(async move {
            if let Err(err) = inner.dataset.append(record).await {
                warn!(error = %err, "non-order dataset append failed");
            }
            if let Err(err) = inner.notifier.send_plain(&notice).await {
                warn!(error = %err, "non-order notification failed");
            }
        });
    }
}
