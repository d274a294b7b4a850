//! The debounced finalizer task.
//!
//! Spawned once per trigger. Sleeps the quiet window so trailing messages
//! fold into the transcript, claims the session (the idempotence point),
//! reconciles, and fans out to persistence, dataset, and notification.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use zakazflow_types::extraction::ExtractedAddress;
use zakazflow_types::location::Location;
use zakazflow_types::message::{ChatRef, ParticipantRef};
use zakazflow_types::order::FinalizedOrder;
use zakazflow_types::session::SessionKey;

use crate::classify::Classifier;
use crate::extract::{links, phones, FactExtractor};
use crate::notice::NoticeView;
use crate::sinks::{DatasetRecord, DatasetSink, NotificationSink, OrderRepository};

use super::{reconcile, EngineInner};

pub(crate) async fn run<X, C, R, D, N>(
    inner: Arc<EngineInner<X, C, R, D, N>>,
    key: SessionKey,
    chat: ChatRef,
    customer: ParticipantRef,
) where
    X: FactExtractor + 'static,
    C: Classifier + 'static,
    R: OrderRepository + 'static,
    D: DatasetSink + 'static,
    N: NotificationSink + 'static,
{
    tokio::time::sleep(inner.settings.quiet_window()).await;

    let Some(session) = inner.store.begin_finalize(key) else {
        debug!(session = %key, "finalize aborted, session claimed or gone");
        return;
    };
    info!(session = %key, messages = session.transcript.len(), "finalizing session");

    let mut all_phones = session.phones.clone();
    let mut amount = session.amount;
    let mut location = session.location.clone();

    // Authoritative extraction over the whole transcript supersedes the
    // per-message guesses; on failure or no result the session facts stand.
    match inner
        .extractor
        .extract(&session.joined_transcript(), &[])
        .await
    {
        Ok(Some(facts)) => {
            for raw in &facts.phones {
                if let Some(p) = phones::normalize(raw) {
                    all_phones.insert(p);
                }
            }
            if amount.is_none() {
                amount = facts.amount;
            }
            if location.is_none() {
                location = match facts.address {
                    ExtractedAddress::FreeText { value } => Some(Location::Text { raw: value }),
                    ExtractedAddress::MapLink { url } => links::detect_map_link(&url)
                        .or(Some(Location::Text { raw: url })),
                    ExtractedAddress::Coordinates { lat, lon } => {
                        Some(Location::Native { lat, lon })
                    }
                    ExtractedAddress::None => None,
                };
            }
        }
        Ok(None) => debug!(session = %key, "no reconciliation extraction result"),
        Err(err) => {
            warn!(session = %key, error = %err, "reconciliation extraction failed, degrading to session facts");
        }
    }

    let customer_phones = reconcile::choose_customer_phones(
        &session.transcript,
        &all_phones,
        &inner.settings.shop_phones,
    );
    let display_phones: Vec<String> = customer_phones
        .iter()
        .filter_map(|p| phones::canonical(p))
        .map(|p| phones::with_suffix(&p, phones::MACHINE_SUFFIX))
        .collect();

    let (product_text, comment) = reconcile::split_product_comment(
        &session.transcript,
        &customer_phones,
        amount,
        &customer.label(),
    );

    let order = FinalizedOrder {
        chat,
        customer,
        phones: display_phones,
        amount,
        location,
        product_text,
        comment,
        transcript: session.transcript.clone(),
        created_at: Utc::now(),
    };

    let order_id = match inner.repository.create_order(&order).await {
        Ok(id) => Some(id),
        Err(err) => {
            error!(session = %key, error = %err, "order persistence failed, notification skipped");
            None
        }
    };

    let record = DatasetRecord::order(key, order_id, &order);
    let dataset_inner = Arc::clone(&inner);
    inner.effects.spawn(async move {
        if let Err(err) = dataset_inner.dataset.append(record).await {
            warn!(error = %err, "order dataset append failed");
        }
    });

    if let Some(id) = order_id {
        let text = NoticeView::from_order(&order, Some(id), false).render();
        match inner.notifier.send_order_notice(&text, Some(id)).await {
            Ok(notice_id) => expire_keyboard(&inner, notice_id),
            Err(err) => error!(session = %key, order_id = id, error = %err, "order notice failed"),
        }
    }

    inner.store.clear(key);
    info!(session = %key, order_id = ?order_id, "session finalized and cleared");
}

/// Detach a timer that strips the cancel affordance once it expires.
pub(crate) fn expire_keyboard<X, C, R, D, N>(
    inner: &Arc<EngineInner<X, C, R, D, N>>,
    notice_id: i64,
) where
    X: FactExtractor + 'static,
    C: Classifier + 'static,
    R: OrderRepository + 'static,
    D: DatasetSink + 'static,
    N: NotificationSink + 'static,
{
    let ttl = inner.settings.keyboard_ttl();
    let task_inner = Arc::clone(inner);
    inner.effects.spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Err(err) = task_inner.notifier.remove_keyboard(notice_id).await {
            warn!(notice_id, error = %err, "failed to remove cancel keyboard");
        }
    });
}
