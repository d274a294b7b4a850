//! Reply-driven amendments: cancel the old order, create a replacement.
//!
//! A reply to a sent order notice that carries a different location or
//! phone set supersedes the original order. Product and comment text are
//! carried over from the notice itself (reverse-parsed), so the operator
//! only types what changed.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use zakazflow_types::location::Location;
use zakazflow_types::message::{ChatRef, InboundMessage, ParticipantRef};
use zakazflow_types::order::{AmendmentReason, FinalizedOrder, OrderAmendment};

use crate::classify::Classifier;
use crate::extract::{links, phones, FactExtractor};
use crate::notice::{self, NoticeView};
use crate::sinks::{DatasetRecord, DatasetSink, NotificationSink, OrderRepository};

use super::{finalize, EngineInner};

const CANCEL_FAILED_REPLY: &str = "Eski buyurtmani bekor qilishda xatolik yuz berdi.";
const NOT_FOUND_REPLY: &str = "Eski buyurtma topilmadi yoki allaqachon bekor qilingan.";
const SAVE_FAILED_REPLY: &str = "Yangilangan buyurtmani saqlashda xatolik yuz berdi.";

/// Handle a reply to an order notice. Returns true when the message was
/// consumed as an amendment (including error replies); false sends it
/// through normal ingestion.
pub(crate) async fn try_handle_reply<X, C, R, D, N>(
    inner: &Arc<EngineInner<X, C, R, D, N>>,
    message: &InboundMessage,
) -> bool
where
    X: FactExtractor + 'static,
    C: Classifier + 'static,
    R: OrderRepository + 'static,
    D: DatasetSink + 'static,
    N: NotificationSink + 'static,
{
    let Some(reply_text) = &message.reply_to_text else {
        return false;
    };
    let parsed = match notice::parse(reply_text) {
        Ok(parsed) => parsed,
        // Not an order notice (or an id-less one): ordinary reply.
        Err(err) => {
            debug!(error = %err, "reply target is not an amendable notice");
            return false;
        }
    };
    if parsed.superseded {
        debug!(order_id = parsed.order_id, "reply targets an already superseded notice");
        return false;
    }

    let new_location = message
        .location
        .clone()
        .or_else(|| links::detect_map_link(&message.text));

    let reply_phones: BTreeSet<String> = phones::extract(&message.text)
        .into_iter()
        .filter_map(|p| phones::canonical(&p))
        .collect();
    let old_phones: BTreeSet<String> = parsed
        .phones
        .iter()
        .filter_map(|p| phones::canonical(phones::without_suffix(p, phones::MACHINE_SUFFIX)))
        .collect();

    let phones_changed = !reply_phones.is_empty() && reply_phones != old_phones;
    let Some(reason) = AmendmentReason::from_changes(new_location.is_some(), phones_changed)
    else {
        // Neither location nor phones differ: not an amendment.
        return false;
    };

    info!(
        order_id = parsed.order_id,
        reason = %reason,
        "order amendment detected"
    );

    let cancelled = match inner.repository.cancel_order(parsed.order_id).await {
        Ok(cancelled) => cancelled,
        Err(err) => {
            error!(order_id = parsed.order_id, error = %err, "order cancel failed");
            send_reply(inner, CANCEL_FAILED_REPLY).await;
            return true;
        }
    };
    if !cancelled {
        info!(order_id = parsed.order_id, "order to amend not found or already cancelled");
        send_reply(inner, NOT_FOUND_REPLY).await;
        return true;
    }

    // Mark the old notice superseded. Cosmetic; failures are ignored.
    if let Some(notice_id) = message.reply_to_notice_id {
        let superseded = format!(
            "{reply_text}{}",
            notice::superseded_suffix(&reason.to_string())
        );
        if let Err(err) = inner.notifier.edit_notice(notice_id, &superseded).await {
            warn!(notice_id, error = %err, "failed to mark notice superseded");
        }
    }

    let display_phones: Vec<String> = if phones_changed {
        reply_phones
            .iter()
            .map(|p| phones::with_suffix(p, phones::MACHINE_SUFFIX))
            .collect()
    } else {
        parsed.phones.clone()
    };

    let location = new_location.or_else(|| {
        parsed
            .location_text
            .clone()
            .map(|raw| Location::Text { raw })
    });

    let customer = match parsed.client_id {
        Some(id) => ParticipantRef {
            id,
            display_name: (!parsed.client_name.is_empty()).then(|| parsed.client_name.clone()),
        },
        None => message.sender.clone(),
    };
    let chat = ChatRef {
        id: message.chat.id,
        title: if parsed.chat_title.is_empty() {
            message.chat.title.clone()
        } else {
            Some(parsed.chat_title.clone())
        },
    };

    let replacement = FinalizedOrder {
        chat,
        customer,
        phones: display_phones,
        amount: None,
        location,
        product_text: parsed.products.clone(),
        comment: parsed.comment.clone(),
        transcript: if message.text.trim().is_empty() {
            Vec::new()
        } else {
            vec![message.text.clone()]
        },
        created_at: Utc::now(),
    };
    let amendment = OrderAmendment {
        original_order_id: parsed.order_id,
        reason,
        replacement,
    };

    let new_order_id = match inner.repository.create_order(&amendment.replacement).await {
        Ok(id) => id,
        Err(err) => {
            error!(
                old_order_id = parsed.order_id,
                error = %err,
                "replacement order persistence failed"
            );
            send_reply(inner, SAVE_FAILED_REPLY).await;
            return true;
        }
    };

    let text =
        NoticeView::from_order(&amendment.replacement, Some(new_order_id), true).render();
    match inner
        .notifier
        .send_order_notice(&text, Some(new_order_id))
        .await
    {
        Ok(notice_id) => finalize::expire_keyboard(inner, notice_id),
        Err(err) => {
            error!(order_id = new_order_id, error = %err, "replacement notice failed");
        }
    }

    let record = DatasetRecord::order_update(
        message.session_key(),
        new_order_id,
        &amendment.replacement,
    );
    let dataset_inner = Arc::clone(inner);
    inner.effects.spawn(async move {
        if let Err(err) = dataset_inner.dataset.append(record).await {
            warn!(error = %err, "order_update dataset append failed");
        }
    });

    info!(
        old_order_id = parsed.order_id,
        new_order_id, "order amended"
    );
    true
}

async fn send_reply<X, C, R, D, N>(inner: &Arc<EngineInner<X, C, R, D, N>>, text: &str)
where
    X: FactExtractor,
    C: Classifier,
    R: OrderRepository,
    D: DatasetSink,
    N: NotificationSink,
{
    if let Err(err) = inner.notifier.send_plain(text).await {
        warn!(error = %err, "amendment reply failed");
    }
}
