//! Stdio bridge to the chat-platform adapter.
//!
//! The adapter process pipes inbound messages in as JSON lines and consumes
//! outbound actions from stdout, one JSON object per line. Notice ids are
//! assigned locally and monotonically; the adapter maps them to platform
//! message ids on its side.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;

use zakazflow_core::sinks::NotificationSink;
use zakazflow_types::error::SinkError;

/// Outbound action envelope, one per stdout line.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutboundAction<'a> {
    SendNotice {
        notice_id: i64,
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        cancel_order_id: Option<i64>,
    },
    EditNotice {
        notice_id: i64,
        text: &'a str,
    },
    RemoveKeyboard {
        notice_id: i64,
    },
    SendPlain {
        text: &'a str,
    },
}

/// Notification sink writing JSON-line actions to stdout.
pub struct StdioNotifier {
    next_notice_id: AtomicI64,
    stdout: Mutex<std::io::Stdout>,
}

impl StdioNotifier {
    pub fn new() -> Self {
        Self {
            next_notice_id: AtomicI64::new(1),
            stdout: Mutex::new(std::io::stdout()),
        }
    }

    fn emit(&self, action: &OutboundAction<'_>) -> Result<(), SinkError> {
        let line = serde_json::to_string(action)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        let mut stdout = self.stdout.lock().expect("stdout lock poisoned");
        writeln!(stdout, "{line}").map_err(|e| SinkError::Transport(e.to_string()))?;
        stdout
            .flush()
            .map_err(|e| SinkError::Transport(e.to_string()))
    }
}

impl Default for StdioNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for StdioNotifier {
    async fn send_order_notice(
        &self,
        text: &str,
        cancel_order_id: Option<i64>,
    ) -> Result<i64, SinkError> {
        let notice_id = self.next_notice_id.fetch_add(1, Ordering::Relaxed);
        self.emit(&OutboundAction::SendNotice {
            notice_id,
            text,
            cancel_order_id,
        })?;
        Ok(notice_id)
    }

    async fn edit_notice(&self, notice_id: i64, text: &str) -> Result<(), SinkError> {
        self.emit(&OutboundAction::EditNotice { notice_id, text })
    }

    async fn remove_keyboard(&self, notice_id: i64) -> Result<(), SinkError> {
        self.emit(&OutboundAction::RemoveKeyboard { notice_id })
    }

    async fn send_plain(&self, text: &str) -> Result<(), SinkError> {
        self.emit(&OutboundAction::SendPlain { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_action_tagging() {
        let action = OutboundAction::SendNotice {
            notice_id: 3,
            text: "🆕 Yangi zakaz (ID: 9)",
            cancel_order_id: Some(9),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["op"], "send_notice");
        assert_eq!(json["cancel_order_id"], 9);

        let action = OutboundAction::RemoveKeyboard { notice_id: 3 };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["op"], "remove_keyboard");
        assert!(json.get("cancel_order_id").is_none());
    }

    #[tokio::test]
    async fn test_notice_ids_are_monotonic() {
        let notifier = StdioNotifier::new();
        let first = notifier.send_order_notice("a", None).await.unwrap();
        let second = notifier.send_order_notice("b", Some(1)).await.unwrap();
        assert_eq!(second, first + 1);
    }
}
