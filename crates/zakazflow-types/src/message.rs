//! Inbound message envelope.
//!
//! The chat-platform adapter (external to this core) resolves speech to
//! text and native location payloads before handing messages over, so the
//! engine only ever sees this envelope.

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::session::SessionKey;

/// Group chat identity, denormalized with its display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChatRef {
    /// Title for display, falling back to the numeric id.
    pub fn label(&self) -> String {
        match &self.title {
            Some(t) => t.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Message sender identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ParticipantRef {
    /// Display name for notices, falling back to `id=<n>`.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("id={}", self.id),
        }
    }
}

/// One inbound group message as seen by the aggregation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub chat: ChatRef,
    pub sender: ParticipantRef,
    /// Message text (or caption, or speech transcript). May be empty for
    /// a bare location pin.
    #[serde(default)]
    pub text: String,
    /// Native location payload, when the platform message carried a pin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Full text of the message this one replies to, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_text: Option<String>,
    /// Platform message id of the replied-to message; used to edit the
    /// original notice after an amendment supersedes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_notice_id: Option<i64>,
    /// True when `text` came from speech-to-text; enables spoken digit-word
    /// phone recovery.
    #[serde(default)]
    pub from_speech: bool,
}

impl InboundMessage {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.chat.id, self.sender.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_label_falls_back_to_id() {
        let p = ParticipantRef {
            id: 777,
            display_name: None,
        };
        assert_eq!(p.label(), "id=777");

        let p = ParticipantRef {
            id: 777,
            display_name: Some("Aziz".to_string()),
        };
        assert_eq!(p.label(), "Aziz");
    }

    #[test]
    fn test_chat_label_falls_back_to_id() {
        let chat = ChatRef {
            id: -100500,
            title: None,
        };
        assert_eq!(chat.label(), "-100500");
    }

    #[test]
    fn test_inbound_message_minimal_json() {
        let json = r#"{"chat":{"id":-1},"sender":{"id":2},"text":"salom"}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.text, "salom");
        assert!(msg.location.is_none());
        assert!(!msg.from_speech);
        assert_eq!(msg.session_key(), SessionKey::new(-1, 2));
    }
}
