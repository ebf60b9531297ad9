//! Messages sent into the bridged conversation.

use serde::{Deserialize, Serialize};

/// Quoted context attached to outgoing text messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotedContext {
    pub text: String,
    pub message_id: String,
    pub participant: String,
}

impl QuotedContext {
    /// Context quoting nothing in particular.
    pub fn placeholder() -> Self {
        Self {
            text: "?".to_string(),
            message_id: String::new(),
            participant: String::new(),
        }
    }
}

/// An outgoing message addressed to the bridged conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum OutgoingMessage {
    Text {
        conversation: String,
        text: String,
        quoted: QuotedContext,
    },
    Attachment {
        conversation: String,
        /// Media kind tag taken from the directive (e.g. `PIC`).
        kind: String,
        caption: String,
        file_name: String,
        content: Vec<u8>,
    },
}

impl OutgoingMessage {
    pub fn text(conversation: &str, text: impl Into<String>) -> Self {
        OutgoingMessage::Text {
            conversation: conversation.to_string(),
            text: text.into(),
            quoted: QuotedContext::placeholder(),
        }
    }
}
