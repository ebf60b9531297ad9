//! Inbound events delivered by the chat-network transport.

use serde::{Deserialize, Serialize};

/// Metadata common to every inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Network-assigned unique message id.
    pub id: String,
    /// Conversation the event was posted to.
    pub conversation: String,
    /// Network address of the originator.
    pub sender: String,
    /// Unix timestamp (seconds) assigned by the network.
    pub timestamp: u64,
    /// Whether the event was sent by this account.
    #[serde(default)]
    pub from_me: bool,
}

/// Kind of downloadable media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Document,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Document => write!(f, "document"),
        }
    }
}

/// A text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEvent {
    pub info: EventInfo,
    pub text: String,
}

/// An image or document whose payload must be downloaded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEvent {
    pub info: EventInfo,
    pub kind: MediaKind,
    /// MIME type as reported by the network (e.g. `image/jpeg`).
    pub mime_type: String,
    /// Original file name, for documents.
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Transport-specific handle used to fetch the payload.
    #[serde(default)]
    pub media_ref: String,
}

impl MediaEvent {
    /// File extension used when storing the payload.
    ///
    /// Documents keep the last `.` segment of their original name; everything
    /// else (and documents without one) uses the MIME subtype, then `bin`.
    pub fn extension(&self) -> String {
        if self.kind == MediaKind::Document {
            if let Some(ext) = self
                .file_name
                .as_deref()
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext)
                .filter(|ext| !ext.is_empty())
            {
                return ext.to_string();
            }
        }
        self.mime_type
            .split_once('/')
            .map(|(_, sub)| sub.split(';').next().unwrap_or(sub).trim())
            .filter(|sub| !sub.is_empty())
            .unwrap_or("bin")
            .to_string()
    }

    /// Storage file name: `<event id>.<extension>`.
    ///
    /// Both parts come from the sender, so each is reduced to a single flat
    /// path component.
    pub fn storage_name(&self) -> String {
        format!(
            "{}.{}",
            flat_component(&self.info.id),
            flat_component(&self.extension())
        )
    }
}

/// Replace anything but ASCII alphanumerics, `-` and `_` with `_`.
fn flat_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Every event kind the transport can deliver.
///
/// Kinds the bridge does not handle arrive as `Other` so new transport
/// capabilities never break dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum InboundEvent {
    Text(TextEvent),
    Image(MediaEvent),
    Document(MediaEvent),
    Sticker { info: EventInfo },
    Other { info: EventInfo, kind: String },
}

impl InboundEvent {
    pub fn info(&self) -> &EventInfo {
        match self {
            InboundEvent::Text(e) => &e.info,
            InboundEvent::Image(e) | InboundEvent::Document(e) => &e.info,
            InboundEvent::Sticker { info } | InboundEvent::Other { info, .. } => info,
        }
    }

    /// Short label for logs.
    pub fn kind_name(&self) -> &str {
        match self {
            InboundEvent::Text(_) => "text",
            InboundEvent::Image(_) => "image",
            InboundEvent::Document(_) => "document",
            InboundEvent::Sticker { .. } => "sticker",
            InboundEvent::Other { kind, .. } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(kind: MediaKind, mime: &str, file_name: Option<&str>) -> MediaEvent {
        MediaEvent {
            info: EventInfo {
                id: "3EB0ABC".to_string(),
                conversation: "group@g.us".to_string(),
                sender: "31600000000@s.whatsapp.net".to_string(),
                timestamp: 0,
                from_me: false,
            },
            kind,
            mime_type: mime.to_string(),
            file_name: file_name.map(String::from),
            caption: None,
            media_ref: String::new(),
        }
    }

    #[test]
    fn test_image_extension_from_mime() {
        let event = media(MediaKind::Image, "image/jpeg", None);
        assert_eq!(event.storage_name(), "3EB0ABC.jpeg");
    }

    #[test]
    fn test_document_extension_from_file_name() {
        let event = media(MediaKind::Document, "application/pdf", Some("report.final.odt"));
        assert_eq!(event.storage_name(), "3EB0ABC.odt");
    }

    #[test]
    fn test_document_without_extension_falls_back() {
        let event = media(MediaKind::Document, "application/pdf", Some("README"));
        assert_eq!(event.extension(), "pdf");
        let event = media(MediaKind::Document, "", Some("README"));
        assert_eq!(event.extension(), "bin");
    }

    #[test]
    fn test_mime_parameters_are_ignored() {
        let event = media(MediaKind::Image, "image/webp; codecs=x", None);
        assert_eq!(event.extension(), "webp");
    }

    #[test]
    fn test_storage_name_stays_flat() {
        let mut event = media(MediaKind::Image, "image/jpeg", None);
        event.info.id = "../escaped".to_string();
        assert_eq!(event.storage_name(), "___escaped.jpeg");

        let mut event = media(MediaKind::Document, "", Some("notes.pdf/x"));
        event.info.id = "a\\b".to_string();
        let name = event.storage_name();
        assert!(!name.contains('/') && !name.contains('\\') && !name.contains(".."));
        assert_eq!(name, "a_b.pdf_x");
    }

    #[test]
    fn test_kind_name_and_info() {
        let event = InboundEvent::Other {
            info: media(MediaKind::Image, "", None).info,
            kind: "location".to_string(),
        };
        assert_eq!(event.kind_name(), "location");
        assert_eq!(event.info().id, "3EB0ABC");
    }
}
