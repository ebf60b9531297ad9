//! Inbound dispatch: chat-network events → bridge lines.
//!
//! Every event passes the same filter (not older than this process, posted
//! to the bridged conversation) and is then handled by kind. A text event
//! produces exactly one outcome: the help notice, a nickname change, or a
//! relayed line.

use crate::fanout::{append_line, Fanout};
use crate::types::{ChatTransport, MediaError};
use hermod_memory::IdentityStore;
use hermod_types::config::HermodConfig;
use hermod_types::event::{InboundEvent, MediaEvent, MediaKind, TextEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const HELP_COMMAND: &str = "!help";
const SETNICK_COMMAND: &str = "!setnick";

/// Settings the dispatcher needs from the configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub conversation_id: String,
    pub attachments_dir: PathBuf,
    pub attachments_url: String,
    pub notice_path: PathBuf,
}

impl DispatchConfig {
    pub fn from_config(config: &HermodConfig) -> Self {
        Self {
            conversation_id: config.conversation_id.clone(),
            attachments_dir: config.attachments.dir.clone(),
            attachments_url: config.attachments.url.trim_end_matches('/').to_string(),
            notice_path: config.notice_path(),
        }
    }
}

/// Why an event was not processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Sent before this process started (history replayed on restore).
    Stale,
    /// Posted to a conversation other than the bridged one.
    OtherConversation,
    /// The media payload could not be fetched or stored.
    MediaFailed,
    /// An event kind the bridge does not relay.
    Unsupported,
}

/// What a dispatched event resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dropped(DropReason),
    HelpShown,
    NickChanged { old: String, new: String },
    NickRejected,
    Relayed(String),
}

/// A parsed text command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    SetNick(String),
    Relay,
}

fn parse_command(text: &str) -> Command {
    if text.starts_with(HELP_COMMAND) {
        return Command::Help;
    }
    if text.starts_with(SETNICK_COMMAND) {
        let nick = text.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
        if !nick.is_empty() {
            return Command::SetNick(nick);
        }
    }
    Command::Relay
}

fn help_text(nick: &str) -> String {
    format!(
        "This group is bridged to other chat networks. Your phone number is obfuscated \
         when relayed to these channels. You are now known as {nick}. \
         Use the !setnick command to change this"
    )
}

/// Routes inbound events to the identity store and the fan-out.
pub struct InboundDispatcher<T: ChatTransport + ?Sized> {
    transport: Arc<T>,
    identities: Arc<IdentityStore>,
    fanout: Arc<Fanout>,
    config: DispatchConfig,
    /// Unix seconds at which this process started.
    started_at: u64,
}

impl<T: ChatTransport + ?Sized> InboundDispatcher<T> {
    pub fn new(
        transport: Arc<T>,
        identities: Arc<IdentityStore>,
        fanout: Arc<Fanout>,
        config: DispatchConfig,
        started_at: u64,
    ) -> Self {
        Self {
            transport,
            identities,
            fanout,
            config,
            started_at,
        }
    }

    /// Handle one event from the transport.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let info = event.info();
        if info.timestamp < self.started_at {
            debug!(
                id = %info.id,
                timestamp = info.timestamp,
                kind = event.kind_name(),
                "Skipping old message"
            );
            return DispatchOutcome::Dropped(DropReason::Stale);
        }
        if info.conversation != self.config.conversation_id {
            info!(
                conversation = %info.conversation,
                expected = %self.config.conversation_id,
                "Conversation does not match, skipping"
            );
            return DispatchOutcome::Dropped(DropReason::OtherConversation);
        }

        match event {
            InboundEvent::Text(text) => self.handle_text(text).await,
            InboundEvent::Image(media) | InboundEvent::Document(media) => {
                self.handle_media(media).await
            }
            InboundEvent::Sticker { info } => {
                let nick = self.identities.resolve(&info.sender);
                let body = format!("**{nick} sends a Sticker");
                self.fanout.relay(&body).await;
                DispatchOutcome::Relayed(self.fanout.format(&body))
            }
            InboundEvent::Other { info, kind } => {
                debug!(id = %info.id, %kind, "Unsupported event kind");
                DispatchOutcome::Dropped(DropReason::Unsupported)
            }
        }
    }

    async fn handle_text(&self, event: TextEvent) -> DispatchOutcome {
        debug!(
            id = %event.info.id,
            sender = %event.info.sender,
            text = %event.text,
            "Text message"
        );
        let sender = &event.info.sender;
        let nick = self.identities.resolve(sender);

        match parse_command(&event.text) {
            Command::Help => {
                self.notice(&help_text(&nick)).await;
                DispatchOutcome::HelpShown
            }
            Command::SetNick(requested) => match self.identities.set_name(sender, &requested) {
                Some(new) => {
                    self.notice(&format!("{nick} is now known as {new}.")).await;
                    self.fanout
                        .relay(&format!("**{nick} is now known as {new}"))
                        .await;
                    DispatchOutcome::NickChanged { old: nick, new }
                }
                None => {
                    warn!(%sender, "Nickname change rejected");
                    DispatchOutcome::NickRejected
                }
            },
            Command::Relay => {
                let body = format!("{nick}: {}", event.text);
                self.fanout.relay(&body).await;
                DispatchOutcome::Relayed(self.fanout.format(&body))
            }
        }
    }

    async fn handle_media(&self, media: MediaEvent) -> DispatchOutcome {
        let data = match self.download(&media).await {
            Ok(data) => data,
            Err(e) => {
                warn!(id = %media.info.id, kind = %media.kind, error = %e, "Media download failed");
                return DispatchOutcome::Dropped(DropReason::MediaFailed);
            }
        };

        let file_name = media.storage_name();
        let dest = self.config.attachments_dir.join(&file_name);
        if let Err(e) = tokio::fs::write(&dest, &data).await {
            warn!(path = %dest.display(), error = %e, "Saving attachment failed");
            return DispatchOutcome::Dropped(DropReason::MediaFailed);
        }
        info!(path = %dest.display(), kind = %media.kind, "Attachment saved");

        let nick = self.identities.resolve(&media.info.sender);
        let phrase = match media.kind {
            MediaKind::Image => "sends an image",
            MediaKind::Document => "sends a document",
        };
        let mut body = format!(
            "**{nick} {phrase}: {}/{file_name}",
            self.config.attachments_url
        );
        if let Some(caption) = media.caption.as_deref().filter(|c| !c.is_empty()) {
            body.push_str(" with caption: ");
            body.push_str(caption);
        }
        self.fanout.relay(&body).await;
        DispatchOutcome::Relayed(self.fanout.format(&body))
    }

    /// Download, refreshing the media metadata and retrying once if the
    /// stored URL expired.
    async fn download(&self, media: &MediaEvent) -> Result<Vec<u8>, MediaError> {
        match self.transport.download(media).await {
            Ok(data) => Ok(data),
            Err(e) if e.is_expired() => {
                debug!(id = %media.info.id, error = %e, "Media expired, refreshing metadata");
                self.transport
                    .load_media_info(&media.info)
                    .await
                    .map_err(|e| MediaError::Other(e.to_string()))?;
                self.transport.download(media).await
            }
            Err(e) => Err(e),
        }
    }

    async fn notice(&self, text: &str) {
        if let Err(e) = append_line(&self.config.notice_path, text).await {
            warn!(path = %self.config.notice_path.display(), error = %e, "Writing notice failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse_command("!help"), Command::Help);
        assert_eq!(parse_command("!helpme please"), Command::Help);
    }

    #[test]
    fn test_parse_setnick() {
        assert_eq!(
            parse_command("!setnick  Big   Al "),
            Command::SetNick("Big Al".to_string())
        );
    }

    #[test]
    fn test_setnick_without_name_is_relayed() {
        assert_eq!(parse_command("!setnick"), Command::Relay);
        assert_eq!(parse_command("!setnick   "), Command::Relay);
    }

    #[test]
    fn test_plain_text_is_relayed() {
        assert_eq!(parse_command("hello !help"), Command::Relay);
    }

    #[test]
    fn test_help_text_names_sender() {
        assert!(help_text("Anon-1234").contains("You are now known as Anon-1234."));
    }
}
