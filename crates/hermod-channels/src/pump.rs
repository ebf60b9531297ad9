//! Outbound relay pump: relay infile lines → chat-network sends.
//!
//! Each line is attempted once. An attachment directive whose upload fails
//! degrades to a text message linking (or naming) the media, and that text
//! is sent in its place. Between lines the pump checks the backpressure slot
//! and sleeps while the connection is being restored.

use crate::backpressure::BackpressureReceiver;
use crate::directive::{parse_line, AttachmentDirective, DirectiveError, RelayLine};
use crate::tail::InfileFollower;
use crate::types::ChatTransport;
use hermod_types::config::HermodConfig;
use hermod_types::message::OutgoingMessage;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Extra pause on top of the signaled backpressure wait.
pub const BACKPRESSURE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct PumpConfig {
    pub conversation_id: String,
    pub infile: PathBuf,
    pub poll_interval: Duration,
    /// Origin tag → base URL for attachment link fallback.
    pub link_origins: BTreeMap<String, String>,
}

impl PumpConfig {
    pub fn from_config(config: &HermodConfig) -> Self {
        Self {
            conversation_id: config.conversation_id.clone(),
            infile: config.relay.infile.clone(),
            poll_interval: Duration::from_millis(config.relay.poll_interval_ms),
            link_origins: config.relay.link_origins.clone(),
        }
    }
}

/// Result of handling one infile line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Empty,
    Rejected(DirectiveError),
    /// The directive's file could not be read; nothing was sent.
    FileUnavailable,
    AttachmentSent(String),
    /// Plain text sent; `fallback` when it replaced a failed attachment.
    TextSent { id: String, fallback: bool },
    SendFailed,
}

/// Follows the relay infile and sends each line into the conversation.
pub struct RelayPump<T: ChatTransport + ?Sized> {
    transport: Arc<T>,
    config: PumpConfig,
    backpressure: BackpressureReceiver,
}

impl<T: ChatTransport + ?Sized> RelayPump<T> {
    pub fn new(transport: Arc<T>, config: PumpConfig, backpressure: BackpressureReceiver) -> Self {
        Self {
            transport,
            config,
            backpressure,
        }
    }

    /// Follow the infile until `shutdown` flips to `true`.
    ///
    /// A line already being sent is finished before returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut follower =
            InfileFollower::open_at_end(&self.config.infile, self.config.poll_interval).await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            let line = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                line = follower.next_line() => line,
            };
            self.handle_line(&line).await;
        }
        info!("Relay pump stopped");
    }

    /// Handle one line read from the infile.
    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        if let Some(wait) = self.backpressure.poll() {
            let pause = wait + BACKPRESSURE_GRACE;
            info!(?pause, "Connection restoring, pausing relay");
            tokio::time::sleep(pause).await;
        }

        match parse_line(line) {
            Ok(RelayLine::Empty) => LineOutcome::Empty,
            Ok(RelayLine::Text(text)) => self.send_text(text, false).await,
            Ok(RelayLine::Attachment(directive)) => self.send_attachment(directive).await,
            Err(e) => {
                warn!(error = %e, "Skipping malformed directive");
                LineOutcome::Rejected(e)
            }
        }
    }

    async fn send_attachment(&self, directive: AttachmentDirective) -> LineOutcome {
        let content = match tokio::fs::read(&directive.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %directive.path.display(), error = %e, "Failed to open file");
                return LineOutcome::FileUnavailable;
            }
        };

        let message = OutgoingMessage::Attachment {
            conversation: self.config.conversation_id.clone(),
            kind: directive.kind.clone(),
            caption: directive.caption.clone(),
            file_name: directive.file_name(),
            content,
        };
        match self.transport.send(message).await {
            Ok(id) => {
                info!(msg_id = %id, kind = %directive.kind, "Attachment sent");
                LineOutcome::AttachmentSent(id)
            }
            Err(e) => {
                warn!(error = %e, path = %directive.path.display(), "Attachment upload failed, sending link");
                let text = directive.fallback_text(&self.config.link_origins);
                self.send_text(text, true).await
            }
        }
    }

    async fn send_text(&self, text: String, fallback: bool) -> LineOutcome {
        debug!(%text, "Relaying line");
        let message = OutgoingMessage::text(&self.config.conversation_id, text);
        match self.transport.send(message).await {
            Ok(id) => {
                info!(msg_id = %id, "Message sent");
                LineOutcome::TextSent { id, fallback }
            }
            Err(e) => {
                warn!(error = %e, "Error sending message");
                LineOutcome::SendFailed
            }
        }
    }
}
