//! The chat-network transport seen from the bridge.
//!
//! The transport owns the protocol, the crypto and its own timeouts. The
//! bridge only needs the capabilities below.

use async_trait::async_trait;
use futures::Stream;
use hermod_types::event::{EventInfo, InboundEvent, MediaEvent};
use hermod_types::message::OutgoingMessage;
use hermod_types::session::Session;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::oneshot;

/// Failures reported by the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection to the network dropped. Recoverable by waiting and restoring.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The network rejected an outgoing message.
    #[error("send rejected: {0}")]
    SendRejected(String),
    /// Login or session restore was refused.
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, TransportError::ConnectionFailed(_))
    }
}

/// Failures downloading a media payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The media server answered 410: the stored URL expired.
    #[error("media gone (410)")]
    Gone,
    /// The media server answered 404.
    #[error("media not found (404)")]
    NotFound,
    #[error("media download failed: {0}")]
    Other(String),
}

impl MediaError {
    /// Whether refreshing the media metadata may make a retry succeed.
    pub fn is_expired(&self) -> bool {
        matches!(self, MediaError::Gone | MediaError::NotFound)
    }
}

/// Something the transport delivers asynchronously.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Message(InboundEvent),
    Error(TransportError),
}

/// Chat-network client capability.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Stream of received events and asynchronous errors.
    ///
    /// Called once, before authentication, so nothing delivered after login is missed.
    async fn events(
        &self,
    ) -> Result<Pin<Box<dyn Stream<Item = TransportEvent> + Send>>, TransportError>;

    /// Full interactive login. The opaque login payload (a QR code) is sent on
    /// `payload_tx` for the operator.
    async fn login(&self, payload_tx: oneshot::Sender<String>) -> Result<Session, TransportError>;

    /// Resume a previously persisted session.
    async fn restore_with_session(&self, session: Session) -> Result<Session, TransportError>;

    /// Re-establish the current session after a connection failure.
    async fn restore(&self) -> Result<(), TransportError>;

    /// Liveness probe: is the phone behind the account reachable?
    async fn ping(&self) -> Result<bool, TransportError>;

    /// Close the connection, returning the final session state.
    async fn disconnect(&self) -> Result<Session, TransportError>;

    /// Send a message, returning the network-assigned message id.
    async fn send(&self, message: OutgoingMessage) -> Result<String, TransportError>;

    /// Fetch a media payload.
    async fn download(&self, media: &MediaEvent) -> Result<Vec<u8>, MediaError>;

    /// Refresh the stored metadata (download URL, keys) for a media message.
    async fn load_media_info(&self, info: &EventInfo) -> Result<(), TransportError>;
}
