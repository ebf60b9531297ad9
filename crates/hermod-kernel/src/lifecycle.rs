//! Connection lifecycle: login/restore, session persistence, and
//! reconnection after connection failures.
//!
//! ```text
//! Unauthenticated → Authenticating → Connected ⇄ Reconnecting
//!                                        ↓            ↓
//!                                    Terminated   Terminated (restore failed)
//! ```

use crate::error::{KernelError, KernelResult};
use crate::session::SessionStore;
use hermod_channels::backpressure::BackpressureSender;
use hermod_channels::types::{ChatTransport, TransportError};
use hermod_types::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Where the connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unauthenticated,
    Authenticating,
    Connected,
    Reconnecting,
    Terminated,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Shows the interactive login payload (a QR code) to the operator.
pub trait LoginPresenter: Send + Sync {
    fn present(&self, payload: &str);
}

/// Writes the login payload to the log.
pub struct LogPresenter;

impl LoginPresenter for LogPresenter {
    fn present(&self, payload: &str) {
        info!(%payload, "Scan this login code with the phone");
    }
}

/// Owns authentication and recovery of the chat-network connection.
pub struct ConnectionManager<T: ChatTransport + ?Sized> {
    transport: Arc<T>,
    sessions: SessionStore,
    backpressure: BackpressureSender,
    reconnect_wait: Duration,
    presenter: Arc<dyn LoginPresenter>,
    state: watch::Sender<ConnectionState>,
}

impl<T: ChatTransport + ?Sized> ConnectionManager<T> {
    pub fn new(
        transport: Arc<T>,
        sessions: SessionStore,
        backpressure: BackpressureSender,
        reconnect_wait: Duration,
        presenter: Arc<dyn LoginPresenter>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Unauthenticated);
        Self {
            transport,
            sessions,
            backpressure,
            reconnect_wait,
            presenter,
            state,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "Connection state changed");
        }
    }

    /// Authenticate: restore the saved session if there is one, otherwise (or
    /// if that fails) log in interactively. Persists the resulting session and
    /// verifies the phone is reachable.
    pub async fn connect(&self) -> KernelResult<()> {
        self.set_state(ConnectionState::Authenticating);

        let restored = match self.sessions.load().await {
            Ok(Some(saved)) => match self.transport.restore_with_session(saved).await {
                Ok(session) => {
                    info!("Session restored");
                    Some(session)
                }
                Err(e) => {
                    warn!(error = %e, "Restoring session failed, falling back to login");
                    None
                }
            },
            Ok(None) => {
                info!(path = %self.sessions.path().display(), "No saved session, logging in");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cannot read saved session, logging in");
                None
            }
        };

        let session = match restored {
            Some(session) => session,
            None => self.login().await?,
        };
        self.sessions.save(&session).await?;

        match self.transport.ping().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(KernelError::ConnectivityCheck(
                    "phone did not answer".to_string(),
                ))
            }
            Err(e) => return Err(KernelError::ConnectivityCheck(e.to_string())),
        }

        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    async fn login(&self) -> KernelResult<Session> {
        let (payload_tx, payload_rx) = oneshot::channel::<String>();
        let presenter = self.presenter.clone();
        let presenting = tokio::spawn(async move {
            if let Ok(payload) = payload_rx.await {
                presenter.present(&payload);
            }
        });

        let result = self.transport.login(payload_tx).await;
        let _ = presenting.await;
        let session = result.map_err(KernelError::Login)?;
        info!("Logged in");
        Ok(session)
    }

    /// React to an asynchronous transport error.
    ///
    /// A connection failure pauses the relay pump, waits, and restores the
    /// connection; if that restore fails the error is returned and the bridge
    /// must stop. Failures reported while a reconnect is already under way, or
    /// after termination, are ignored. Any other error is only logged.
    ///
    /// Returns whether this call restored the connection.
    pub async fn handle_error(&self, err: TransportError) -> KernelResult<bool> {
        if !err.is_connection_failure() {
            warn!(error = %err, "Transport error");
            return Ok(false);
        }

        let mut previous = ConnectionState::Reconnecting;
        let claimed = self.state.send_if_modified(|state| match *state {
            ConnectionState::Reconnecting | ConnectionState::Terminated => false,
            current => {
                previous = current;
                *state = ConnectionState::Reconnecting;
                true
            }
        });
        if !claimed {
            debug!(error = %err, state = %self.state(), "Connection failure ignored");
            return Ok(false);
        }
        warn!(error = %err, "Connection failed");
        info!(from = %previous, to = %ConnectionState::Reconnecting, "Connection state changed");
        self.backpressure.signal(self.reconnect_wait);

        info!(wait = ?self.reconnect_wait, "Waiting before reconnect");
        tokio::time::sleep(self.reconnect_wait).await;

        info!("Reconnecting");
        match self.transport.restore().await {
            Ok(()) => {
                self.set_state(ConnectionState::Connected);
                Ok(true)
            }
            Err(e) => {
                error!(error = %e, "Restore failed");
                self.set_state(ConnectionState::Terminated);
                Err(KernelError::ReconnectFailed(e))
            }
        }
    }

    /// Disconnect and persist the final session.
    pub async fn shutdown(&self) -> KernelResult<()> {
        info!("Disconnecting");
        let session = self
            .transport
            .disconnect()
            .await
            .map_err(|e| KernelError::Shutdown(format!("disconnecting: {e}")))?;
        self.set_state(ConnectionState::Terminated);
        self.sessions
            .save(&session)
            .await
            .map_err(|e| KernelError::Shutdown(e.to_string()))?;
        Ok(())
    }
}
