//! HermodKernel: assembles the bridge and runs it until shutdown.

use crate::error::{KernelError, KernelResult};
use crate::lifecycle::{ConnectionManager, ConnectionState, LogPresenter, LoginPresenter};
use crate::session::SessionStore;
use crate::supervisor::Supervisor;
use chrono::Utc;
use futures::StreamExt;
use hermod_channels::backpressure;
use hermod_channels::dispatcher::{DispatchConfig, InboundDispatcher};
use hermod_channels::fanout::Fanout;
use hermod_channels::pump::{PumpConfig, RelayPump};
use hermod_channels::types::{ChatTransport, TransportEvent};
use hermod_memory::IdentityStore;
use hermod_types::config::HermodConfig;
use hermod_types::error::HermodError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The assembled bridge.
pub struct HermodKernel<T: ChatTransport + ?Sized + 'static> {
    config: HermodConfig,
    transport: Arc<T>,
    identities: Arc<IdentityStore>,
    dispatcher: Arc<InboundDispatcher<T>>,
    connection: Arc<ConnectionManager<T>>,
    pump: RelayPump<T>,
    supervisor: Arc<Supervisor>,
}

impl<T: ChatTransport + ?Sized + 'static> HermodKernel<T> {
    /// Build every component from the configuration. Opens the identity store.
    pub fn boot(config: HermodConfig, transport: Arc<T>) -> KernelResult<Self> {
        config.validate()?;
        let identities = Arc::new(hermod_memory::open_store(&config.identity)?);
        Ok(Self::boot_with(
            config,
            transport,
            identities,
            Arc::new(LogPresenter),
        ))
    }

    /// Build with an already opened identity store and a custom login presenter.
    pub fn boot_with(
        config: HermodConfig,
        transport: Arc<T>,
        identities: Arc<IdentityStore>,
        presenter: Arc<dyn LoginPresenter>,
    ) -> Self {
        let started_at = Utc::now().timestamp().max(0) as u64;
        let fanout = Arc::new(Fanout::from_config(&config));
        let dispatcher = Arc::new(InboundDispatcher::new(
            transport.clone(),
            identities.clone(),
            fanout,
            DispatchConfig::from_config(&config),
            started_at,
        ));

        let (bp_tx, bp_rx) = backpressure::channel();
        let connection = Arc::new(ConnectionManager::new(
            transport.clone(),
            SessionStore::new(&config.session.path),
            bp_tx,
            Duration::from_secs(config.relay.reconnect_wait_secs),
            presenter,
        ));
        let pump = RelayPump::new(transport.clone(), PumpConfig::from_config(&config), bp_rx);

        info!(
            conversation = %config.conversation_id,
            started_at,
            "Hermod kernel booted"
        );
        Self {
            config,
            transport,
            identities,
            dispatcher,
            connection,
            pump,
            supervisor: Arc::new(Supervisor::new()),
        }
    }

    pub fn config(&self) -> &HermodConfig {
        &self.config
    }

    pub fn identities(&self) -> Arc<IdentityStore> {
        self.identities.clone()
    }

    pub fn supervisor(&self) -> Arc<Supervisor> {
        self.supervisor.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Authenticate, then bridge until `shutdown` resolves.
    ///
    /// On shutdown the relay pump finishes its current line, the transport is
    /// disconnected and the final session persisted. A failed restore after a
    /// connection failure ends the run with an error and no disconnect.
    pub async fn run<F>(self, shutdown: F) -> KernelResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut events = self
            .transport
            .events()
            .await
            .map_err(|e| HermodError::Transport(e.to_string()))?;

        self.connection.connect().await?;

        let pump = tokio::spawn(self.pump.run(self.supervisor.subscribe()));
        let (fatal_tx, mut fatal_rx) = mpsc::channel::<KernelError>(1);
        let mut events_open = true;
        tokio::pin!(shutdown);

        info!("Bridge running");
        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down now");
                    break Ok(());
                }
                Some(fatal) = fatal_rx.recv() => {
                    break Err(fatal);
                }
                event = events.next(), if events_open => match event {
                    Some(TransportEvent::Message(event)) => {
                        let outcome = self.dispatcher.dispatch(event).await;
                        debug!(?outcome, "Event dispatched");
                    }
                    Some(TransportEvent::Error(err)) => {
                        let connection = self.connection.clone();
                        let supervisor = self.supervisor.clone();
                        let fatal_tx = fatal_tx.clone();
                        tokio::spawn(async move {
                            match connection.handle_error(err).await {
                                Ok(true) => supervisor.record_reconnect(),
                                Ok(false) => {}
                                Err(e) => {
                                    let _ = fatal_tx.send(e).await;
                                }
                            }
                        });
                    }
                    None => {
                        warn!("Transport event stream ended");
                        events_open = false;
                    }
                },
            }
        };

        self.supervisor.shutdown();
        if let Err(e) = pump.await {
            warn!(error = %e, "Relay pump task failed");
        }

        match outcome {
            Ok(()) => {
                self.connection.shutdown().await?;
                info!("Session saved, bye");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Bridge stopped");
                Err(e)
            }
        }
    }
}
