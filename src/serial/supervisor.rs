//! # Supervisor Module
//!
//! Owns the connection lifecycle: open the port, run a reader for it, and
//! reopen after the connection is lost.
//!
//! ```text
//! Disconnected ──▶ Connecting ──▶ Connected
//!      ▲               │              │
//!      └── backoff ◀───┴── I/O error ─┘
//! ```
//!
//! Shutdown from any state stops the reader and returns.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{Duration, sleep, timeout};

use super::port::Connector;
use super::reader::{Generation, ReaderContext, ReaderExit, ReaderHandle, spawn_reader};
use crate::command::Dispatcher;
use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Connection state published to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "DISCONNECTED"),
            ConnectionState::Connecting => write!(f, "CONNECTING"),
            ConnectionState::Connected => write!(f, "CONNECTED"),
        }
    }
}

/// What ended a connected session.
enum SessionEnd {
    Shutdown,
    Lost,
    Glitch,
}

pub struct Supervisor<C: Connector> {
    connector: C,
    dispatcher: Dispatcher,
    config: BridgeConfig,
    generation: Generation,
    state: watch::Sender<ConnectionState>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, dispatcher: Dispatcher, config: BridgeConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            dispatcher,
            config,
            generation: Generation::default(),
            state,
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Shared generation counter; bumps on every successful connect.
    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Connection state {} -> {}", previous, state);
        }
    }

    /// Run until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.set_state(ConnectionState::Connecting);
            info!("Attempting to connect to {}...", self.connector.target());

            let attempt = tokio::select! {
                _ = &mut shutdown => None,
                result = self.connector.connect() => Some(result),
            };
            let Some(result) = attempt else {
                break;
            };

            let delay = match result {
                Ok(stream) => {
                    let reader = self.start_reader(stream);
                    self.set_state(ConnectionState::Connected);
                    match self.supervise(reader, &mut shutdown).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Lost => self.config.reconnect_delay,
                        SessionEnd::Glitch => self.config.transient_delay,
                    }
                }
                Err(e) if e.is_transport() => {
                    warn!(
                        "Connection failed with {}: {}. Retrying in {:?}...",
                        self.connector.target(),
                        e,
                        self.config.reconnect_delay
                    );
                    self.config.reconnect_delay
                }
                Err(e) => {
                    error!("Unexpected error: {}", e);
                    self.config.transient_delay
                }
            };

            self.set_state(ConnectionState::Disconnected);
            if pause(delay, &mut shutdown).await {
                break;
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Exiting program.");
    }

    fn start_reader(&self, stream: C::Stream) -> ReaderHandle {
        let id = self.generation.advance();
        let ctx = ReaderContext {
            dispatcher: self.dispatcher.clone(),
            generation: self.generation.clone(),
            buffer_size: self.config.read_buffer_size,
            transient_delay: self.config.transient_delay,
        };
        spawn_reader(stream, id, ctx)
    }

    /// Wait for the reader to end or for shutdown.
    async fn supervise<F>(&self, mut reader: ReaderHandle, shutdown: &mut Pin<&mut F>) -> SessionEnd
    where
        F: Future<Output = ()>,
    {
        let exit = tokio::select! {
            _ = shutdown.as_mut() => None,
            exit = &mut reader.join => Some(exit),
        };

        match exit {
            None => {
                self.stop_reader(reader).await;
                SessionEnd::Shutdown
            }
            Some(Ok(ReaderExit::Disconnected(e))) => {
                warn!(
                    "Connection lost with {}: {}. Retrying in {:?}...",
                    self.connector.target(),
                    e,
                    self.config.reconnect_delay
                );
                SessionEnd::Lost
            }
            Some(Ok(exit)) => {
                warn!("Reader {} ended unexpectedly: {:?}", reader.id, exit);
                SessionEnd::Glitch
            }
            Some(Err(e)) => {
                let e = BridgeError::unexpected(format!("reader {} failed: {}", reader.id, e));
                error!("{}", e);
                SessionEnd::Glitch
            }
        }
    }

    /// Retire the reader's generation, ask it to stop, and abort it if it
    /// does not finish within the grace period.
    async fn stop_reader(&self, mut reader: ReaderHandle) {
        self.generation.advance();
        reader.signal_stop();
        if timeout(self.config.stop_grace, &mut reader.join).await.is_err() {
            warn!("Reader {} did not stop in time, aborting", reader.id);
            reader.join.abort();
        }
    }
}

/// Sleep for `delay`; returns `true` if shutdown fired first.
async fn pause<F>(delay: Duration, shutdown: &mut Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = shutdown.as_mut() => true,
        _ = sleep(delay) => false,
    }
}
