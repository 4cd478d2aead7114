//! Chorus chat server.
//!
//! Accepts many concurrent TCP clients, reads typed messages from each and
//! fans chat lines out to every connected client while keeping a chat log.
//!
//! # Architecture
//!
//! - [`Registry`]: the set of sessions eligible for broadcast, behind one lock
//! - [`Session`]: one connected client and the write half of its transport
//! - [`Dispatcher`]: what each message does (broadcast, list, replay, logout)
//! - Listener: accepts connections, performs the username handshake and runs
//!   one processing unit per session
//! - [`LogSink`] / [`EventSink`]: injected destinations for the chat log and
//!   for operational status lines
//!
//! [`Server`] ties these together on Tokio; [`ServerHandle::stop`] shuts it
//! down from any task.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatcher;
mod env;
mod error;
mod event;
mod listener;
pub mod log;
mod registry;
mod session;

use std::{net::SocketAddr, sync::Arc};

pub use dispatcher::{Dispatcher, Flow, RULE};
pub use env::{Environment, SystemEnv};
pub use error::ServerError;
pub use event::{EventSink, MemoryEventSink, TracingEventSink};
pub use log::{ChaoticLog, LogError, LogSink, MemoryLog, RedbLog};
pub use registry::{Registry, RegistryError};
pub use session::{CLOSE_TIMEOUT, DeliveryError, SEND_TIMEOUT, Session, SessionError, SessionId, SessionState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Default TCP port, as in `chorus-server` with no arguments.
pub const DEFAULT_PORT: u16 = 8700;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:8700")
    pub bind_address: String,
    /// Clear the chat log before listening
    pub reset_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: format!("0.0.0.0:{DEFAULT_PORT}"), reset_log: true }
    }
}

/// Stops a running [`Server`].
///
/// Cheap to clone and safe to use from any task.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    cancel: CancellationToken,
}

impl ServerHandle {
    /// Ask the server to stop. Idempotent.
    ///
    /// The accept loop returns promptly and every session is closed, even
    /// mid-broadcast.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether [`ServerHandle::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Bound chat server.
pub struct Server<L: LogSink, E: Environment> {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<L, E>>,
    env: E,
    cancel: CancellationToken,
}

impl<L: LogSink, E: Environment> Server<L, E> {
    /// Bind the listening socket.
    ///
    /// Clears `log` first when `config.reset_log` is set; a failed clear is
    /// reported and ignored.
    pub async fn bind(
        config: ServerConfig,
        log: L,
        events: Arc<dyn EventSink>,
        env: E,
    ) -> Result<Self, ServerError> {
        if config.reset_log
            && let Err(e) = log.clear()
        {
            tracing::warn!("failed to reset chat log: {e}");
        }

        let listener = TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| ServerError::Config(format!("cannot bind {}: {e}", config.bind_address)))?;

        let dispatcher = Arc::new(Dispatcher::new(Registry::new(), log, events, env.clone()));

        Ok(Self { listener, dispatcher, env, cancel: CancellationToken::new() })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server once it runs.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle { cancel: self.cancel.clone() }
    }

    /// The live registry.
    pub fn registry(&self) -> Registry {
        self.dispatcher.registry().clone()
    }

    /// Accept and serve clients until stopped.
    ///
    /// Returns once every session has been closed and its processing unit
    /// has exited.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server listening on {}", self.local_addr()?);
        listener::serve(self.listener, self.dispatcher, self.env, self.cancel).await
    }
}
