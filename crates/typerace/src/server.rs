//! `RelayServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → registry. One
//! handler task per accepted connection, plus a process-wide sweep task
//! that evicts stale rooms on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use typerace_protocol::{Codec, JsonCodec};
use typerace_room::{RegistryConfig, RoomRegistry, unix_millis};
use typerace_transport::WebSocketListener;

use crate::RelayError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    /// The only shared mutable structure in the relay. Holds room
    /// handles, never room state — room mutations go through each
    /// room's own actor, so this lock is held only for lookups and
    /// registry bookkeeping.
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a relay server.
pub struct RelayServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            registry_config: RegistryConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the registry timing configuration.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Failure to bind is the one fatal error in the system — callers
    /// should propagate it and exit.
    pub async fn build(self) -> Result<RelayServer<JsonCodec>, RelayError> {
        let listener = WebSocketListener::bind(&self.bind_addr).await?;
        let sweep_interval = self.registry_config.sweep_interval;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.registry_config)),
            codec: JsonCodec,
        });

        Ok(RelayServer {
            listener,
            state,
            sweep_interval,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer<C: Codec> {
    listener: WebSocketListener,
    state: Arc<ServerState<C>>,
    sweep_interval: Duration,
}

impl<C: Codec + Clone> RelayServer<C> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the sweep task and the accept loop until the process exits.
    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("TypeRace relay running");

        spawn_sweeper(Arc::clone(&self.state), self.sweep_interval);

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Spawns the periodic room sweep.
///
/// Stale-room eviction is process-wide maintenance, not tied to any
/// connection's lifecycle: every interval, rooms past the retention
/// window vanish without a broadcast.
fn spawn_sweeper<C: Codec>(state: Arc<ServerState<C>>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick of a tokio interval fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.registry.lock().await.sweep(unix_millis()).await;
            if removed > 0 {
                tracing::info!(removed, "sweep removed stale rooms");
            }
        }
    });
}
