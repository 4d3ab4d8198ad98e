//! `HousieServer` builder and server loop.
//!
//! This is the entry point for running a Housie server. It ties together
//! all the layers: transport → protocol → room registry → room actors.

use std::sync::Arc;
use std::time::Duration;

use housie_protocol::{Codec, JsonCodec};
use housie_room::{RoomConfig, RoomRegistry};
use housie_ticket::{LayoutGenerator, TicketPool};
use housie_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{HousieError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry locks its own index and never across an `.await`.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomRegistry,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Housie server.
///
/// # Example
///
/// ```rust,no_run
/// use housie::prelude::*;
///
/// # async fn run() -> Result<(), HousieError> {
/// let server = HousieServer::builder()
///     .bind("0.0.0.0:8080")
///     .pool_size(1200)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct HousieServerBuilder {
    config: ServerConfig,
}

impl HousieServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how many grids the shared pool starts with.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the defaults every room falls back to.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Builds the ticket pool, binds the listener, and returns a server
    /// ready to [`run`](HousieServer::run).
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<HousieServer<JsonCodec>, HousieError> {
        let ServerConfig {
            bind_addr,
            pool_size,
            idle_timeout,
            room,
        } = self.config;

        let pool = TicketPool::generate(pool_size, &LayoutGenerator::new(), &mut rand::rng())?;
        let transport = WebSocketTransport::bind(&bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: RoomRegistry::new(pool.shared(), room),
            codec: JsonCodec,
            idle_timeout,
        });

        Ok(HousieServer { transport, state })
    }
}

impl Default for HousieServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Housie server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HousieServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl HousieServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> HousieServerBuilder {
        HousieServerBuilder::new()
    }
}

impl<C: Codec> HousieServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted channel. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), HousieError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Housie server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "channel ended with error");
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
