//! Channel transport for Housie.
//!
//! A *channel* is one persistent, bidirectional connection to a client
//! (a moderator's console or a participant's ticket screen). The room
//! layer never touches sockets; it only sees [`ChannelId`] handles and
//! the [`Transport`] / [`Connection`] traits defined here.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket channels via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque handle for one connected channel.
///
/// Rooms bind moderators and participants to these handles; when a
/// channel drops, the handle is how the registry finds what to clean up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Creates a new `ChannelId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Accepts new incoming channels.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming channel.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single channel that can send and receive frames.
///
/// `send` and `recv` may be called concurrently from different tasks:
/// a reader task waits on `recv` while a writer task flushes room
/// broadcasts through `send`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the channel is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the channel.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the handle identifying this channel.
    fn id(&self) -> ChannelId;
}
