//! Game rooms for Housie.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its own
//! lifecycle state, called numbers, prize table, participants, pending
//! requests, and draw timer.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, tracks channels, routes requests
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRequest`]: the room-scoped operations
//! - [`CallEngine`]: called vs available numbers
//! - [`PrizeBoard`]: active conditions, caps, and winners
//! - [`RoomConfig`]: per-room defaults

mod calls;
mod config;
mod error;
mod manager;
mod pending;
mod prizes;
mod room;

pub use calls::CallEngine;
pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomRegistry;
pub use prizes::PrizeBoard;
pub use room::{ChannelSender, RoomHandle, RoomInfo, RoomRequest};
