//! # Housie
//!
//! A multi-room housie (tambola) game server.
//!
//! A moderator opens a room, participants join it by code and ask for
//! tickets, numbers are called by hand or on a timer, and claims are
//! checked against the called numbers before the moderator confirms them.
//! Every room runs as its own actor; all rooms draw tickets from one
//! shared, pre-built pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use housie::prelude::*;
//!
//! # async fn run() -> Result<(), HousieError> {
//! let server = HousieServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::HousieError;
pub use server::{HousieServer, HousieServerBuilder};

pub mod prelude {
    pub use crate::{HousieError, HousieServer, HousieServerBuilder, ServerConfig};
    pub use housie_protocol::{
        Ack, AckData, ClientFrame, ClientRequest, DrawMode, ErrorCode, GameSettings,
        PrizeSetting, RequestId, Role, RoomCode, RoomState, ServerEvent, ServerFrame,
    };
    pub use housie_room::RoomConfig;
    pub use housie_ticket::WinCondition;
}
