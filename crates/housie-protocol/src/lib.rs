//! Wire protocol for Housie.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientFrame`], [`ServerFrame`], [`ServerEvent`], etc.):
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! # Architecture
//!
//! The protocol sits between the transport (raw bytes) and the rooms
//! (game rules). It knows nothing about connections or game state
//! beyond the shapes it serializes.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientFrame) → Room (commands)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, MAX_FRAME_LEN};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use housie_transport::ChannelId;
pub use types::{
    Ack, AckData, CallSource, ClaimStatus, ClientFrame, ClientRequest, DrawMode, ErrorBody,
    ErrorCode, FinishReason, GameSettings, JoinSnapshot, PauseReason, PlayerSummary,
    PrizeSetting, PrizeStatus, RequestId, Role, RoomCode, RoomState, ServerEvent, ServerFrame,
    WinnerRecord,
};
