//! Unified error type for the Housie server.

use housie_protocol::ProtocolError;
use housie_room::RoomError;
use housie_ticket::TicketError;
use housie_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HousieError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Building the ticket pool failed.
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// A room-level error.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A configuration value couldn't be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ChannelClosed("gone".into());
        let housie_err: HousieError = err.into();
        assert!(matches!(housie_err, HousieError::Transport(_)));
        assert!(housie_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let housie_err: HousieError = err.into();
        assert!(matches!(housie_err, HousieError::Protocol(_)));
    }

    #[test]
    fn test_from_ticket_error() {
        let housie_err: HousieError = TicketError::Generation { attempts: 10 }.into();
        assert!(matches!(housie_err, HousieError::Ticket(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound("claim 3".into());
        let housie_err: HousieError = err.into();
        assert!(matches!(housie_err, HousieError::Room(_)));
        assert_eq!(housie_err.to_string(), "claim 3 not found");
    }

    #[test]
    fn test_config_error_message() {
        let err = HousieError::Config("HOUSIE_POOL_SIZE: not a number".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: HOUSIE_POOL_SIZE: not a number"
        );
    }
}
