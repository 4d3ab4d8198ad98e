//! Error types for the room layer.

use housie_protocol::{ErrorCode, RoomCode};
use housie_ticket::TicketError;

/// Errors that can occur during room operations.
///
/// Every variant maps onto one wire [`ErrorCode`] via [`RoomError::code`].
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this code exists.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// A pending request, claim, or participant is unknown (or was
    /// already resolved).
    #[error("{0} not found")]
    NotFound(String),

    /// The caller isn't allowed to do this.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// A prize is inactive or its winner cap is full.
    #[error("{0}")]
    Capacity(String),

    /// A claim that doesn't hold, or a duplicate.
    #[error("{0}")]
    Validation(String),

    /// Malformed input: out-of-range number, empty name, zero cap.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Allocation, generation, or claim-name parsing failed.
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The wire error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound(_) | Self::NotFound(_) => ErrorCode::NotFound,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Capacity(_) => ErrorCode::CapacityError,
            Self::Validation(_) => ErrorCode::ValidationFailure,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::Unavailable(_) => ErrorCode::Unavailable,
            Self::Ticket(e) => match e {
                TicketError::CapacityExceeded { .. } => ErrorCode::CapacityError,
                TicketError::PoolExhausted { .. } => ErrorCode::PoolExhausted,
                TicketError::Generation { .. } => ErrorCode::GenerationError,
                TicketError::InvalidCount => ErrorCode::BadRequest,
                TicketError::UnknownClaimType(_) => ErrorCode::UnknownClaimType,
                TicketError::InvalidGrid(_) => ErrorCode::ValidationFailure,
            },
        }
    }
}
