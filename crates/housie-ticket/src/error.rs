//! Error types for ticket generation, allocation, and claims.

/// Errors raised by the ticket layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    /// A grid broke one of the layout rules.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Allocating would push a participant past the room's per-player cap.
    #[error("ticket cap exceeded: {issued} issued + {requested} requested > cap {cap}")]
    CapacityExceeded {
        issued: usize,
        requested: usize,
        cap: usize,
    },

    /// The pool holds fewer grids than requested.
    #[error("ticket pool exhausted: {requested} requested, {remaining} remaining")]
    PoolExhausted { requested: usize, remaining: usize },

    /// The layout generator ran out of attempts.
    #[error("could not generate a valid grid in {attempts} attempts")]
    Generation { attempts: u32 },

    /// A ticket request asked for zero tickets.
    #[error("ticket count must be at least 1")]
    InvalidCount,

    /// The claim names a win condition that doesn't exist.
    #[error("unknown claim type: {0}")]
    UnknownClaimType(String),
}
