//! Tickets for Housie: the grids participants play on and the rules that
//! decide when a grid wins.
//!
//! # Key types
//!
//! - [`Grid`]: an immutable, rule-valid 3×9 layout of 15 numbers
//! - [`LayoutGenerator`]: builds random grids with a bounded retry budget
//! - [`TicketPool`]: finite stock of pre-built grids, consumed on allocation
//! - [`TicketBook`]: one participant's ordered tickets in one room
//! - [`WinCondition`] / [`validate`]: claim checking against called numbers
//!
//! Nothing in this crate knows about rooms, channels, or time. Every
//! function is deterministic given its inputs (and the RNG passed in), so
//! claims can be replayed from room state.

mod claim;
mod error;
mod grid;
mod layout;
mod pool;
mod ticket;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod tests_props_claim;

pub use claim::{ClaimOutcome, Evidence, WinCondition, validate};
pub use error::TicketError;
pub use grid::{
    COLUMNS, Grid, MAX_NUMBER, MAX_PER_COLUMN, NUMBERS_PER_GRID, NUMBERS_PER_ROW, ROWS,
    column_range,
};
pub use layout::LayoutGenerator;
pub use pool::{SharedPool, TicketPool};
pub use ticket::{Ticket, TicketBook, TicketId};
