//! Allocated tickets and a participant's ticket book.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Grid;

/// Globally unique identity of one allocated ticket instance.
///
/// Grid contents can repeat across rooms; the tag
/// `<room>-<participant>-<serial>` never does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A grid that has been handed to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub grid: Grid,
}

/// One participant's tickets in one room, in assignment order.
///
/// Only [`TicketPool::allocate`](crate::TicketPool::allocate) appends to a
/// book, so `issued()` is exactly what the per-player cap is checked
/// against.
#[derive(Debug, Clone, Default)]
pub struct TicketBook {
    owner: String,
    tickets: Vec<Ticket>,
}

impl TicketBook {
    /// An empty book for `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            tickets: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Tickets issued so far.
    pub fn issued(&self) -> usize {
        self.tickets.len()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub(crate) fn extend(&mut self, tickets: impl IntoIterator<Item = Ticket>) {
        self.tickets.extend(tickets);
    }
}
