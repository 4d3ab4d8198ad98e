//! The shared ticket pool and the allocation engine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::Rng;

use crate::{Grid, LayoutGenerator, Ticket, TicketBook, TicketError, TicketId};

/// The pool as shared between rooms. Lock it for exactly one allocation.
pub type SharedPool = Arc<Mutex<TicketPool>>;

/// A finite stock of pre-built grids, consumed front to back.
///
/// Grids leave the pool by move and are never put back, so no two
/// allocations can ever hand out the same grid instance.
#[derive(Debug, Default)]
pub struct TicketPool {
    grids: VecDeque<Grid>,
    next_serial: u64,
}

impl TicketPool {
    /// Pre-builds `size` grids.
    ///
    /// # Errors
    /// [`TicketError::Generation`] if any grid exhausts the generator's
    /// attempt budget.
    pub fn generate<R: Rng + ?Sized>(
        size: usize,
        generator: &LayoutGenerator,
        rng: &mut R,
    ) -> Result<Self, TicketError> {
        let grids = (0..size)
            .map(|_| generator.generate(rng))
            .collect::<Result<VecDeque<_>, _>>()?;
        tracing::info!(size, "ticket pool built");
        Ok(Self::from_grids(grids))
    }

    /// A pool over grids built elsewhere.
    pub fn from_grids(grids: impl IntoIterator<Item = Grid>) -> Self {
        Self {
            grids: grids.into_iter().collect(),
            next_serial: 1,
        }
    }

    /// Wraps the pool for sharing across rooms.
    pub fn shared(self) -> SharedPool {
        Arc::new(Mutex::new(self))
    }

    /// Grids still available.
    pub fn remaining(&self) -> usize {
        self.grids.len()
    }

    /// Moves `count` grids into `book`, tagging each for `room`.
    ///
    /// All-or-nothing: on error neither the pool nor the book changes.
    /// Returns the newly issued tickets.
    ///
    /// # Errors
    /// - [`TicketError::InvalidCount`]: `count` is zero
    /// - [`TicketError::CapacityExceeded`]: `book.issued() + count > cap`
    /// - [`TicketError::PoolExhausted`]: fewer than `count` grids left
    pub fn allocate(
        &mut self,
        room: &str,
        book: &mut TicketBook,
        cap: usize,
        count: usize,
    ) -> Result<Vec<Ticket>, TicketError> {
        if count == 0 {
            return Err(TicketError::InvalidCount);
        }
        let issued = book.issued();
        if issued + count > cap {
            return Err(TicketError::CapacityExceeded {
                issued,
                requested: count,
                cap,
            });
        }
        if self.grids.len() < count {
            return Err(TicketError::PoolExhausted {
                requested: count,
                remaining: self.grids.len(),
            });
        }

        let tickets: Vec<Ticket> = self
            .grids
            .drain(..count)
            .map(|grid| {
                let serial = self.next_serial;
                self.next_serial += 1;
                Ticket {
                    id: TicketId(format!("{room}-{}-{serial:05}", book.owner())),
                    grid,
                }
            })
            .collect();
        book.extend(tickets.iter().cloned());

        tracing::debug!(
            room,
            owner = book.owner(),
            count,
            remaining = self.grids.len(),
            "tickets allocated"
        );
        Ok(tickets)
    }
}
