//! Requests waiting on a moderator decision.

use std::collections::BTreeMap;

use housie_protocol::{ChannelId, RequestId};
use housie_ticket::{Evidence, WinCondition};

/// A participant's request for more tickets.
#[derive(Debug, Clone)]
pub(crate) struct TicketRequest {
    pub player: String,
    pub channel: ChannelId,
    pub count: u32,
}

/// A claim that validated and now waits for the moderator.
#[derive(Debug, Clone)]
pub(crate) struct PendingClaim {
    pub player: String,
    pub channel: ChannelId,
    pub condition: WinCondition,
    pub evidence: Evidence,
}

/// Something a pending item remembers its requester by.
pub(crate) trait Requested {
    fn channel(&self) -> ChannelId;
}

impl Requested for TicketRequest {
    fn channel(&self) -> ChannelId {
        self.channel
    }
}

impl Requested for PendingClaim {
    fn channel(&self) -> ChannelId {
        self.channel
    }
}

/// Pending items keyed by a room-local, never-reused [`RequestId`].
///
/// [`take`](Self::take) removes the item, so a second resolution of the
/// same id finds nothing.
#[derive(Debug)]
pub(crate) struct Pending<T> {
    next_id: u64,
    items: BTreeMap<RequestId, T>,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            items: BTreeMap::new(),
        }
    }
}

impl<T: Requested> Pending<T> {
    pub fn push(&mut self, item: T) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, item);
        id
    }

    pub fn take(&mut self, id: RequestId) -> Option<T> {
        self.items.remove(&id)
    }

    /// Everything still pending, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (RequestId, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    /// Drops everything `channel` asked for. Returns how many went.
    pub fn purge_channel(&mut self, channel: ChannelId) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| item.channel() != channel);
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
