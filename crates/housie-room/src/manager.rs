//! Room registry: creates rooms, tracks which channel is in which room,
//! and routes requests to room actors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use housie_protocol::{AckData, ChannelId, JoinSnapshot, RoomCode};
use housie_ticket::SharedPool;

use crate::room::spawn_room;
use crate::{ChannelSender, RoomConfig, RoomError, RoomHandle, RoomInfo, RoomRequest};

/// Every room in the process, plus the channel → room index used for
/// authority checks and disconnect routing.
///
/// Rooms are never removed: a room's state outlives every connection to
/// it so the moderator and participants can come back by name.
///
/// The index sits behind a short sync lock that is never held across an
/// `.await`.
pub struct RoomRegistry {
    index: Mutex<Index>,
    pool: SharedPool,
    config: RoomConfig,
}

#[derive(Default)]
struct Index {
    rooms: HashMap<RoomCode, RoomHandle>,

    /// A channel is in at most ONE room at a time.
    channel_rooms: HashMap<ChannelId, RoomCode>,
}

impl Index {
    fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    fn ensure_free(&self, channel: ChannelId) -> Result<(), RoomError> {
        match self.channel_rooms.get(&channel) {
            Some(current) => Err(RoomError::InvalidState(format!(
                "{channel} is already in room {current}"
            ))),
            None => Ok(()),
        }
    }

    fn fresh_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code = RoomCode::generate(&mut rng);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

impl RoomRegistry {
    /// A registry whose rooms allocate from `pool` and fall back to
    /// `config` for anything `start-game` leaves out.
    pub fn new(pool: SharedPool, config: RoomConfig) -> Self {
        Self {
            index: Mutex::new(Index::default()),
            pool,
            config: config.validated(),
        }
    }

    fn index(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a room with `channel` bound as its moderator.
    ///
    /// The moderator's queue receives `room-created` before this returns.
    pub fn create_room(
        &self,
        admin_name: &str,
        channel: ChannelId,
        sender: ChannelSender,
    ) -> Result<RoomCode, RoomError> {
        let admin_name = admin_name.trim();
        if admin_name.is_empty() {
            return Err(RoomError::BadRequest("admin_name must not be empty".into()));
        }
        let mut index = self.index();
        index.ensure_free(channel)?;

        let code = index.fresh_code();
        let handle = spawn_room(
            code.clone(),
            admin_name.to_string(),
            channel,
            sender,
            self.config.clone(),
            Arc::clone(&self.pool),
        );
        index.rooms.insert(code.clone(), handle);
        index.channel_rooms.insert(channel, code.clone());

        tracing::info!(room = %code, admin = %admin_name, %channel, rooms = index.rooms.len(), "room created");
        Ok(code)
    }

    /// Joins `channel` to the room `code` under `name`.
    ///
    /// The channel's index entry is reserved before the room is asked,
    /// so a concurrent join from the same channel fails fast, and is
    /// released again if the room refuses.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        name: &str,
        channel: ChannelId,
        sender: ChannelSender,
    ) -> Result<JoinSnapshot, RoomError> {
        let handle = self.reserve(channel, code)?;
        match handle.join(channel, name.to_string(), sender).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                self.release(channel, code);
                Err(e)
            }
        }
    }

    fn reserve(&self, channel: ChannelId, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        let mut index = self.index();
        index.ensure_free(channel)?;
        let handle = index.handle(code)?;
        index.channel_rooms.insert(channel, code.clone());
        Ok(handle)
    }

    fn release(&self, channel: ChannelId, code: &RoomCode) {
        let mut index = self.index();
        if index.channel_rooms.get(&channel) == Some(code) {
            index.channel_rooms.remove(&channel);
        }
    }

    /// Sends `request` from `channel` to room `code`.
    pub async fn route(
        &self,
        channel: ChannelId,
        code: &RoomCode,
        request: RoomRequest,
    ) -> Result<AckData, RoomError> {
        self.member_handle(channel, code)?
            .request(channel, request)
            .await
    }

    /// Detaches `channel` from whatever room it's in and returns that
    /// room's code. `None` for a channel that never joined.
    pub async fn disconnect(&self, channel: ChannelId) -> Option<RoomCode> {
        let (code, handle) = {
            let mut index = self.index();
            let code = index.channel_rooms.remove(&channel)?;
            let handle = index.rooms.get(&code).cloned()?;
            (code, handle)
        };
        if let Err(e) = handle.disconnect(channel).await {
            tracing::debug!(room = %code, %channel, error = %e, "disconnect not delivered");
        }
        Some(code)
    }

    /// Current metadata of room `code`.
    pub async fn room_status(&self, code: &RoomCode) -> Result<RoomInfo, RoomError> {
        self.handle(code)?.info().await
    }

    /// A clone of room `code`'s handle.
    pub fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.index().handle(code)
    }

    /// A clone of room `code`'s handle, provided `channel` has joined it.
    pub fn member_handle(&self, channel: ChannelId, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        let index = self.index();
        let handle = index.handle(code)?;
        if index.channel_rooms.get(&channel) != Some(code) {
            return Err(RoomError::Unauthorized(format!(
                "{channel} has not joined room {code}"
            )));
        }
        Ok(handle)
    }

    pub fn room_count(&self) -> usize {
        self.index().rooms.len()
    }

    /// Grids left in the shared ticket pool.
    pub fn pool_remaining(&self) -> usize {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remaining()
    }
}
