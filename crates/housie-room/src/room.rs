//! Room actor: an isolated Tokio task that owns one game room.
//!
//! Each room runs in its own task and talks to the outside world through
//! a bounded mpsc channel. Commands and draw-timer firings are handled
//! one at a time, to completion, so nothing inside the actor needs a lock
//! except the ticket pool shared with every other room.

use std::collections::{BTreeMap, HashMap};
use std::sync::PoisonError;
use std::time::Duration;

use housie_protocol::{
    AckData, CallSource, ChannelId, ClaimStatus, ClientRequest, DrawMode, FinishReason,
    GameSettings, JoinSnapshot, PauseReason, PlayerSummary, RequestId, Role, RoomCode,
    RoomState, ServerEvent, ServerFrame, WinnerRecord,
};
use housie_ticket::{
    ClaimOutcome, Evidence, SharedPool, TicketBook, TicketError, WinCondition, validate,
};
use housie_timer::{DrawTick, DrawTimer};
use tokio::sync::{mpsc, oneshot};

use crate::calls::CallEngine;
use crate::pending::{Pending, PendingClaim, TicketRequest};
use crate::prizes::PrizeBoard;
use crate::{RoomConfig, RoomError};

/// Outbound queue of one channel. The connection's writer task drains it
/// in order, so events and acks for a channel never overtake each other.
pub type ChannelSender = mpsc::UnboundedSender<ServerFrame>;

/// Who an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recipient {
    /// Every channel attached to the room.
    Room,
    /// The bound moderator channel, if any.
    Moderator,
    Channel(ChannelId),
}

/// A room-scoped operation, with the room code already stripped off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRequest {
    StartGame(GameSettings),
    CallNext,
    ToggleNumber(u8),
    Pause,
    Resume,
    Stop,
    RequestTicket { count: u32 },
    ApproveTicket { request_id: RequestId, approve: bool },
    SubmitClaim { claim_type: String },
    VerifyClaim { claim_id: RequestId, approve: bool },
}

impl RoomRequest {
    /// Splits a client request into the room it targets and the command
    /// for that room. Requests that aren't room-scoped come back as `Err`.
    pub fn from_client(request: ClientRequest) -> Result<(RoomCode, Self), ClientRequest> {
        use ClientRequest as C;
        let split = match request {
            C::StartGame {
                room_code,
                settings,
            } => (room_code, Self::StartGame(settings)),
            C::ManualCallNext { room_code } => (room_code, Self::CallNext),
            C::AdminToggleNumber { room_code, number } => (room_code, Self::ToggleNumber(number)),
            C::PauseAuto { room_code } => (room_code, Self::Pause),
            C::ResumeAuto { room_code } => (room_code, Self::Resume),
            C::StopGame { room_code } => (room_code, Self::Stop),
            C::RequestTicket { room_code, count } => (room_code, Self::RequestTicket { count }),
            C::ApproveTicket {
                room_code,
                request_id,
                approve,
            } => (room_code, Self::ApproveTicket {
                request_id,
                approve,
            }),
            C::SubmitClaim {
                room_code,
                claim_type,
            } => (room_code, Self::SubmitClaim { claim_type }),
            C::VerifyClaim {
                room_code,
                claim_id,
                approve,
            } => (room_code, Self::VerifyClaim { claim_id, approve }),
            other => return Err(other),
        };
        Ok(split)
    }

    fn op(&self) -> &'static str {
        match self {
            Self::StartGame(_) => "start-game",
            Self::CallNext => "manual-call-next",
            Self::ToggleNumber(_) => "admin-toggle-number",
            Self::Pause => "pause-auto",
            Self::Resume => "resume-auto",
            Self::Stop => "stop-game",
            Self::RequestTicket { .. } => "request-ticket",
            Self::ApproveTicket { .. } => "approve-ticket",
            Self::SubmitClaim { .. } => "submit-claim",
            Self::VerifyClaim { .. } => "verify-claim",
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// Every variant carries a `oneshot` reply channel: the caller sends the
/// command and waits for the actor's answer.
pub(crate) enum RoomCommand {
    Join {
        channel: ChannelId,
        name: String,
        sender: ChannelSender,
        reply: oneshot::Sender<Result<JoinSnapshot, RoomError>>,
    },
    Request {
        channel: ChannelId,
        request: RoomRequest,
        reply: oneshot::Sender<Result<AckData, RoomError>>,
    },
    Disconnect {
        channel: ChannelId,
        reply: oneshot::Sender<()>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub state: RoomState,
    pub draw_mode: DrawMode,
    /// Participants currently attached.
    pub players: usize,
    pub moderator_connected: bool,
    pub called: usize,
    pub pending_ticket_requests: usize,
    pub pending_claims: usize,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room code.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Attaches `channel` under `name`, as moderator or participant.
    pub async fn join(
        &self,
        channel: ChannelId,
        name: String,
        sender: ChannelSender,
    ) -> Result<JoinSnapshot, RoomError> {
        self.call(|reply| RoomCommand::Join {
            channel,
            name,
            sender,
            reply,
        })
        .await?
    }

    /// Runs one room-scoped operation on behalf of `channel`.
    pub async fn request(
        &self,
        channel: ChannelId,
        request: RoomRequest,
    ) -> Result<AckData, RoomError> {
        self.call(|reply| RoomCommand::Request {
            channel,
            request,
            reply,
        })
        .await?
    }

    /// Tells the room `channel` is gone. Resolves once the room has
    /// processed the disconnect.
    pub async fn disconnect(&self, channel: ChannelId) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Disconnect { channel, reply })
            .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.call(|reply| RoomCommand::GetInfo { reply }).await
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

#[cfg(test)]
impl RoomHandle {
    /// A handle whose room never answers. Commands pile up in the
    /// returned receiver.
    pub(crate) fn unanswered(code: RoomCode) -> (Self, mpsc::Receiver<RoomCommand>) {
        let (sender, receiver) = mpsc::channel(8);
        (Self { code, sender }, receiver)
    }
}

/// What an attached channel is to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Moderator,
    Participant(String),
}

struct Subscriber {
    sender: ChannelSender,
    binding: Binding,
}

/// A participant survives disconnects: the name keeps its tickets and
/// counts against the cap until it re-attaches.
struct Participant {
    channel: Option<ChannelId>,
    book: TicketBook,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    config: RoomConfig,
    state: RoomState,
    admin_name: String,
    moderator: Option<ChannelId>,
    draw_mode: DrawMode,
    max_tickets: u32,
    calls: CallEngine,
    prizes: PrizeBoard,
    participants: BTreeMap<String, Participant>,
    subscribers: HashMap<ChannelId, Subscriber>,
    ticket_requests: Pending<TicketRequest>,
    claims: Pending<PendingClaim>,
    timer: DrawTimer,
    pool: SharedPool,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs until every handle to the room is dropped.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_command(cmd);
                }
                tick = self.timer.wait_for_draw() => self.on_timer(tick),
            }
        }

        tracing::info!(room = %self.code, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                channel,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(channel, &name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Request {
                channel,
                request,
                reply,
            } => {
                let op = request.op();
                let result = self.handle_request(channel, request);
                if let Err(e) = &result {
                    tracing::debug!(room = %self.code, %channel, op, error = %e, "request failed");
                }
                let _ = reply.send(result);
            }
            RoomCommand::Disconnect { channel, reply } => {
                self.handle_disconnect(channel);
                let _ = reply.send(());
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    fn handle_request(
        &mut self,
        channel: ChannelId,
        request: RoomRequest,
    ) -> Result<AckData, RoomError> {
        let op = request.op();
        match request {
            RoomRequest::StartGame(settings) => {
                self.require_moderator(channel, op)?;
                self.start_game(settings)
            }
            RoomRequest::CallNext => {
                self.require_moderator(channel, op)?;
                self.call_next()
            }
            RoomRequest::ToggleNumber(number) => {
                self.require_moderator(channel, op)?;
                self.toggle_number(number)
            }
            RoomRequest::Pause => {
                self.require_moderator(channel, op)?;
                self.pause_auto()
            }
            RoomRequest::Resume => {
                self.require_moderator(channel, op)?;
                self.resume_auto()
            }
            RoomRequest::Stop => {
                self.require_moderator(channel, op)?;
                self.stop_game()
            }
            RoomRequest::RequestTicket { count } => {
                let player = self.require_participant(channel, op)?;
                self.request_ticket(player, channel, count)
            }
            RoomRequest::ApproveTicket {
                request_id,
                approve,
            } => {
                self.require_moderator(channel, op)?;
                self.approve_ticket(request_id, approve)
            }
            RoomRequest::SubmitClaim { claim_type } => {
                let player = self.require_participant(channel, op)?;
                self.submit_claim(player, channel, &claim_type)
            }
            RoomRequest::VerifyClaim { claim_id, approve } => {
                self.require_moderator(channel, op)?;
                self.verify_claim(claim_id, approve)
            }
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    fn handle_join(
        &mut self,
        channel: ChannelId,
        name: &str,
        sender: ChannelSender,
    ) -> Result<JoinSnapshot, RoomError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::BadRequest("name must not be empty".into()));
        }
        if self.subscribers.contains_key(&channel) {
            return Err(RoomError::InvalidState(format!(
                "{channel} already joined room {}",
                self.code
            )));
        }

        if name == self.admin_name {
            if let Some(bound) = self.moderator {
                return Err(RoomError::InvalidState(format!(
                    "moderator is already connected on {bound}"
                )));
            }
            self.moderator = Some(channel);
            self.subscribers.insert(channel, Subscriber {
                sender,
                binding: Binding::Moderator,
            });
            tracing::info!(
                room = %self.code,
                %channel,
                ticket_requests = self.ticket_requests.len(),
                claims = self.claims.len(),
                "moderator rejoined"
            );
            self.replay_pending();
            return Ok(self.snapshot(Role::Moderator, None));
        }

        let participant = self
            .participants
            .entry(name.to_string())
            .or_insert_with(|| Participant {
                channel: None,
                book: TicketBook::new(name),
            });
        if let Some(bound) = participant.channel {
            return Err(RoomError::InvalidState(format!(
                "{name} is already connected on {bound}"
            )));
        }
        participant.channel = Some(channel);
        let tickets = participant.book.issued();
        self.subscribers.insert(channel, Subscriber {
            sender,
            binding: Binding::Participant(name.to_string()),
        });

        tracing::info!(room = %self.code, %channel, player = %name, tickets, "player joined");
        self.send(Recipient::Room, ServerEvent::PlayerJoined {
            name: name.to_string(),
        });
        self.send(Recipient::Room, ServerEvent::PlayerListUpdated {
            players: self.player_list(),
        });
        Ok(self.snapshot(Role::Participant, Some(name)))
    }

    /// Re-queues every undecided ticket request and claim to the bound
    /// moderator, oldest first.
    fn replay_pending(&self) {
        for (request_id, request) in self.ticket_requests.iter() {
            self.send(Recipient::Moderator, ServerEvent::TicketRequested {
                request_id,
                player: request.player.clone(),
                count: request.count,
            });
        }
        for (claim_id, claim) in self.claims.iter() {
            self.send(Recipient::Moderator, ServerEvent::ClaimSubmitted {
                claim_id,
                player: claim.player.clone(),
                claim_type: claim.condition,
                evidence: claim.evidence.clone(),
            });
        }
    }

    fn handle_disconnect(&mut self, channel: ChannelId) {
        let Some(subscriber) = self.subscribers.remove(&channel) else {
            return;
        };
        match subscriber.binding {
            Binding::Moderator => {
                self.moderator = None;
                tracing::info!(room = %self.code, %channel, state = %self.state, "moderator disconnected");
                if self.draw_mode == DrawMode::Timed && self.state == RoomState::Running {
                    if let Err(e) = self.pause(PauseReason::ModeratorDisconnected) {
                        tracing::warn!(room = %self.code, error = %e, "auto-pause failed");
                    }
                }
                self.send(Recipient::Room, ServerEvent::AdminDisconnected {
                    admin_name: self.admin_name.clone(),
                });
            }
            Binding::Participant(name) => {
                if let Some(p) = self.participants.get_mut(&name) {
                    p.channel = None;
                }
                let dropped = self.ticket_requests.purge_channel(channel)
                    + self.claims.purge_channel(channel);
                tracing::info!(room = %self.code, %channel, player = %name, dropped, "player left");
                self.send(Recipient::Room, ServerEvent::PlayerLeft { name });
                self.send(Recipient::Room, ServerEvent::PlayerListUpdated {
                    players: self.player_list(),
                });
            }
        }
    }

    fn require_moderator(&self, channel: ChannelId, op: &str) -> Result<(), RoomError> {
        if self.moderator == Some(channel) {
            return Ok(());
        }
        tracing::warn!(room = %self.code, %channel, op, "moderator-only operation refused");
        Err(RoomError::Unauthorized(format!("only the moderator may {op}")))
    }

    fn require_participant(&self, channel: ChannelId, op: &str) -> Result<String, RoomError> {
        match self.subscribers.get(&channel).map(|s| &s.binding) {
            Some(Binding::Participant(name)) => Ok(name.clone()),
            _ => Err(RoomError::Unauthorized(format!(
                "only participants may {op}"
            ))),
        }
    }

    // -----------------------------------------------------------------
    // Game lifecycle
    // -----------------------------------------------------------------

    /// Fails unless the lifecycle allows moving to `target` from here.
    fn check_transition(&self, target: RoomState) -> Result<(), RoomError> {
        if self.state.can_transition_to(target) {
            Ok(())
        } else {
            Err(RoomError::InvalidState(format!(
                "cannot go from {} to {target}",
                self.state
            )))
        }
    }

    fn transition(&mut self, target: RoomState) -> Result<(), RoomError> {
        self.check_transition(target)?;
        tracing::debug!(room = %self.code, from = %self.state, to = %target, "state changed");
        self.state = target;
        Ok(())
    }

    fn start_game(&mut self, settings: GameSettings) -> Result<AckData, RoomError> {
        self.check_transition(RoomState::Running)?;
        let prizes = PrizeBoard::from_settings(&settings.prizes)?;
        let max_tickets = match settings.max_tickets_per_player {
            Some(0) => {
                return Err(RoomError::BadRequest(
                    "max_tickets_per_player must be at least 1".into(),
                ));
            }
            Some(n) => n,
            None => self.config.max_tickets_per_player,
        };
        let interval = settings
            .interval_secs
            .map_or(self.config.draw_interval, |secs| {
                housie_timer::clamp_interval(Duration::from_secs(secs))
            });

        self.prizes = prizes;
        self.max_tickets = max_tickets;
        self.draw_mode = settings.draw_mode;
        self.calls.reset();
        self.claims.clear();
        self.transition(RoomState::Running)?;
        match self.draw_mode {
            DrawMode::Timed => self.timer.arm(interval),
            DrawMode::Manual => self.timer.cancel(),
        }

        tracing::info!(
            room = %self.code,
            mode = ?self.draw_mode,
            interval_secs = interval.as_secs(),
            max_tickets,
            "game started"
        );
        self.send(Recipient::Room, ServerEvent::GameStarted {
            prizes: self.prizes.statuses(),
            draw_mode: self.draw_mode,
            interval_secs: (self.draw_mode == DrawMode::Timed).then(|| interval.as_secs()),
            max_tickets_per_player: max_tickets,
        });
        Ok(AckData::StateChanged {
            state: RoomState::Running,
        })
    }

    fn call_next(&mut self) -> Result<AckData, RoomError> {
        if self.state != RoomState::Running {
            return Err(RoomError::InvalidState(format!(
                "cannot call numbers while {}",
                self.state
            )));
        }
        match self.draw(CallSource::Manual) {
            Some(number) => Ok(AckData::NumberCalled {
                number,
                called: self.calls.called_list(),
                remaining: self.calls.remaining(),
            }),
            None => Ok(AckData::StateChanged { state: self.state }),
        }
    }

    fn toggle_number(&mut self, number: u8) -> Result<AckData, RoomError> {
        if !self.state.is_live() {
            return Err(RoomError::InvalidState(format!(
                "cannot correct numbers while {}",
                self.state
            )));
        }
        let is_called = self.calls.toggle(number)?;
        let called = self.calls.called_list();
        tracing::debug!(room = %self.code, number, is_called, "number corrected");
        self.send(Recipient::Room, ServerEvent::NumberCalled {
            number: is_called.then_some(number),
            source: CallSource::Correction,
            called: called.clone(),
            remaining: self.calls.remaining(),
        });
        if self.calls.is_exhausted() {
            self.finish(FinishReason::NumbersExhausted);
        }
        Ok(AckData::NumberToggled {
            number,
            is_called,
            called,
        })
    }

    fn pause_auto(&mut self) -> Result<AckData, RoomError> {
        if self.draw_mode != DrawMode::Timed {
            return Err(RoomError::InvalidState(
                "pause is only available in timed mode".into(),
            ));
        }
        self.pause(PauseReason::Moderator)?;
        Ok(AckData::StateChanged {
            state: RoomState::Paused,
        })
    }

    fn resume_auto(&mut self) -> Result<AckData, RoomError> {
        if self.state != RoomState::Paused {
            return Err(RoomError::InvalidState(format!(
                "cannot resume while {}",
                self.state
            )));
        }
        self.transition(RoomState::Running)?;
        self.timer.resume();
        tracing::info!(room = %self.code, "game resumed");
        self.send(Recipient::Room, ServerEvent::AutoResumed);
        Ok(AckData::StateChanged {
            state: RoomState::Running,
        })
    }

    fn stop_game(&mut self) -> Result<AckData, RoomError> {
        self.check_transition(RoomState::Finished)?;
        self.finish(FinishReason::Stopped);
        Ok(AckData::StateChanged {
            state: RoomState::Finished,
        })
    }

    fn on_timer(&mut self, tick: DrawTick) {
        tracing::trace!(room = %self.code, fire = tick.fire, late_ms = tick.late_by.as_millis() as u64, "draw tick");
        if self.state == RoomState::Running && self.draw_mode == DrawMode::Timed {
            self.draw(CallSource::Timer);
        } else {
            tracing::warn!(room = %self.code, state = %self.state, "draw timer fired outside a running timed game");
            self.timer.cancel();
        }
    }

    /// Draws one number and broadcasts it. Finishes the room once
    /// nothing is left to draw.
    fn draw(&mut self, source: CallSource) -> Option<u8> {
        let drawn = self.calls.draw(&mut rand::rng());
        if let Some(number) = drawn {
            tracing::debug!(room = %self.code, number, ?source, remaining = self.calls.remaining(), "number called");
            self.send(Recipient::Room, ServerEvent::NumberCalled {
                number: Some(number),
                source,
                called: self.calls.called_list(),
                remaining: self.calls.remaining(),
            });
        }
        if self.calls.is_exhausted() {
            self.finish(FinishReason::NumbersExhausted);
        }
        drawn
    }

    fn pause(&mut self, reason: PauseReason) -> Result<(), RoomError> {
        self.transition(RoomState::Paused)?;
        self.timer.pause();
        tracing::info!(room = %self.code, ?reason, "game paused");
        self.send(Recipient::Room, ServerEvent::AutoPaused { reason });
        Ok(())
    }

    /// Ends the game. Runs once: a room already finished, or never
    /// started, is left alone.
    fn finish(&mut self, reason: FinishReason) {
        if self.transition(RoomState::Finished).is_err() {
            return;
        }
        self.timer.cancel();
        tracing::info!(
            room = %self.code,
            ?reason,
            called = self.calls.history().len(),
            winners = self.prizes.winners().len(),
            "game finished"
        );
        self.send(Recipient::Room, ServerEvent::AutoFinished { reason });
        self.send(Recipient::Room, ServerEvent::GameSummary {
            called: self.calls.history().to_vec(),
            winners: self.prizes.winners().to_vec(),
        });
    }

    // -----------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------

    fn request_ticket(
        &mut self,
        player: String,
        channel: ChannelId,
        count: u32,
    ) -> Result<AckData, RoomError> {
        if !self.state.accepts_ticket_requests() {
            return Err(RoomError::InvalidState(
                "tickets can't be requested after the game finished".into(),
            ));
        }
        if count == 0 {
            return Err(TicketError::InvalidCount.into());
        }
        let request_id = self.ticket_requests.push(TicketRequest {
            player: player.clone(),
            channel,
            count,
        });
        tracing::debug!(room = %self.code, %player, count, %request_id, "ticket request queued");
        self.send(Recipient::Moderator, ServerEvent::TicketRequested {
            request_id,
            player,
            count,
        });
        Ok(AckData::RequestQueued { request_id })
    }

    fn approve_ticket(&mut self, request_id: RequestId, approve: bool) -> Result<AckData, RoomError> {
        let request = self
            .ticket_requests
            .take(request_id)
            .ok_or_else(|| RoomError::NotFound(format!("ticket request {request_id}")))?;
        let requester = Recipient::Channel(request.channel);

        if !approve {
            tracing::debug!(room = %self.code, player = %request.player, %request_id, "ticket request rejected");
            self.send(requester, ServerEvent::TicketRequestResponse {
                request_id,
                approved: false,
                error: None,
            });
            return Ok(AckData::TicketResolved {
                request_id,
                approved: false,
                issued: 0,
            });
        }

        let participant = self
            .participants
            .get_mut(&request.player)
            .ok_or_else(|| RoomError::NotFound(format!("player {}", request.player)))?;
        let (allocation, remaining) = {
            let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
            let allocation = pool.allocate(
                self.code.as_str(),
                &mut participant.book,
                self.max_tickets as usize,
                request.count as usize,
            );
            (allocation, pool.remaining())
        };
        let tickets = participant.book.tickets().to_vec();

        match allocation {
            Ok(issued) => {
                tracing::info!(
                    room = %self.code,
                    player = %request.player,
                    issued = issued.len(),
                    pool_remaining = remaining,
                    "tickets issued"
                );
                self.send(requester, ServerEvent::TicketRequestResponse {
                    request_id,
                    approved: true,
                    error: None,
                });
                self.send(requester, ServerEvent::TicketUpdated { tickets });
                self.send(Recipient::Room, ServerEvent::PlayerListUpdated {
                    players: self.player_list(),
                });
                Ok(AckData::TicketResolved {
                    request_id,
                    approved: true,
                    issued: issued.len(),
                })
            }
            Err(e) => {
                tracing::warn!(room = %self.code, player = %request.player, error = %e, "ticket allocation failed");
                self.send(requester, ServerEvent::TicketRequestResponse {
                    request_id,
                    approved: false,
                    error: Some(e.to_string()),
                });
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------

    fn submit_claim(
        &mut self,
        player: String,
        channel: ChannelId,
        claim_type: &str,
    ) -> Result<AckData, RoomError> {
        if !self.state.accepts_claims() {
            return Err(RoomError::InvalidState("no game has started".into()));
        }
        let condition: WinCondition = claim_type.parse()?;
        self.prizes.check_open(condition)?;
        if self.prizes.has_won(&player, condition) {
            return Err(RoomError::Validation(format!(
                "{player} already won {condition}"
            )));
        }
        if self
            .claims
            .iter()
            .any(|(_, c)| c.player == player && c.condition == condition)
        {
            return Err(RoomError::Validation(format!(
                "{player} already has a pending {condition} claim"
            )));
        }

        let tickets = self
            .participants
            .get(&player)
            .map_or(&[][..], |p| p.book.tickets());
        let evidence = match validate(tickets, condition, self.calls.called()) {
            ClaimOutcome::Valid(evidence) => evidence,
            ClaimOutcome::Invalid { reason } => {
                tracing::debug!(room = %self.code, %player, %condition, %reason, "claim rejected");
                return Err(RoomError::Validation(reason));
            }
        };

        let claim_id = self.claims.push(PendingClaim {
            player: player.clone(),
            channel,
            condition,
            evidence: evidence.clone(),
        });
        tracing::info!(room = %self.code, %player, %condition, %claim_id, "claim queued");
        self.send(Recipient::Moderator, ServerEvent::ClaimSubmitted {
            claim_id,
            player,
            claim_type: condition,
            evidence: evidence.clone(),
        });
        self.send(Recipient::Channel(channel), ServerEvent::ClaimUpdated {
            claim_id,
            claim_type: condition,
            status: ClaimStatus::Pending,
        });
        Ok(AckData::ClaimQueued { claim_id, evidence })
    }

    fn verify_claim(&mut self, claim_id: RequestId, approve: bool) -> Result<AckData, RoomError> {
        let claim = self
            .claims
            .take(claim_id)
            .ok_or_else(|| RoomError::NotFound(format!("claim {claim_id}")))?;
        let mut record = WinnerRecord {
            player: claim.player.clone(),
            claim_type: claim.condition,
            evidence: claim.evidence.clone(),
        };

        // Corrections may have un-called a proving number since submission.
        let outcome = if approve {
            self.recheck(&claim).and_then(|evidence| {
                record.evidence = evidence;
                self.prizes
                    .record_win(record.clone())
                    .map(|()| ClaimStatus::Approved)
            })
        } else {
            Ok(ClaimStatus::Rejected)
        };
        let status = match &outcome {
            Ok(status) => *status,
            Err(RoomError::Capacity(_)) => ClaimStatus::CapReached,
            Err(_) => ClaimStatus::Rejected,
        };

        tracing::info!(room = %self.code, player = %claim.player, condition = %claim.condition, ?status, "claim resolved");
        self.send(Recipient::Channel(claim.channel), ServerEvent::ClaimUpdated {
            claim_id,
            claim_type: claim.condition,
            status,
        });
        self.send(Recipient::Moderator, ServerEvent::ClaimVerified {
            claim_id,
            player: claim.player,
            claim_type: claim.condition,
            status,
        });
        if status == ClaimStatus::Approved {
            self.send(Recipient::Room, ServerEvent::WinnerAnnounced { winner: record });
        }
        outcome.map(|status| AckData::ClaimResolved { claim_id, status })
    }

    /// Fresh evidence for `claim` against the numbers called right now.
    fn recheck(&self, claim: &PendingClaim) -> Result<Evidence, RoomError> {
        let ticket_id = &claim.evidence.ticket_id;
        self.participants
            .get(&claim.player)
            .and_then(|p| p.book.tickets().iter().find(|t| &t.id == ticket_id))
            .and_then(|ticket| claim.condition.proof(&ticket.grid, self.calls.called()))
            .map(|numbers| Evidence {
                ticket_id: ticket_id.clone(),
                numbers,
            })
            .ok_or_else(|| {
                RoomError::Validation(format!(
                    "{} no longer holds on {ticket_id} for {}",
                    claim.condition, claim.player
                ))
            })
    }

    // -----------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------

    /// Queues `event` for its recipients. A closed queue means the
    /// connection is going away; its disconnect is on the way.
    fn send(&self, to: Recipient, event: ServerEvent) {
        match to {
            Recipient::Room => {
                for subscriber in self.subscribers.values() {
                    let _ = subscriber.sender.send(ServerFrame::Event(event.clone()));
                }
            }
            Recipient::Moderator => {
                if let Some(channel) = self.moderator {
                    self.send_to(channel, event);
                }
            }
            Recipient::Channel(channel) => self.send_to(channel, event),
        }
    }

    fn send_to(&self, channel: ChannelId, event: ServerEvent) {
        if let Some(subscriber) = self.subscribers.get(&channel) {
            let _ = subscriber.sender.send(ServerFrame::Event(event));
        }
    }

    /// Attached participants, by name.
    fn player_list(&self) -> Vec<PlayerSummary> {
        self.participants
            .iter()
            .filter(|(_, p)| p.channel.is_some())
            .map(|(name, p)| PlayerSummary {
                name: name.clone(),
                tickets: p.book.issued(),
            })
            .collect()
    }

    fn snapshot(&self, role: Role, participant: Option<&str>) -> JoinSnapshot {
        let tickets = participant
            .and_then(|name| self.participants.get(name))
            .map(|p| p.book.tickets().to_vec())
            .unwrap_or_default();
        JoinSnapshot {
            room_code: self.code.clone(),
            role,
            state: self.state,
            admin_name: self.admin_name.clone(),
            draw_mode: self.draw_mode,
            called: self.calls.called_list(),
            prizes: self.prizes.statuses(),
            players: self.player_list(),
            tickets,
            winners: self.prizes.winners().to_vec(),
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            state: self.state,
            draw_mode: self.draw_mode,
            players: self.participants.values().filter(|p| p.channel.is_some()).count(),
            moderator_connected: self.moderator.is_some(),
            called: self.calls.called().len(),
            pending_ticket_requests: self.ticket_requests.len(),
            pending_claims: self.claims.len(),
        }
    }
}

/// Spawns a room actor with `moderator` already bound and returns a
/// handle to it. The moderator's queue receives `room-created` before
/// this returns.
pub(crate) fn spawn_room(
    code: RoomCode,
    admin_name: String,
    moderator: ChannelId,
    sender: ChannelSender,
    config: RoomConfig,
    pool: SharedPool,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let mut subscribers = HashMap::new();
    subscribers.insert(moderator, Subscriber {
        sender,
        binding: Binding::Moderator,
    });

    let actor = RoomActor {
        code: code.clone(),
        state: RoomState::Stopped,
        admin_name,
        moderator: Some(moderator),
        draw_mode: DrawMode::Manual,
        max_tickets: config.max_tickets_per_player,
        config,
        calls: CallEngine::new(),
        prizes: PrizeBoard::default(),
        participants: BTreeMap::new(),
        subscribers,
        ticket_requests: Pending::default(),
        claims: Pending::default(),
        timer: DrawTimer::new(),
        pool,
        receiver: rx,
    };
    actor.send(Recipient::Moderator, ServerEvent::RoomCreated {
        room_code: code.clone(),
        admin_name: actor.admin_name.clone(),
    });

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
