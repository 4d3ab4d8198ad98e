//! Everything that travels on the wire between clients and the server.
//!
//! Clients send a [`ClientFrame`]: a correlation `id` plus one
//! [`ClientRequest`]. The server answers every frame with exactly one
//! [`Ack`] carrying the same `id`, and pushes [`ServerEvent`]s to the
//! channels subscribed to a room. Both leave the server wrapped in a
//! [`ServerFrame`].
//!
//! ```text
//! → {"id":3,"request":{"op":"manual-call-next","room_code":"K7TQ2M"}}
//! ← {"type":"Event","data":{"event":"number-called","number":42,...}}
//! ← {"type":"Ack","data":{"id":3,"success":true,"data":{"kind":"number-called",...}}}
//! ```

use std::fmt;

use housie_ticket::{Evidence, Ticket, WinCondition};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque code naming one room, e.g. `K7TQ2M`.
///
/// Codes are read aloud and typed on phones, so they avoid look-alike
/// characters (`0`/`O`, `1`/`I`).
///
/// Decoding goes through [`RoomCode::new`], so `"k7tq2m"` on the wire
/// names room `K7TQ2M`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Length of generated codes.
    pub const LEN: usize = 6;
    const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Draws a fresh random code. Uniqueness is the registry's job.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..Self::LEN)
            .map(|_| Self::ALPHABET[rng.random_range(0..Self::ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalises user input (trims, upper-cases).
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(&code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one pending ticket request or claim within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a room's game.
///
/// ```text
/// Stopped ──start──→ Running ⇄ Paused
///                       │        │
///                       └──┬─────┘
///                          ▼
///                      Finished ──start──→ Running (full reset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Stopped,
    Running,
    Paused,
    Finished,
}

impl RoomState {
    /// Returns `true` if moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoomState::*;
        matches!(
            (self, target),
            (Stopped | Finished, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running | Paused, Finished)
        )
    }

    /// A game is underway (numbers can be corrected, timers may run).
    pub fn is_live(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Claims are checked against the called set from the first draw
    /// until the moderator starts the next game.
    pub fn accepts_claims(self) -> bool {
        !matches!(self, Self::Stopped)
    }

    /// Tickets can be requested at any point before the game ends.
    pub fn accepts_ticket_requests(self) -> bool {
        !matches!(self, Self::Finished)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// How numbers get drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// The moderator calls each number.
    #[default]
    Manual,
    /// A per-room timer draws every `interval_secs`.
    Timed,
}

/// Whether a channel is a room's moderator or one of its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Moderator,
    Participant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    Moderator,
    ModeratorDisconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stopped,
    NumbersExhausted,
}

/// What put a number into (or took it out of) the called set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSource {
    /// The moderator pressed "next".
    Manual,
    /// The draw timer fired.
    Timer,
    /// The moderator toggled a number by hand.
    Correction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    /// Approved too late: the prize's winner cap filled up first.
    CapReached,
}

// ---------------------------------------------------------------------------
// Shared payload pieces
// ---------------------------------------------------------------------------

/// One row of the prize table submitted with `start-game`.
///
/// `claim_type` stays a string so an unknown name comes back as
/// `unknown_claim_type` instead of a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeSetting {
    pub claim_type: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_one")]
    pub max_winners: u32,
}

/// Game options submitted with `start-game`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameSettings {
    pub prizes: Vec<PrizeSetting>,
    #[serde(default)]
    pub draw_mode: DrawMode,
    /// Seconds between timed draws. Falls back to the room default.
    #[serde(default)]
    pub interval_secs: Option<u64>,
    /// Falls back to the room default.
    #[serde(default)]
    pub max_tickets_per_player: Option<u32>,
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_count() -> u32 {
    1
}

/// A prize as currently configured in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeStatus {
    pub claim_type: WinCondition,
    pub active: bool,
    pub max_winners: u32,
    pub winners: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub tickets: usize,
}

/// One recorded win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub player: String,
    pub claim_type: WinCondition,
    pub evidence: Evidence,
}

/// Everything a channel needs to render a room after joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSnapshot {
    pub room_code: RoomCode,
    pub role: Role,
    pub state: RoomState,
    pub admin_name: String,
    pub draw_mode: DrawMode,
    /// Ascending.
    pub called: Vec<u8>,
    pub prizes: Vec<PrizeStatus>,
    pub players: Vec<PlayerSummary>,
    /// The joining participant's own tickets; empty for the moderator.
    pub tickets: Vec<Ticket>,
    pub winners: Vec<WinnerRecord>,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// One request from a client. The `id` is echoed in the [`Ack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub id: u64,
    pub request: ClientRequest,
}

/// Every operation a client can ask for.
///
/// Room-scoped operations carry the `room_code`; the server checks the
/// caller's authority inside the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ClientRequest {
    /// Open a new room; the caller becomes its moderator.
    CreateRoom { admin_name: String },
    /// Join (or rejoin) a room by display name.
    JoinRoom { room_code: RoomCode, name: String },
    StartGame {
        room_code: RoomCode,
        settings: GameSettings,
    },
    ManualCallNext { room_code: RoomCode },
    AdminToggleNumber { room_code: RoomCode, number: u8 },
    PauseAuto { room_code: RoomCode },
    ResumeAuto { room_code: RoomCode },
    StopGame { room_code: RoomCode },
    RequestTicket {
        room_code: RoomCode,
        #[serde(default = "default_count")]
        count: u32,
    },
    ApproveTicket {
        room_code: RoomCode,
        request_id: RequestId,
        approve: bool,
    },
    SubmitClaim {
        room_code: RoomCode,
        claim_type: String,
    },
    VerifyClaim {
        room_code: RoomCode,
        claim_id: RequestId,
        approve: bool,
    },
    /// Liveness probe.
    Health,
    /// Does this room exist, and what state is it in?
    RoomStatus { room_code: RoomCode },
    /// Keeps an idle channel open.
    Ping,
}

impl ClientRequest {
    /// The wire name of the operation, for logging.
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::StartGame { .. } => "start-game",
            Self::ManualCallNext { .. } => "manual-call-next",
            Self::AdminToggleNumber { .. } => "admin-toggle-number",
            Self::PauseAuto { .. } => "pause-auto",
            Self::ResumeAuto { .. } => "resume-auto",
            Self::StopGame { .. } => "stop-game",
            Self::RequestTicket { .. } => "request-ticket",
            Self::ApproveTicket { .. } => "approve-ticket",
            Self::SubmitClaim { .. } => "submit-claim",
            Self::VerifyClaim { .. } => "verify-claim",
            Self::Health => "health",
            Self::RoomStatus { .. } => "room-status",
            Self::Ping => "ping",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Error codes carried by failed acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Unauthorized,
    InvalidState,
    CapacityError,
    PoolExhausted,
    ValidationFailure,
    UnknownClaimType,
    GenerationError,
    BadRequest,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// The single reply to a [`ClientFrame`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AckData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Ack {
    pub fn ok(id: u64, data: AckData) -> Self {
        Self {
            id,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(id: u64, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Operation-specific payload of a successful [`Ack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AckData {
    RoomCreated { room_code: RoomCode },
    Joined(JoinSnapshot),
    /// start, pause, resume, stop.
    StateChanged { state: RoomState },
    NumberCalled {
        number: u8,
        called: Vec<u8>,
        remaining: usize,
    },
    NumberToggled {
        number: u8,
        is_called: bool,
        called: Vec<u8>,
    },
    RequestQueued { request_id: RequestId },
    TicketResolved {
        request_id: RequestId,
        approved: bool,
        issued: usize,
    },
    ClaimQueued {
        claim_id: RequestId,
        evidence: Evidence,
    },
    ClaimResolved {
        claim_id: RequestId,
        status: ClaimStatus,
    },
    Health {
        status: String,
        active_rooms: usize,
        /// Grids left in the shared ticket pool.
        pool_remaining: usize,
    },
    RoomStatus {
        room_code: RoomCode,
        state: RoomState,
        players: usize,
    },
    Pong,
}

/// Pushed to channels subscribed to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomCreated {
        room_code: RoomCode,
        admin_name: String,
    },
    PlayerJoined { name: String },
    PlayerLeft { name: String },
    PlayerListUpdated { players: Vec<PlayerSummary> },
    GameStarted {
        prizes: Vec<PrizeStatus>,
        draw_mode: DrawMode,
        interval_secs: Option<u64>,
        max_tickets_per_player: u32,
    },
    /// `number` is `None` when a correction removed a number.
    NumberCalled {
        number: Option<u8>,
        source: CallSource,
        called: Vec<u8>,
        remaining: usize,
    },
    AutoPaused { reason: PauseReason },
    AutoResumed,
    AutoFinished { reason: FinishReason },
    /// `called` is in call order.
    GameSummary {
        called: Vec<u8>,
        winners: Vec<WinnerRecord>,
    },
    /// Moderator only.
    TicketRequested {
        request_id: RequestId,
        player: String,
        count: u32,
    },
    /// Requester only.
    TicketRequestResponse {
        request_id: RequestId,
        approved: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Requester only: the full ticket list after an allocation.
    TicketUpdated { tickets: Vec<Ticket> },
    /// Moderator only.
    ClaimSubmitted {
        claim_id: RequestId,
        player: String,
        claim_type: WinCondition,
        evidence: Evidence,
    },
    /// Requester only.
    ClaimUpdated {
        claim_id: RequestId,
        claim_type: WinCondition,
        status: ClaimStatus,
    },
    /// Moderator only.
    ClaimVerified {
        claim_id: RequestId,
        player: String,
        claim_type: WinCondition,
        status: ClaimStatus,
    },
    WinnerAnnounced { winner: WinnerRecord },
    AdminDisconnected { admin_name: String },
}

/// Everything the server writes to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerFrame {
    Ack(Ack),
    Event(ServerEvent),
}

// =========================================================================
// Tests
// =========================================================================
