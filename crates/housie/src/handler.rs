//! Per-channel handler: frame decoding, request dispatch, and the writer
//! task.
//!
//! Each accepted channel gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task draining the channel's outbound queue
//!   2. Loop: receive a frame → dispatch → queue the ack
//!   3. On close or idle timeout, the guard detaches the channel from
//!      its room
//!
//! Rooms push events straight into the same outbound queue, so a
//! channel's acks and events go out in one order.
//!
//! The idle timeout counts client frames only; server events don't
//! reset it. Clients that may sit quiet for longer (a moderator watching
//! a timed game, say) must send `ping`. A moderator dropped this way is
//! a moderator disconnect, and pauses a timed game.

use std::sync::Arc;

use housie_protocol::{
    Ack, AckData, ClientFrame, ClientRequest, Codec, ErrorCode, ServerFrame,
};
use housie_room::{ChannelSender, RoomError, RoomRequest};
use housie_transport::{ChannelId, Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::HousieError;
use crate::server::ServerState;

/// Drop guard that detaches a channel from its room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task to tell the room.
struct ChannelGuard<C: Codec> {
    channel: ChannelId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ChannelGuard<C> {
    fn drop(&mut self) {
        let channel = self.channel;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if let Some(room) = state.rooms.disconnect(channel).await {
                tracing::debug!(%channel, %room, "channel detached from room");
            }
        });
    }
}

/// Handles a single channel from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), HousieError> {
    let channel = conn.id();
    let conn = Arc::new(conn);
    tracing::debug!(%channel, "handling new channel");

    let (sender, outbound) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(Arc::clone(&conn), outbound, Arc::clone(&state)));
    let _guard = ChannelGuard {
        channel,
        state: Arc::clone(&state),
    };

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%channel, "channel closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%channel, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%channel, "channel timed out");
                break;
            }
        };

        let ack = match state.codec.decode::<ClientFrame>(&data) {
            Ok(frame) => dispatch(&state, channel, &sender, frame).await,
            Err(e) => {
                tracing::debug!(%channel, error = %e, "failed to decode frame");
                Ack::err(0, ErrorCode::BadRequest, format!("invalid frame: {e}"))
            }
        };
        if sender.send(ServerFrame::Ack(ack)).is_err() {
            break;
        }
    }

    writer.abort();
    if let Err(e) = conn.close().await {
        tracing::trace!(%channel, error = %e, "close after shutdown");
    }
    // _guard drops here → room disconnect fires.
    Ok(())
}

/// Runs one request and wraps the outcome in an ack for `frame.id`.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    channel: ChannelId,
    sender: &ChannelSender,
    frame: ClientFrame,
) -> Ack {
    let op = frame.request.op();
    match respond(state, channel, sender, frame.request).await {
        Ok(data) => Ack::ok(frame.id, data),
        Err(e) => {
            tracing::debug!(%channel, op, error = %e, "request failed");
            Ack::err(frame.id, e.code(), e.to_string())
        }
    }
}

async fn respond<C: Codec>(
    state: &ServerState<C>,
    channel: ChannelId,
    sender: &ChannelSender,
    request: ClientRequest,
) -> Result<AckData, RoomError> {
    let request = match RoomRequest::from_client(request) {
        Ok((code, request)) => return state.rooms.route(channel, &code, request).await,
        Err(request) => request,
    };

    match request {
        ClientRequest::CreateRoom { admin_name } => {
            let room_code = state
                .rooms
                .create_room(&admin_name, channel, sender.clone())?;
            Ok(AckData::RoomCreated { room_code })
        }
        ClientRequest::JoinRoom { room_code, name } => {
            let snapshot = state
                .rooms
                .join_room(&room_code, &name, channel, sender.clone())
                .await?;
            Ok(AckData::Joined(snapshot))
        }
        ClientRequest::Health => Ok(AckData::Health {
            status: "ok".into(),
            active_rooms: state.rooms.room_count(),
            pool_remaining: state.rooms.pool_remaining(),
        }),
        ClientRequest::RoomStatus { room_code } => {
            let info = state.rooms.room_status(&room_code).await?;
            Ok(AckData::RoomStatus {
                room_code,
                state: info.state,
                players: info.players,
            })
        }
        ClientRequest::Ping => Ok(AckData::Pong),
        other => Err(RoomError::BadRequest(format!(
            "{} is not handled here",
            other.op()
        ))),
    }
}

/// Drains the channel's outbound queue onto the socket, in order.
async fn write_frames<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbound: mpsc::UnboundedReceiver<ServerFrame>,
    state: Arc<ServerState<C>>,
) {
    let channel = conn.id();
    while let Some(frame) = outbound.recv().await {
        let bytes = match state.codec.encode(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%channel, error = %e, "failed to encode frame");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%channel, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
