//! WebSocket intent dispatch
//!
//! Membership-establishing intents (create/join) are handled by the
//! connection loop because they bind the connection to a room channel;
//! everything here runs on behalf of a participant already bound to a room.
//! Rejections are returned to the issuing connection only; room-wide events
//! travel on the room's broadcast channel.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, GameError};
use std::sync::Arc;

/// Handle a participant's intent and return the optional direct response.
pub async fn handle_message(
    msg: ClientMessage,
    player_id: &str,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Reaching these here means the connection already has a room
        ClientMessage::CreateRoom { .. } | ClientMessage::JoinRoom { .. } => {
            Some(ServerMessage::Error {
                code: "ALREADY_IN_ROOM".to_string(),
                msg: "Leave the current room first".to_string(),
            })
        }

        ClientMessage::StartGame { room_id, settings } => {
            reply(state.start_game(&room_id, player_id, settings).await)
        }

        ClientMessage::ConfirmStart { room_id } => {
            reply(state.confirm_start(&room_id, player_id).await)
        }

        ClientMessage::SubmitAnswer { room_id, answer } => {
            reply(state.submit_answer(&room_id, player_id, answer).await)
        }

        ClientMessage::SubmitPrediction {
            room_id,
            target_id,
            answer,
        } => reply(
            state
                .submit_prediction(&room_id, player_id, &target_id, answer)
                .await,
        ),

        ClientMessage::ReadyForNext { room_id } => {
            reply(state.ready_for_next(&room_id, player_id).await)
        }

        ClientMessage::RoundTimeout { room_id } => {
            reply(state.round_timeout(&room_id, player_id).await)
        }

        ClientMessage::ToggleExclusiveMode { room_id, enabled } => reply(
            state
                .toggle_exclusive_mode(&room_id, player_id, enabled)
                .await,
        ),

        ClientMessage::EndExclusiveMode { room_id } => {
            reply(state.end_exclusive_mode(&room_id, player_id).await)
        }

        ClientMessage::ResetRoom { room_id } => reply(state.reset_room(&room_id, player_id).await),
    }
}

/// Successful intents answer through room events; only rejections come back
/// on the issuing connection.
fn reply(result: Result<(), GameError>) -> Option<ServerMessage> {
    match result {
        Ok(()) => None,
        Err(e) => Some(e.to_message()),
    }
}
