//! Transport-level departures.

use super::round::finish_game;
use super::{AppState, RoomEvent};
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// React to a participant's transport disconnect: remove them, purge
    /// their per-round entries, then decide whether the room dies, the game
    /// ends, or the survivors are merely notified.
    pub async fn handle_disconnect(&self, room_id: &str, player_id: &str) {
        let mut destroy = false;
        let events = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                return;
            };
            let Some(idx) = room.players.iter().position(|p| p.id == player_id) else {
                return;
            };

            let player = room.players.remove(idx);
            room.current_answers.remove(player_id);
            room.ready_for_next.remove(player_id);
            room.current_predictions.remove(player_id);
            // Predictions aimed at the departed participant are void too
            room.current_predictions
                .retain(|_, pred| pred.target_id != player_id);
            tracing::info!("Player {} left room {}", player.nickname, room_id);

            if room.players.is_empty() {
                destroy = true;
                Vec::new()
            } else {
                let mut events = vec![RoomEvent::all(ServerMessage::PlayerLeft {
                    player_id: player.id.clone(),
                    nickname: player.nickname.clone(),
                })];
                if room.status == RoomStatus::Playing {
                    // A two-player round can never complete with one
                    // participant, and exclusive content needs its gatekeeper;
                    // either way the session cannot continue
                    events.push(finish_game(room, GameOverReason::OpponentLeft));
                } else if room.app_mode == AppMode::TwoPlayer
                    && room.status == RoomStatus::Selecting
                {
                    // The room survives and can reach SELECTING again with a
                    // new joiner
                    room.status = RoomStatus::Waiting;
                    room.pending_start = None;
                }
                events
            }
        };

        if destroy {
            self.remove_room(room_id).await;
        } else {
            self.send_events(room_id, events).await;
        }
    }
}
