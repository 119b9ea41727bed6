use super::{AppState, GameError};
use crate::types::*;
use rand::Rng;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Trim the submitted nickname, falling back to a generated one when blank.
pub(crate) fn clean_nickname(nickname: String) -> String {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        petname::petname(2, "-").unwrap_or_else(|| "anonymous".to_string())
    } else {
        trimmed.to_string()
    }
}

impl AppState {
    /// Create a room with its creator as the authority participant.
    pub async fn create_room(&self, nickname: String, app_mode: AppMode) -> (Room, PlayerId) {
        let mut rooms = self.rooms.write().await;

        // Rejection-sample a code unused by any live room (collisions are
        // extremely rare with 28M combinations)
        let id = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };

        let creator = Player {
            id: ulid::Ulid::new().to_string(),
            nickname: clean_nickname(nickname),
            score: 0,
        };
        let player_id = creator.id.clone();
        let room = Room::new(id.clone(), app_mode, creator);
        rooms.insert(id.clone(), room.clone());
        drop(rooms);

        self.create_channel(&id).await;
        tracing::info!("Created room {} ({:?})", id, app_mode);
        (room, player_id)
    }

    /// Snapshot a room, or a typed not-found failure.
    pub async fn get_room(&self, room_id: &str) -> Result<Room, GameError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))
    }

    pub async fn remove_room(&self, room_id: &str) {
        self.rooms.write().await.remove(room_id);
        self.remove_channel(room_id).await;
        tracing::info!("Removed room {}", room_id);
    }
}
