mod disconnect;
mod error;
mod registry;
mod round;
mod session;

pub use error::GameError;

use crate::protocol::ServerMessage;
use crate::questions::{QuestionProvider, StaticCatalog};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Event fanned out on a room's broadcast channel. `target: None` reaches
/// every connection in the room; `Some(player)` only that participant's.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub target: Option<PlayerId>,
    pub message: ServerMessage,
}

impl RoomEvent {
    pub fn all(message: ServerMessage) -> Self {
        Self {
            target: None,
            message,
        }
    }

    pub fn to(player_id: impl Into<PlayerId>, message: ServerMessage) -> Self {
        Self {
            target: Some(player_id.into()),
            message,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// All live rooms; a room is exclusively owned by its sequence of
    /// processed intents, serialized by the write guard
    pub rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    /// One broadcast channel per live room, created and destroyed with it
    channels: Arc<RwLock<HashMap<RoomId, broadcast::Sender<RoomEvent>>>>,
    pub provider: Arc<dyn QuestionProvider>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(StaticCatalog::builtin()))
    }

    pub fn with_provider(provider: Arc<dyn QuestionProvider>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            channels: Arc::new(RwLock::new(HashMap::new())),
            provider,
        }
    }

    /// Subscribe a connection to a room's event stream.
    pub async fn subscribe(&self, room_id: &str) -> Option<broadcast::Receiver<RoomEvent>> {
        self.channels
            .read()
            .await
            .get(room_id)
            .map(|tx| tx.subscribe())
    }

    pub(crate) async fn create_channel(&self, room_id: &str) {
        let (tx, _rx) = broadcast::channel(64);
        self.channels.write().await.insert(room_id.to_string(), tx);
    }

    pub(crate) async fn remove_channel(&self, room_id: &str) {
        self.channels.write().await.remove(room_id);
    }

    pub(crate) async fn send_events(&self, room_id: &str, events: Vec<RoomEvent>) {
        if events.is_empty() {
            return;
        }
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(room_id) {
            for event in events {
                // No receivers connected is fine
                let _ = tx.send(event);
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
