pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, RoomEvent};

/// Room membership of one connection, established by create_room/join_room.
struct ConnSession {
    room_id: String,
    player_id: String,
    rx: tokio::sync::broadcast::Receiver<RoomEvent>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut session: Option<ConnSession> = None;

    loop {
        tokio::select! {
            // Room events, once the connection belongs to a room
            event = async {
                match &mut session {
                    Some(s) => s.rx.recv().await,
                    None => {
                        // No room yet: wait forever
                        std::future::pending::<Result<RoomEvent, RecvError>>().await
                    }
                }
            } => {
                match event {
                    Ok(event) => {
                        let mine = match (&event.target, &session) {
                            (None, _) => true,
                            (Some(target), Some(s)) => *target == s.player_id,
                            (Some(_), None) => false,
                        };
                        if mine {
                            if let Ok(json) = serde_json::to_string(&event.message) {
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    // Room destroyed while we were subscribed
                    Err(RecvError::Closed) => {
                        session = None;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Connection lagged, {} room events dropped", skipped);
                    }
                }
            }

            // Client intents
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    dispatch(client_msg, &mut session, &state).await
                                {
                                    if let Ok(json) = serde_json::to_string(&response) {
                                        if sender.send(Message::Text(json.into())).await.is_err() {
                                            tracing::error!("Failed to send response");
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // The departure of the connection is the departure of its participant
    if let Some(s) = session {
        state.handle_disconnect(&s.room_id, &s.player_id).await;
    }
}

/// Membership-establishing intents bind the connection to a room channel and
/// are handled here; everything else goes through the dispatch table.
async fn dispatch(
    msg: ClientMessage,
    session: &mut Option<ConnSession>,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // A connection that already belongs to a room cannot create or join
        ClientMessage::CreateRoom { .. } | ClientMessage::JoinRoom { .. }
            if session.is_some() =>
        {
            Some(ServerMessage::Error {
                code: "ALREADY_IN_ROOM".to_string(),
                msg: "Leave the current room first".to_string(),
            })
        }

        ClientMessage::CreateRoom { nickname, app_mode } => {
            let (room, player_id) = state.create_room(nickname, app_mode).await;
            let Some(rx) = state.subscribe(&room.id).await else {
                return Some(ServerMessage::Error {
                    code: "ROOM_NOT_FOUND".to_string(),
                    msg: format!("room {} not found", room.id),
                });
            };
            *session = Some(ConnSession {
                room_id: room.id.clone(),
                player_id: player_id.clone(),
                rx,
            });
            Some(ServerMessage::RoomCreated {
                room: (&room).into(),
                player_id,
            })
        }

        ClientMessage::JoinRoom { room_id, nickname } => {
            match state.join_room(&room_id, nickname).await {
                Ok((room, player_id)) => {
                    let Some(rx) = state.subscribe(&room.id).await else {
                        return Some(ServerMessage::Error {
                            code: "ROOM_NOT_FOUND".to_string(),
                            msg: format!("room {} not found", room.id),
                        });
                    };
                    *session = Some(ConnSession {
                        room_id: room.id.clone(),
                        player_id: player_id.clone(),
                        rx,
                    });
                    Some(ServerMessage::RoomJoined {
                        room: (&room).into(),
                        player_id,
                    })
                }
                Err(e) => Some(e.to_message()),
            }
        }

        msg => match session.as_ref() {
            Some(s) => handlers::handle_message(msg, &s.player_id, state).await,
            None => Some(ServerMessage::Error {
                code: "NOT_IN_ROOM".to_string(),
                msg: "Create or join a room first".to_string(),
            }),
        },
    }
}
