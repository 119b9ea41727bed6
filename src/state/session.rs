//! Room lifecycle: joining, the start handshake, exclusive-mode control and
//! resets. Every mutating intent is validated before any state is touched.

use super::round::finish_game;
use super::{AppState, GameError, RoomEvent};
use crate::protocol::{QuestionInfo, ServerMessage};
use crate::types::*;

pub(crate) fn require_member(room: &Room, player_id: &str) -> Result<(), GameError> {
    if room.is_member(player_id) {
        Ok(())
    } else {
        Err(GameError::NotAMember)
    }
}

pub(crate) fn require_authority(room: &Room, player_id: &str) -> Result<(), GameError> {
    require_member(room, player_id)?;
    if room.is_authority(player_id) {
        Ok(())
    } else {
        Err(GameError::NotAuthority)
    }
}

pub(crate) fn require_status(room: &Room, expected: RoomStatus) -> Result<(), GameError> {
    if room.status == expected {
        Ok(())
    } else {
        Err(GameError::WrongStatus {
            expected,
            actual: room.status.clone(),
        })
    }
}

pub(crate) fn game_settings(room: &Room) -> Result<&GameSettings, GameError> {
    room.settings.as_ref().ok_or(GameError::WrongStatus {
        expected: RoomStatus::Playing,
        actual: room.status.clone(),
    })
}

fn validate_settings(room: &Room, settings: &GameSettings) -> Result<(), GameError> {
    if settings.total_rounds == 0 || settings.total_rounds > 50 {
        return Err(GameError::InvalidSettings(
            "total_rounds must be between 1 and 50".to_string(),
        ));
    }
    if settings.round_seconds < 5 || settings.round_seconds > 600 {
        return Err(GameError::InvalidSettings(
            "round_seconds must be between 5 and 600".to_string(),
        ));
    }
    if settings.style == GameStyle::Prediction && room.players.len() != 2 {
        return Err(GameError::InvalidSettings(
            "prediction style needs two players".to_string(),
        ));
    }
    Ok(())
}

impl AppState {
    /// Join a two-player room that is waiting for its second participant.
    pub async fn join_room(
        &self,
        room_id: &str,
        nickname: String,
    ) -> Result<(Room, PlayerId), GameError> {
        let snapshot = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_status(room, RoomStatus::Waiting)?;

            let player = Player {
                id: ulid::Ulid::new().to_string(),
                nickname: super::registry::clean_nickname(nickname),
                score: 0,
            };
            room.players.push(player);
            room.status = RoomStatus::Selecting;
            room.clone()
        };

        tracing::info!("Room {} is ready with two players", room_id);
        let player_id = snapshot.players[1].id.clone();
        self.send_events(
            room_id,
            vec![RoomEvent::all(ServerMessage::RoomReady {
                room: (&snapshot).into(),
            })],
        )
        .await;
        Ok((snapshot, player_id))
    }

    /// Authority intent to start the game. With both participants present the
    /// settings are parked for confirmation instead of starting outright, so
    /// nobody is dropped into a game they had no chance to see configured.
    pub async fn start_game(
        &self,
        room_id: &str,
        issuer: &str,
        settings: GameSettings,
    ) -> Result<(), GameError> {
        let confirmer = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_authority(room, issuer)?;
            require_status(room, RoomStatus::Selecting)?;
            validate_settings(room, &settings)?;

            if room.app_mode == AppMode::TwoPlayer && room.players.len() == 2 {
                room.pending_start = Some(settings.clone());
                room.other_player(issuer).map(|p| p.id.clone())
            } else {
                None
            }
        };

        match confirmer {
            Some(confirmer_id) => {
                tracing::info!("Room {}: start proposed, awaiting confirmation", room_id);
                self.send_events(
                    room_id,
                    vec![
                        RoomEvent::to(
                            confirmer_id,
                            ServerMessage::StartProposed {
                                settings,
                                proposed_by: issuer.to_string(),
                            },
                        ),
                        RoomEvent::to(issuer.to_string(), ServerMessage::StartPending),
                    ],
                )
                .await;
                Ok(())
            }
            None => self.commit_game_start(room_id, issuer, settings).await,
        }
    }

    /// The non-authority participant's acknowledgment of a proposed start.
    pub async fn confirm_start(&self, room_id: &str, issuer: &str) -> Result<(), GameError> {
        let settings = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_member(room, issuer)?;
            if room.is_authority(issuer) {
                return Err(GameError::CannotConfirmOwnStart);
            }
            room.pending_start
                .take()
                .ok_or(GameError::NoPendingStart)?
        };
        self.commit_game_start(room_id, issuer, settings).await
    }

    /// Single commit path for game start, reached either directly (solo mode
    /// or only one participant present) or via the confirmation handshake.
    pub(crate) async fn commit_game_start(
        &self,
        room_id: &str,
        issuer: &str,
        settings: GameSettings,
    ) -> Result<(), GameError> {
        let total = settings.total_rounds as usize;
        let batch = self
            .provider
            .fetch(settings.category, total, settings.content_tier, false)
            .await;

        if batch.len() < total {
            let err = GameError::ContentShortage {
                requested: total,
                available: batch.len(),
            };
            // The shortage belongs to the authority even when the confirming
            // participant triggered the commit
            if let Ok(room) = self.get_room(room_id).await {
                if let Some(authority) = room.authority_id() {
                    if authority != issuer {
                        self.send_events(
                            room_id,
                            vec![RoomEvent::to(authority.clone(), err.to_message())],
                        )
                        .await;
                    }
                }
            }
            return Err(err);
        }

        let exclusive_pool = if settings.exclusive_mode {
            Some(
                self.provider
                    .fetch(settings.category, usize::MAX, settings.content_tier, true)
                    .await,
            )
        } else {
            None
        };

        let mut events = Vec::new();
        {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            // The room may have changed while fetching (e.g. a departure)
            require_status(room, RoomStatus::Selecting)?;

            room.pending_start = None;
            for p in &mut room.players {
                p.score = 0;
            }
            room.clear_round_state();
            room.questions = batch;
            room.current_round = 1;
            room.status = RoomStatus::Playing;

            let first = match exclusive_pool {
                Some(pool) if pool.is_empty() => {
                    // Fall back to standard content, but tell the authority
                    room.exclusive_mode_active = false;
                    room.exclusive_queue.clear();
                    if let Some(authority) = room.authority_id() {
                        events.push(RoomEvent::to(
                            authority.clone(),
                            ServerMessage::ExclusiveUnavailable,
                        ));
                    }
                    room.questions[0].clone()
                }
                Some(mut pool) => {
                    room.exclusive_mode_active = true;
                    let first = pool.remove(0);
                    room.exclusive_queue = pool.into();
                    first
                }
                None => {
                    room.exclusive_mode_active = false;
                    room.exclusive_queue.clear();
                    room.questions[0].clone()
                }
            };
            room.current_question = Some(first.clone());
            room.settings = Some(settings);

            events.push(RoomEvent::all(ServerMessage::GameStarted {
                room: (&*room).into(),
                round: 1,
                question: QuestionInfo::from(&first),
                server_now: chrono::Utc::now().to_rfc3339(),
            }));
        }

        tracing::info!("Room {}: game started", room_id);
        self.send_events(room_id, events).await;
        Ok(())
    }

    /// Switch the content channel mid-game. Enabling fetches the whole
    /// top-tier pool; an empty pool leaves standard content in place and
    /// notifies the authority.
    pub async fn toggle_exclusive_mode(
        &self,
        room_id: &str,
        issuer: &str,
        enabled: bool,
    ) -> Result<(), GameError> {
        if !enabled {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_authority(room, issuer)?;
            require_status(room, RoomStatus::Playing)?;
            if !room.exclusive_mode_active {
                return Err(GameError::ExclusiveNotActive);
            }
            room.exclusive_mode_active = false;
            room.exclusive_queue.clear();
            drop(rooms);

            self.send_events(
                room_id,
                vec![RoomEvent::all(ServerMessage::ExclusiveModeUpdate {
                    active: false,
                    remaining: 0,
                })],
            )
            .await;
            return Ok(());
        }

        let (category, tier) = {
            let rooms = self.rooms.read().await;
            let room = rooms
                .get(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_authority(room, issuer)?;
            require_status(room, RoomStatus::Playing)?;
            let settings = game_settings(room)?;
            (settings.category, settings.content_tier)
        };

        let pool = self.provider.fetch(category, usize::MAX, tier, true).await;

        let events = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_authority(room, issuer)?;
            require_status(room, RoomStatus::Playing)?;

            if pool.is_empty() {
                vec![RoomEvent::to(
                    issuer.to_string(),
                    ServerMessage::ExclusiveUnavailable,
                )]
            } else {
                room.exclusive_mode_active = true;
                room.exclusive_queue = pool.into();
                tracing::info!(
                    "Room {}: exclusive mode on, {} queued",
                    room_id,
                    room.exclusive_queue.len()
                );
                vec![RoomEvent::all(ServerMessage::ExclusiveModeUpdate {
                    active: true,
                    remaining: room.exclusive_queue.len(),
                })]
            }
        };

        self.send_events(room_id, events).await;
        Ok(())
    }

    /// Authority explicitly ends an exclusive session.
    pub async fn end_exclusive_mode(&self, room_id: &str, issuer: &str) -> Result<(), GameError> {
        let events = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_authority(room, issuer)?;
            require_status(room, RoomStatus::Playing)?;
            if !room.exclusive_mode_active {
                return Err(GameError::ExclusiveNotActive);
            }
            vec![finish_game(room, GameOverReason::ExclusiveEnded)]
        };

        self.send_events(room_id, events).await;
        Ok(())
    }

    /// Back to configuration after a finished game: scores and round state
    /// zeroed, configuration cleared.
    pub async fn reset_room(&self, room_id: &str, issuer: &str) -> Result<(), GameError> {
        let snapshot = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_authority(room, issuer)?;
            require_status(room, RoomStatus::Completed)?;

            for p in &mut room.players {
                p.score = 0;
            }
            room.clear_round_state();
            room.settings = None;
            room.questions.clear();
            room.current_question = None;
            room.current_round = 0;
            room.exclusive_mode_active = false;
            room.exclusive_queue.clear();
            room.pending_start = None;
            room.status = if room.app_mode == AppMode::TwoPlayer && room.players.len() < 2 {
                RoomStatus::Waiting
            } else {
                RoomStatus::Selecting
            };
            room.clone()
        };

        tracing::info!("Room {} reset", room_id);
        self.send_events(
            room_id,
            vec![RoomEvent::all(ServerMessage::RoomReset {
                room: (&snapshot).into(),
            })],
        )
        .await;
        Ok(())
    }
}
