//! Round lifecycle: submission collection, the completion barrier, scoring,
//! timeout-forced progress and advancement.

use super::session::{game_settings, require_member, require_status};
use super::{AppState, GameError, RoomEvent};
use crate::protocol::{QuestionInfo, ServerMessage};
use crate::types::*;
use std::collections::HashMap;

/// Normalize an answer for comparison (trim whitespace, lowercase)
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn prediction_style(room: &Room) -> bool {
    room.settings
        .as_ref()
        .is_some_and(|s| s.style == GameStyle::Prediction)
}

/// The completion barrier: every *currently present* participant has answered
/// and, in prediction style, predicted.
fn round_is_complete(room: &Room) -> bool {
    let answered = room
        .players
        .iter()
        .all(|p| room.current_answers.contains_key(&p.id));
    if !answered {
        return false;
    }
    if prediction_style(room) {
        room.players
            .iter()
            .all(|p| room.current_predictions.contains_key(&p.id))
    } else {
        true
    }
}

/// Score the round and emit results. Reveal-only rounds award nothing; in
/// prediction style a correct guess (case-insensitive exact match against the
/// target's actual answer) is worth exactly one point. Sentinel back-fills
/// unblock the barrier but never score.
fn settle_round(room: &mut Room) -> Vec<RoomEvent> {
    let Some(question) = room.current_question.clone() else {
        return Vec::new();
    };
    let predicting = prediction_style(room);
    let sentinel = normalize(TIME_EXPIRED_ANSWER);

    let mut outcomes = Vec::new();
    let mut earned: HashMap<PlayerId, u32> = HashMap::new();
    for p in &room.players {
        let answer = room
            .current_answers
            .get(&p.id)
            .cloned()
            .unwrap_or_else(|| TIME_EXPIRED_ANSWER.to_string());

        let (prediction, predicted_target_id, is_correct) = if predicting {
            match room.current_predictions.get(&p.id) {
                Some(pred) => {
                    let guess = normalize(&pred.answer);
                    let correct = guess != sentinel
                        && room
                            .current_answers
                            .get(&pred.target_id)
                            .is_some_and(|actual| normalize(actual) == guess);
                    (
                        Some(pred.answer.clone()),
                        Some(pred.target_id.clone()),
                        Some(correct),
                    )
                }
                None => (None, None, None),
            }
        } else {
            (None, None, None)
        };

        let points = u32::from(is_correct == Some(true));
        if points > 0 {
            earned.insert(p.id.clone(), points);
        }
        outcomes.push(PlayerOutcome {
            player_id: p.id.clone(),
            nickname: p.nickname.clone(),
            answer,
            prediction,
            predicted_target_id,
            is_correct_prediction: is_correct,
            points_earned: points,
        });
    }

    for p in &mut room.players {
        if let Some(points) = earned.get(&p.id) {
            p.score += points;
        }
    }
    room.round_settled = true;
    tracing::debug!("Room {}: round {} settled", room.id, room.current_round);

    vec![
        RoomEvent::all(ServerMessage::RoundComplete {
            round: room.current_round,
        }),
        RoomEvent::all(ServerMessage::RoundResults {
            round: room.current_round,
            results: RoundResult {
                question_id: question.id,
                question_text: question.text,
                outcomes,
            },
            scores: room.players.iter().map(Into::into).collect(),
        }),
    ]
}

/// Advance past a settled round: clear per-round state, then either hand out
/// the next prompt or finish the game.
fn advance_round(room: &mut Room) -> Vec<RoomEvent> {
    room.clear_round_state();
    room.current_round += 1;

    let next = if room.exclusive_mode_active {
        room.exclusive_queue.pop_front()
    } else {
        let total = room.settings.as_ref().map_or(0, |s| s.total_rounds);
        if room.current_round > total {
            None
        } else {
            room.questions.get(room.current_round as usize - 1).cloned()
        }
    };

    match next {
        Some(question) => {
            room.current_question = Some(question.clone());
            vec![RoomEvent::all(ServerMessage::NewRound {
                round: room.current_round,
                question: QuestionInfo::from(&question),
                server_now: chrono::Utc::now().to_rfc3339(),
            })]
        }
        None => {
            room.current_question = None;
            vec![finish_game(room, GameOverReason::Finished)]
        }
    }
}

/// Terminal transition shared by normal completion, exclusive end and
/// mid-game departures.
pub(crate) fn finish_game(room: &mut Room, reason: GameOverReason) -> RoomEvent {
    room.status = RoomStatus::Completed;
    room.exclusive_mode_active = false;
    room.exclusive_queue.clear();
    tracing::info!("Room {}: game over ({:?})", room.id, reason);
    RoomEvent::all(ServerMessage::GameOver {
        reason,
        scores: room.players.iter().map(Into::into).collect(),
    })
}

impl AppState {
    /// Record a participant's answer for the current round. A second answer
    /// in the same round is rejected, never overwritten.
    pub async fn submit_answer(
        &self,
        room_id: &str,
        player_id: &str,
        answer: String,
    ) -> Result<(), GameError> {
        let events = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_member(room, player_id)?;
            require_status(room, RoomStatus::Playing)?;
            if room.current_answers.contains_key(player_id) {
                return Err(GameError::AnswerAlreadySubmitted);
            }

            room.current_answers.insert(player_id.to_string(), answer);
            if round_is_complete(room) {
                settle_round(room)
            } else {
                Vec::new()
            }
        };

        self.send_events(room_id, events).await;
        Ok(())
    }

    /// Record a guess at another participant's answer (prediction style only).
    pub async fn submit_prediction(
        &self,
        room_id: &str,
        player_id: &str,
        target_id: &str,
        answer: String,
    ) -> Result<(), GameError> {
        let events = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_member(room, player_id)?;
            require_status(room, RoomStatus::Playing)?;
            if game_settings(room)?.style != GameStyle::Prediction {
                return Err(GameError::PredictionsNotEnabled);
            }
            if target_id == player_id || !room.is_member(target_id) {
                return Err(GameError::InvalidPredictionTarget);
            }
            if room.current_predictions.contains_key(player_id) {
                return Err(GameError::PredictionAlreadySubmitted);
            }

            room.current_predictions.insert(
                player_id.to_string(),
                Prediction {
                    target_id: target_id.to_string(),
                    answer,
                },
            );
            if round_is_complete(room) {
                settle_round(room)
            } else {
                Vec::new()
            }
        };

        self.send_events(room_id, events).await;
        Ok(())
    }

    /// Round-timer expiry, delivered by the transport layer (the controller
    /// owns no clocks). Back-fills sentinels for every missing input and
    /// forces result computation so nobody can block the room forever.
    pub async fn round_timeout(&self, room_id: &str, issuer: &str) -> Result<(), GameError> {
        let events = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_member(room, issuer)?;
            require_status(room, RoomStatus::Playing)?;
            if room.round_settled {
                // Expiry raced the natural completion; nothing to force
                return Ok(());
            }

            let missing_answers: Vec<PlayerId> = room
                .players
                .iter()
                .filter(|p| !room.current_answers.contains_key(&p.id))
                .map(|p| p.id.clone())
                .collect();
            for id in missing_answers {
                room.current_answers
                    .insert(id, TIME_EXPIRED_ANSWER.to_string());
            }

            if prediction_style(room) {
                let missing_predictions: Vec<PlayerId> = room
                    .players
                    .iter()
                    .filter(|p| !room.current_predictions.contains_key(&p.id))
                    .map(|p| p.id.clone())
                    .collect();
                for id in missing_predictions {
                    let target = room.other_player(&id).map(|o| o.id.clone());
                    if let Some(target_id) = target {
                        room.current_predictions.insert(
                            id,
                            Prediction {
                                target_id,
                                answer: TIME_EXPIRED_ANSWER.to_string(),
                            },
                        );
                    }
                }
            }

            settle_round(room)
        };

        self.send_events(room_id, events).await;
        Ok(())
    }

    /// Acknowledge round results. The round advances only once every current
    /// participant has acknowledged; this is the single synchronization
    /// barrier of the whole system.
    pub async fn ready_for_next(&self, room_id: &str, player_id: &str) -> Result<(), GameError> {
        let events = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))?;
            require_member(room, player_id)?;
            require_status(room, RoomStatus::Playing)?;
            if !room.round_settled {
                return Err(GameError::RoundNotSettled);
            }

            // Duplicate acks are harmless set inserts
            room.ready_for_next.insert(player_id.to_string());
            let all_ready = room
                .players
                .iter()
                .all(|p| room.ready_for_next.contains(&p.id));
            if all_ready {
                advance_round(room)
            } else {
                Vec::new()
            }
        };

        self.send_events(room_id, events).await;
        Ok(())
    }
}
