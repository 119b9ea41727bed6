use async_trait::async_trait;
use std::sync::Arc;
use tandem::protocol::{ClientMessage, ServerMessage};
use tandem::questions::QuestionProvider;
use tandem::state::{AppState, RoomEvent};
use tandem::types::{
    AppMode, Category, ContentTier, GameOverReason, GameSettings, GameStyle, Question, RoomStatus,
    TIME_EXPIRED_ANSWER,
};
use tandem::ws::handlers::handle_message;
use tokio::sync::broadcast;

/// Deterministic question source so tests know exactly what each round asks.
struct FixedProvider {
    standard: Vec<Question>,
    exclusive: Vec<Question>,
}

#[async_trait]
impl QuestionProvider for FixedProvider {
    async fn fetch(
        &self,
        _category: Category,
        count: usize,
        _tier_ceiling: ContentTier,
        exclusive_only: bool,
    ) -> Vec<Question> {
        let pool = if exclusive_only {
            &self.exclusive
        } else {
            &self.standard
        };
        pool.iter().take(count).cloned().collect()
    }
}

fn ab_question(id: &str) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {id}?"),
        options: vec!["A".to_string(), "B".to_string()],
        tier: ContentTier::Mild,
        category: Category::Favorites,
    }
}

fn fixed_state(standard: usize, exclusive: usize) -> Arc<AppState> {
    Arc::new(AppState::with_provider(Arc::new(FixedProvider {
        standard: (1..=standard)
            .map(|n| ab_question(&format!("q-{n}")))
            .collect(),
        exclusive: (1..=exclusive)
            .map(|n| ab_question(&format!("x-{n}")))
            .collect(),
    })))
}

fn settings(style: GameStyle, total_rounds: u32, exclusive_mode: bool) -> GameSettings {
    GameSettings {
        category: Category::Favorites,
        style,
        content_tier: ContentTier::Mild,
        round_seconds: 30,
        total_rounds,
        exclusive_mode,
    }
}

/// Collect everything currently queued on a room subscription.
fn drain(rx: &mut broadcast::Receiver<RoomEvent>) -> Vec<RoomEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// End-to-end flow for the prediction style: handshake, one round, scoring.
#[tokio::test]
async fn test_full_prediction_game_flow() {
    let state = fixed_state(1, 0);

    // Room setup: creator plus one joiner
    let (room, p1) = state
        .create_room("Ana".to_string(), AppMode::TwoPlayer)
        .await;
    let room_id = room.id.clone();
    let mut rx = state.subscribe(&room_id).await.expect("room channel");
    let (_, p2) = state.join_room(&room_id, "Ben".to_string()).await.unwrap();

    let joined = drain(&mut rx);
    assert!(joined
        .iter()
        .any(|e| matches!(&e.message, ServerMessage::RoomReady { room } if room.players.len() == 2)));

    // Authority proposes; the start waits for the joiner's confirmation
    let response = handle_message(
        ClientMessage::StartGame {
            room_id: room_id.clone(),
            settings: settings(GameStyle::Prediction, 1, false),
        },
        &p1,
        &state,
    )
    .await;
    assert!(response.is_none());

    let proposed = drain(&mut rx);
    assert!(proposed.iter().any(|e| {
        matches!(&e.message, ServerMessage::StartProposed { .. }) && e.target.as_deref() == Some(p2.as_str())
    }));
    assert!(proposed.iter().any(|e| {
        matches!(&e.message, ServerMessage::StartPending) && e.target.as_deref() == Some(p1.as_str())
    }));
    assert_eq!(
        state.get_room(&room_id).await.unwrap().status,
        RoomStatus::Selecting
    );

    // Confirmation commits the start and hands out round 1
    let response = handle_message(
        ClientMessage::ConfirmStart {
            room_id: room_id.clone(),
        },
        &p2,
        &state,
    )
    .await;
    assert!(response.is_none());

    let started = drain(&mut rx);
    let game_started = started
        .iter()
        .find_map(|e| match &e.message {
            ServerMessage::GameStarted {
                round, question, ..
            } => Some((*round, question.clone())),
            _ => None,
        })
        .expect("game_started event");
    assert_eq!(game_started.0, 1);
    assert_eq!(game_started.1.options, vec!["A", "B"]);

    // P1 answers "A", P2 answers "B"; P1 predicts P2 -> "B", P2 predicts P1 -> "A"
    for (who, msg) in [
        (
            &p1,
            ClientMessage::SubmitAnswer {
                room_id: room_id.clone(),
                answer: "A".to_string(),
            },
        ),
        (
            &p2,
            ClientMessage::SubmitAnswer {
                room_id: room_id.clone(),
                answer: "B".to_string(),
            },
        ),
        (
            &p1,
            ClientMessage::SubmitPrediction {
                room_id: room_id.clone(),
                target_id: p2.clone(),
                answer: "B".to_string(),
            },
        ),
        (
            &p2,
            ClientMessage::SubmitPrediction {
                room_id: room_id.clone(),
                target_id: p1.clone(),
                answer: "A".to_string(),
            },
        ),
    ] {
        assert!(handle_message(msg, who, &state).await.is_none());
    }

    // Both predictions are correct: one point each
    let settled = drain(&mut rx);
    assert!(settled
        .iter()
        .any(|e| matches!(&e.message, ServerMessage::RoundComplete { round: 1 })));
    let results = settled
        .iter()
        .find_map(|e| match &e.message {
            ServerMessage::RoundResults {
                results, scores, ..
            } => Some((results.clone(), scores.clone())),
            _ => None,
        })
        .expect("round_results event");
    for outcome in &results.0.outcomes {
        assert_eq!(outcome.points_earned, 1);
        assert_eq!(outcome.is_correct_prediction, Some(true));
    }
    assert!(results.1.iter().all(|s| s.score == 1));

    // Single round, so full readiness finishes the game
    handle_message(
        ClientMessage::ReadyForNext {
            room_id: room_id.clone(),
        },
        &p1,
        &state,
    )
    .await;
    assert_eq!(
        state.get_room(&room_id).await.unwrap().current_round,
        1,
        "one ack must not advance"
    );
    handle_message(
        ClientMessage::ReadyForNext {
            room_id: room_id.clone(),
        },
        &p2,
        &state,
    )
    .await;

    let finished = drain(&mut rx);
    let game_over = finished
        .iter()
        .find_map(|e| match &e.message {
            ServerMessage::GameOver { reason, scores } => Some((*reason, scores.clone())),
            _ => None,
        })
        .expect("game_over event");
    assert_eq!(game_over.0, GameOverReason::Finished);
    assert!(game_over.1.iter().all(|s| s.score == 1));
}

/// Exclusive mode: a queue of two items is consumed one per round, then the
/// game completes on exhaustion.
#[tokio::test]
async fn test_exclusive_queue_runs_dry() {
    let state = fixed_state(5, 2);
    let (room, p1) = state
        .create_room("Ana".to_string(), AppMode::TwoPlayer)
        .await;
    let room_id = room.id.clone();
    let (_, p2) = state.join_room(&room_id, "Ben".to_string()).await.unwrap();
    let mut rx = state.subscribe(&room_id).await.expect("room channel");

    state
        .start_game(&room_id, &p1, settings(GameStyle::RevealOnly, 5, true))
        .await
        .unwrap();
    state.confirm_start(&room_id, &p2).await.unwrap();

    let started = drain(&mut rx);
    let first_question = started
        .iter()
        .find_map(|e| match &e.message {
            ServerMessage::GameStarted { question, .. } => Some(question.id.clone()),
            _ => None,
        })
        .expect("game_started event");
    assert_eq!(first_question, "x-1");

    let play_round = |state: Arc<AppState>, room_id: String, p1: String, p2: String| async move {
        state
            .submit_answer(&room_id, &p1, "A".to_string())
            .await
            .unwrap();
        state
            .submit_answer(&room_id, &p2, "B".to_string())
            .await
            .unwrap();
        state.ready_for_next(&room_id, &p1).await.unwrap();
        state.ready_for_next(&room_id, &p2).await.unwrap();
    };

    // Round 1 -> round 2 dequeues the second exclusive item
    play_round(
        state.clone(),
        room_id.clone(),
        p1.clone(),
        p2.clone(),
    )
    .await;
    let advanced = drain(&mut rx);
    let second_question = advanced
        .iter()
        .find_map(|e| match &e.message {
            ServerMessage::NewRound {
                round, question, ..
            } => Some((*round, question.id.clone())),
            _ => None,
        })
        .expect("new_round event");
    assert_eq!(second_question, (2, "x-2".to_string()));
    assert!(state
        .get_room(&room_id)
        .await
        .unwrap()
        .exclusive_queue
        .is_empty());

    // Round 2 -> queue is dry, the game completes
    play_round(state.clone(), room_id.clone(), p1, p2).await;
    let finished = drain(&mut rx);
    assert!(finished.iter().any(|e| matches!(
        &e.message,
        ServerMessage::GameOver {
            reason: GameOverReason::Finished,
            ..
        }
    )));
    assert_eq!(
        state.get_room(&room_id).await.unwrap().status,
        RoomStatus::Completed
    );
}

/// A stalled participant cannot block the room: timer expiry back-fills the
/// sentinel and yields results in one processing step.
#[tokio::test]
async fn test_timeout_forces_progress() {
    let state = fixed_state(3, 0);
    let (room, p1) = state
        .create_room("Ana".to_string(), AppMode::TwoPlayer)
        .await;
    let room_id = room.id.clone();
    let (_, p2) = state.join_room(&room_id, "Ben".to_string()).await.unwrap();
    state
        .start_game(&room_id, &p1, settings(GameStyle::RevealOnly, 3, false))
        .await
        .unwrap();
    state.confirm_start(&room_id, &p2).await.unwrap();
    let mut rx = state.subscribe(&room_id).await.expect("room channel");

    state
        .submit_answer(&room_id, &p1, "A".to_string())
        .await
        .unwrap();

    let response = handle_message(
        ClientMessage::RoundTimeout {
            room_id: room_id.clone(),
        },
        &p1,
        &state,
    )
    .await;
    assert!(response.is_none());

    let events = drain(&mut rx);
    let results = events
        .iter()
        .find_map(|e| match &e.message {
            ServerMessage::RoundResults { results, .. } => Some(results.clone()),
            _ => None,
        })
        .expect("round_results event");
    let ben = results
        .outcomes
        .iter()
        .find(|o| o.player_id == p2)
        .expect("ben's outcome");
    assert_eq!(ben.answer, TIME_EXPIRED_ANSWER);
}

#[tokio::test]
async fn test_duplicate_answer_is_rejected() {
    let state = fixed_state(3, 0);
    let (room, p1) = state.create_room("Ana".to_string(), AppMode::Solo).await;
    let room_id = room.id.clone();
    state
        .start_game(&room_id, &p1, settings(GameStyle::RevealOnly, 3, false))
        .await
        .unwrap();

    // Solo play: the first answer settles the round immediately
    let first = handle_message(
        ClientMessage::SubmitAnswer {
            room_id: room_id.clone(),
            answer: "A".to_string(),
        },
        &p1,
        &state,
    )
    .await;
    assert!(first.is_none());

    let second = handle_message(
        ClientMessage::SubmitAnswer {
            room_id: room_id.clone(),
            answer: "B".to_string(),
        },
        &p1,
        &state,
    )
    .await;
    match second {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "DUPLICATE_ANSWER"),
        other => panic!("Expected duplicate rejection, got {:?}", other),
    }

    let room = state.get_room(&room_id).await.unwrap();
    assert_eq!(room.current_answers.get(&p1).unwrap(), "A");
}

/// Solo reveal-only game: immediate start, no handshake, no points.
#[tokio::test]
async fn test_solo_game_flow() {
    let state = fixed_state(2, 0);
    let (room, p1) = state.create_room("Ana".to_string(), AppMode::Solo).await;
    let room_id = room.id.clone();
    assert_eq!(room.status, RoomStatus::Selecting);

    state
        .start_game(&room_id, &p1, settings(GameStyle::RevealOnly, 2, false))
        .await
        .unwrap();

    for _ in 0..2 {
        state
            .submit_answer(&room_id, &p1, "A".to_string())
            .await
            .unwrap();
        state.ready_for_next(&room_id, &p1).await.unwrap();
    }

    let room = state.get_room(&room_id).await.unwrap();
    assert_eq!(room.status, RoomStatus::Completed);
    assert_eq!(room.players[0].score, 0);
}

#[tokio::test]
async fn test_content_shortage_surfaces_to_the_authority() {
    let state = fixed_state(1, 0);
    let (room, p1) = state.create_room("Ana".to_string(), AppMode::Solo).await;

    let response = handle_message(
        ClientMessage::StartGame {
            room_id: room.id.clone(),
            settings: settings(GameStyle::RevealOnly, 3, false),
        },
        &p1,
        &state,
    )
    .await;

    match response {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "CONTENT_SHORTAGE"),
        other => panic!("Expected content shortage, got {:?}", other),
    }
    assert_eq!(
        state.get_room(&room.id).await.unwrap().status,
        RoomStatus::Selecting
    );
}

/// Mid-game departure ends the session with a reason the survivor's UI can
/// distinguish from a normal finish.
#[tokio::test]
async fn test_disconnect_mid_game_notifies_survivor() {
    let state = fixed_state(3, 0);
    let (room, p1) = state
        .create_room("Ana".to_string(), AppMode::TwoPlayer)
        .await;
    let room_id = room.id.clone();
    let (_, p2) = state.join_room(&room_id, "Ben".to_string()).await.unwrap();
    state
        .start_game(&room_id, &p1, settings(GameStyle::Prediction, 3, false))
        .await
        .unwrap();
    state.confirm_start(&room_id, &p2).await.unwrap();
    let mut rx = state.subscribe(&room_id).await.expect("room channel");

    state.handle_disconnect(&room_id, &p2).await;

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| {
        matches!(&e.message, ServerMessage::PlayerLeft { nickname, .. } if nickname == "Ben")
    }));
    assert!(events.iter().any(|e| matches!(
        &e.message,
        ServerMessage::GameOver {
            reason: GameOverReason::OpponentLeft,
            ..
        }
    )));
}

/// Reset returns a completed room to configuration and a second game works.
#[tokio::test]
async fn test_reset_allows_a_second_game() {
    let state = fixed_state(3, 0);
    let (room, p1) = state
        .create_room("Ana".to_string(), AppMode::TwoPlayer)
        .await;
    let room_id = room.id.clone();
    let (_, p2) = state.join_room(&room_id, "Ben".to_string()).await.unwrap();
    state
        .start_game(&room_id, &p1, settings(GameStyle::Prediction, 1, false))
        .await
        .unwrap();
    state.confirm_start(&room_id, &p2).await.unwrap();

    state
        .submit_answer(&room_id, &p1, "A".to_string())
        .await
        .unwrap();
    state
        .submit_answer(&room_id, &p2, "A".to_string())
        .await
        .unwrap();
    state
        .submit_prediction(&room_id, &p1, &p2, "A".to_string())
        .await
        .unwrap();
    state
        .submit_prediction(&room_id, &p2, &p1, "B".to_string())
        .await
        .unwrap();
    state.ready_for_next(&room_id, &p1).await.unwrap();
    state.ready_for_next(&room_id, &p2).await.unwrap();
    assert_eq!(
        state.get_room(&room_id).await.unwrap().status,
        RoomStatus::Completed
    );

    let response = handle_message(
        ClientMessage::ResetRoom {
            room_id: room_id.clone(),
        },
        &p1,
        &state,
    )
    .await;
    assert!(response.is_none());

    let room = state.get_room(&room_id).await.unwrap();
    assert_eq!(room.status, RoomStatus::Selecting);
    assert!(room.players.iter().all(|p| p.score == 0));
    assert!(room.settings.is_none());

    // The room can host a fresh game
    state
        .start_game(&room_id, &p1, settings(GameStyle::RevealOnly, 2, false))
        .await
        .unwrap();
    state.confirm_start(&room_id, &p2).await.unwrap();
    assert_eq!(
        state.get_room(&room_id).await.unwrap().status,
        RoomStatus::Playing
    );
}
