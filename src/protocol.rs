use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        nickname: String,
        app_mode: AppMode,
    },
    JoinRoom {
        room_id: RoomId,
        nickname: String,
    },
    /// Authority-only. In a full two-player room this proposes the settings
    /// to the other participant instead of starting outright.
    StartGame {
        room_id: RoomId,
        settings: GameSettings,
    },
    /// The non-authority participant's acknowledgment of a proposed start
    ConfirmStart {
        room_id: RoomId,
    },
    SubmitAnswer {
        room_id: RoomId,
        answer: String,
    },
    SubmitPrediction {
        room_id: RoomId,
        target_id: PlayerId,
        answer: String,
    },
    /// Acknowledge round results; the round advances once everyone has
    ReadyForNext {
        room_id: RoomId,
    },
    /// Round timer expiry, signalled by the transport layer
    RoundTimeout {
        room_id: RoomId,
    },
    ToggleExclusiveMode {
        room_id: RoomId,
        enabled: bool,
    },
    EndExclusiveMode {
        room_id: RoomId,
    },
    ResetRoom {
        room_id: RoomId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        room: RoomInfo,
        player_id: PlayerId,
    },
    RoomJoined {
        room: RoomInfo,
        player_id: PlayerId,
    },
    /// Broadcast when the second participant joins and the room can configure
    RoomReady {
        room: RoomInfo,
    },
    /// Sent to the non-authority participant: proposed game configuration
    StartProposed {
        settings: GameSettings,
        proposed_by: PlayerId,
    },
    /// Sent to the authority while their start awaits confirmation
    StartPending,
    GameStarted {
        room: RoomInfo,
        round: u32,
        question: QuestionInfo,
        server_now: String,
    },
    NewRound {
        round: u32,
        question: QuestionInfo,
        server_now: String,
    },
    /// All required inputs are in; clients stop their round timers
    RoundComplete {
        round: u32,
    },
    RoundResults {
        round: u32,
        results: RoundResult,
        scores: Vec<PlayerInfo>,
    },
    PlayerLeft {
        player_id: PlayerId,
        nickname: String,
    },
    GameOver {
        reason: GameOverReason,
        scores: Vec<PlayerInfo>,
    },
    ExclusiveModeUpdate {
        active: bool,
        /// Questions left in the exclusive queue
        remaining: usize,
    },
    /// Sent to the authority when the exclusive pool came back empty and the
    /// game fell back to standard content
    ExclusiveUnavailable,
    RoomReset {
        room: RoomInfo,
    },
    Error {
        code: String,
        msg: String,
    },
}

/// Public room snapshot. Per-round answers and predictions are deliberately
/// absent so a participant can never see the other's submission mid-round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: RoomId,
    pub app_mode: AppMode,
    pub status: RoomStatus,
    pub players: Vec<PlayerInfo>,
    pub settings: Option<GameSettings>,
    pub current_round: u32,
    pub exclusive_mode_active: bool,
}

impl From<&Room> for RoomInfo {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            app_mode: room.app_mode,
            status: room.status.clone(),
            players: room.players.iter().map(Into::into).collect(),
            settings: room.settings.clone(),
            current_round: room.current_round,
            exclusive_mode_active: room.exclusive_mode_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub nickname: String,
    pub score: u32,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            nickname: p.nickname.clone(),
            score: p.score,
        }
    }
}

/// Question as shown to participants (tier and category stay internal)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionInfo {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionInfo {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}
