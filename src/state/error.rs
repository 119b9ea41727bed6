use crate::protocol::ServerMessage;
use crate::types::{RoomId, RoomStatus};
use thiserror::Error;

/// Every rejection the orchestrator can produce. A rejected intent never
/// leaves room state partially mutated.
#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("you are not a member of this room")]
    NotAMember,
    #[error("only the room creator can do that")]
    NotAuthority,
    #[error("expected room status {expected:?}, but the room is {actual:?}")]
    WrongStatus {
        expected: RoomStatus,
        actual: RoomStatus,
    },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("no start proposal is awaiting confirmation")]
    NoPendingStart,
    #[error("the start proposal must be confirmed by the other player")]
    CannotConfirmOwnStart,
    #[error("not enough questions for {requested} rounds (found {available})")]
    ContentShortage { requested: usize, available: usize },
    #[error("answer already submitted for this round")]
    AnswerAlreadySubmitted,
    #[error("prediction already submitted for this round")]
    PredictionAlreadySubmitted,
    #[error("predictions are not part of this game style")]
    PredictionsNotEnabled,
    #[error("prediction target must be another player in the room")]
    InvalidPredictionTarget,
    #[error("round results are not in yet")]
    RoundNotSettled,
    #[error("exclusive mode is not active")]
    ExclusiveNotActive,
}

impl GameError {
    /// Stable code surfaced to clients alongside the human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            GameError::NotAMember => "NOT_A_MEMBER",
            GameError::NotAuthority => "NOT_AUTHORITY",
            GameError::WrongStatus { .. } => "WRONG_STATUS",
            GameError::InvalidSettings(_) => "INVALID_SETTINGS",
            GameError::NoPendingStart => "NO_PENDING_START",
            GameError::CannotConfirmOwnStart => "CANNOT_CONFIRM_OWN_START",
            GameError::ContentShortage { .. } => "CONTENT_SHORTAGE",
            GameError::AnswerAlreadySubmitted => "DUPLICATE_ANSWER",
            GameError::PredictionAlreadySubmitted => "DUPLICATE_PREDICTION",
            GameError::PredictionsNotEnabled => "PREDICTIONS_NOT_ENABLED",
            GameError::InvalidPredictionTarget => "INVALID_PREDICTION_TARGET",
            GameError::RoundNotSettled => "ROUND_NOT_SETTLED",
            GameError::ExclusiveNotActive => "EXCLUSIVE_NOT_ACTIVE",
        }
    }

    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::Error {
            code: self.code().to_string(),
            msg: self.to_string(),
        }
    }
}
