use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Opaque ID types for type safety
pub type RoomId = String;
pub type PlayerId = String;
pub type QuestionId = String;

/// Sentinel recorded for a participant who missed the round timer. It exists
/// purely to unblock the round barrier and never earns points.
pub const TIME_EXPIRED_ANSWER: &str = "[Time Expired]";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    Selecting,
    Playing,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    Solo,
    TwoPlayer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GameStyle {
    /// Players also guess each other's answers for points
    Prediction,
    /// Answers are revealed side by side, no scoring
    RevealOnly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Favorites,
    DailyLife,
    Memories,
    WouldYouRather,
    Intimacy,
}

/// Content rating of a question. Ordered: a game configured with a given tier
/// ceiling is eligible for every question at or below that tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentTier {
    Mild,
    Spicy,
    Explicit,
}

impl ContentTier {
    /// The gated top tier served by exclusive mode.
    pub const EXCLUSIVE: ContentTier = ContentTier::Explicit;
}

/// Configuration chosen at game start, immutable during play.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSettings {
    pub category: Category,
    pub style: GameStyle,
    pub content_tier: ContentTier,
    /// Per-round answer timer in seconds, driven by the transport layer
    pub round_seconds: u32,
    pub total_rounds: u32,
    #[serde(default)]
    pub exclusive_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub tier: ContentTier,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    /// Monotonically non-decreasing during a game, reset to 0 at game start
    pub score: u32,
}

/// One participant's guess at another participant's answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub target_id: PlayerId,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    /// All rounds played (or the exclusive queue ran dry)
    Finished,
    /// A participant disconnected mid-game
    OpponentLeft,
    /// The authority ended an exclusive session
    ExclusiveEnded,
}

/// Unit of a single game session. Mutated in place for its whole life and
/// destroyed when the last participant departs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Insertion order = join order; index 0 is the authority
    pub players: Vec<Player>,
    pub app_mode: AppMode,
    pub status: RoomStatus,
    pub settings: Option<GameSettings>,
    /// Batch assigned for the whole game in standard mode (index = round - 1)
    pub questions: Vec<Question>,
    /// The prompt in play this round, batch-indexed or dequeued
    pub current_question: Option<Question>,
    /// 1-based; 0 before play begins
    pub current_round: u32,
    pub current_answers: HashMap<PlayerId, String>,
    pub current_predictions: HashMap<PlayerId, Prediction>,
    pub ready_for_next: HashSet<PlayerId>,
    /// Results for the current round have been computed and emitted
    pub round_settled: bool,
    pub exclusive_mode_active: bool,
    pub exclusive_queue: VecDeque<Question>,
    /// Settings awaiting the second participant's confirmation
    pub pending_start: Option<GameSettings>,
}

impl Room {
    pub fn new(id: RoomId, app_mode: AppMode, creator: Player) -> Self {
        let status = match app_mode {
            AppMode::Solo => RoomStatus::Selecting,
            AppMode::TwoPlayer => RoomStatus::Waiting,
        };
        Self {
            id,
            players: vec![creator],
            app_mode,
            status,
            settings: None,
            questions: Vec::new(),
            current_question: None,
            current_round: 0,
            current_answers: HashMap::new(),
            current_predictions: HashMap::new(),
            ready_for_next: HashSet::new(),
            round_settled: false,
            exclusive_mode_active: false,
            exclusive_queue: VecDeque::new(),
            pending_start: None,
        }
    }

    pub fn is_member(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// The authority is always the first participant to have joined.
    pub fn is_authority(&self, player_id: &str) -> bool {
        self.players.first().is_some_and(|p| p.id == player_id)
    }

    pub fn authority_id(&self) -> Option<&PlayerId> {
        self.players.first().map(|p| &p.id)
    }

    pub fn other_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id != player_id)
    }

    /// Clear everything scoped to a single round.
    pub fn clear_round_state(&mut self) {
        self.current_answers.clear();
        self.current_predictions.clear();
        self.ready_for_next.clear();
        self.round_settled = false;
    }
}

/// Emitted once per round; not retained. The authoritative score lives on
/// Player only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundResult {
    pub question_id: QuestionId,
    pub question_text: String,
    pub outcomes: Vec<PlayerOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerOutcome {
    pub player_id: PlayerId,
    pub nickname: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_target_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct_prediction: Option<bool>,
    pub points_earned: u32,
}
