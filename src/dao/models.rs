use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    shuffle::{ANSWER_COUNT, AnswerKey},
    state::state_machine::{GamePlan, PresentationState},
};

/// Coarse lifecycle status of a game, orthogonal to the presentation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Game exists, host still configuring and teams still joining.
    Setup,
    /// Game underway; submissions allowed when the presentation state permits.
    Active,
    /// Host lost; submissions suspended until the host returns.
    Paused,
    /// Game over; all rows read-only.
    Completed,
}

/// One trivia session, the single mutable aggregate of the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Opaque principal identifier of the owning host.
    pub host_id: String,
    /// Human-readable join code (6 uppercase alphanumeric characters).
    pub join_code: String,
    /// Coarse lifecycle status.
    pub status: GameStatus,
    /// Fine-grained shared-screen state.
    pub presentation_state: PresentationState,
    /// Round/question layout fixed at creation.
    pub plan: GamePlan,
    /// Advisory per-question time limit in seconds (drives client countdowns).
    pub time_limit_secs: u32,
    /// Minimum players per team.
    pub min_team_size: u32,
    /// Maximum players per team.
    pub max_team_size: u32,
    /// Zero-based cursor into the game's question instances, monotonic
    /// non-decreasing while active.
    pub current_question_index: u32,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
    /// Stamped when the game flips to active.
    pub started_at: Option<SystemTime>,
    /// Stamped when the game completes.
    pub completed_at: Option<SystemTime>,
    /// Last host heartbeat, used for absence detection.
    pub host_seen_at: Option<SystemTime>,
}

/// Ordered subdivision of a game; immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Primary key of the round.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Zero-based position within the game.
    pub position: u32,
    /// Categories its questions were sourced from.
    pub categories: Vec<String>,
}

/// Reusable question from the shared catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Category the question belongs to.
    pub category: String,
    /// Question text.
    pub text: String,
    /// The four answers in authored order (A through D).
    pub answers: [String; ANSWER_COUNT],
    /// Which authored answer is correct. Server-side knowledge only.
    pub correct: AnswerKey,
}

/// A question bound to a specific game position, carrying its shuffle seed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionInstanceEntity {
    /// Primary key of the instance.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Owning round.
    pub round_id: Uuid,
    /// Zero-based display position within the game.
    pub position: u32,
    /// Catalog question shown at this position.
    pub question_id: Uuid,
    /// Randomization seed fixing the answer shuffle for every client.
    pub seed: i64,
    /// Set exactly once when the host reveals the answer.
    pub revealed_at: Option<SystemTime>,
}

/// A team competing in one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Primary key of the team.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Display name, unique within the game.
    pub name: String,
    /// Accumulated correct-answer count.
    pub correct_count: u32,
    /// Accumulated response time in milliseconds, tie-break only.
    pub total_response_ms: u64,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Membership of one player in one team, at most one per game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMembershipEntity {
    /// Primary key of the membership.
    pub id: Uuid,
    /// Owning game (denormalized for the one-team-per-game constraint).
    pub game_id: Uuid,
    /// Team joined.
    pub team_id: Uuid,
    /// Opaque principal identifier of the player.
    pub player_id: String,
}

/// One team's single attempt at one question instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerSubmissionEntity {
    /// Primary key of the submission.
    pub id: Uuid,
    /// Question instance answered.
    pub question_instance_id: Uuid,
    /// Team the submission counts for.
    pub team_id: Uuid,
    /// Which team member pressed the button.
    pub submitter_id: String,
    /// Canonical answer key chosen, mapped back from the shuffled index.
    pub answer_key: AnswerKey,
    /// Whether the chosen answer was correct.
    pub correct: bool,
    /// Response time in milliseconds as reported by the client.
    pub elapsed_ms: u64,
    /// Server-side submission timestamp.
    pub submitted_at: SystemTime,
}

/// Marks a (host, question) pair as consumed across all of that host's games.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionUsageEntity {
    /// Host whose pool the question is removed from.
    pub host_id: String,
    /// Consumed question.
    pub question_id: Uuid,
    /// When the question was claimed.
    pub used_at: SystemTime,
}
