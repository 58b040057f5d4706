//! Role-scoped projections of the current question.
//!
//! One canonical QuestionInstance+Question join fans out into three explicit
//! types rather than one loosely-filled object: what a role must not know is
//! a field its view simply does not have.

use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

/// Everything the host's control screen needs, correctness included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HostQuestionView {
    /// Question instance identifier.
    pub game_question_id: Uuid,
    /// Category the question belongs to.
    pub category: String,
    /// Question text.
    pub text: String,
    /// The four answers in shuffled display order.
    pub answers: Vec<String>,
    /// Display index of the correct answer.
    pub correct_answer_index: usize,
    /// Whether the answer has been revealed.
    pub revealed: bool,
}

/// What a player device may see. No seed, no letter mapping; the correct
/// index appears only once the host has revealed it.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerQuestionView {
    /// Question instance identifier.
    pub game_question_id: Uuid,
    /// Category the question belongs to.
    pub category: String,
    /// Question text.
    pub text: String,
    /// The four answers in shuffled display order.
    pub answers: Vec<String>,
    /// Display index of the correct answer, post-reveal only.
    pub correct_answer_index: Option<usize>,
}

/// The shared TV display: question plus answer-progress counters.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TvQuestionView {
    /// Question instance identifier.
    pub game_question_id: Uuid,
    /// Category the question belongs to.
    pub category: String,
    /// Question text.
    pub text: String,
    /// The four answers in shuffled display order.
    pub answers: Vec<String>,
    /// Display index of the correct answer, post-reveal only.
    pub correct_answer_index: Option<usize>,
    /// Number of teams that have locked in an answer.
    pub teams_answered_count: u64,
    /// Total teams in the game.
    pub total_teams: u64,
}

/// The role-appropriate question view inside a catch-up snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RoleQuestionView {
    /// Host projection.
    Host(HostQuestionView),
    /// Player projection.
    Player(PlayerQuestionView),
    /// TV projection.
    Tv(TvQuestionView),
}
