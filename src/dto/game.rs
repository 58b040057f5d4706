use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, GameStatus, TeamEntity},
    dto::{format_system_time, views::RoleQuestionView},
    state::state_machine::{GamePlan, PresentationState},
};

/// Payload used to bootstrap a brand-new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// Number of rounds.
    #[validate(range(min = 1, max = 10))]
    pub num_rounds: u32,
    /// Questions per round.
    #[validate(range(min = 1, max = 20))]
    pub questions_per_round: u32,
    /// Advisory per-question countdown in seconds.
    #[validate(range(min = 5, max = 300))]
    pub time_limit_secs: u32,
    /// Minimum players per team.
    #[serde(default = "default_min_team_size")]
    #[validate(range(min = 1, max = 10))]
    pub min_team_size: u32,
    /// Maximum players per team.
    #[serde(default = "default_max_team_size")]
    #[validate(range(min = 1, max = 10))]
    pub max_team_size: u32,
    /// Requested categories per round, one entry per round. An empty inner
    /// list means "any category".
    pub round_categories: Vec<Vec<String>>,
}

fn default_min_team_size() -> u32 {
    1
}

fn default_max_team_size() -> u32 {
    6
}

/// Summary returned once a game has been created or fetched.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Game identifier.
    pub id: Uuid,
    /// Human-readable join code.
    pub join_code: String,
    /// Coarse lifecycle status.
    pub status: GameStatus,
    /// Fine-grained shared-screen state.
    pub presentation_state: PresentationState,
    /// Round/question layout.
    pub plan: GamePlan,
    /// Zero-based question cursor.
    pub current_question_index: u32,
    /// Advisory per-question countdown in seconds.
    pub time_limit_secs: u32,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Start timestamp, RFC 3339, once active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Completion timestamp, RFC 3339, once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Teams in creation order with their standings.
    pub teams: Vec<TeamSummary>,
    /// Warnings produced at creation time (question supplementation).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a team exposed to REST/SSE clients.
pub struct TeamSummary {
    /// Team identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Accumulated correct answers.
    pub correct_count: u32,
    /// Accumulated response time in milliseconds, tie-break only.
    pub total_response_ms: u64,
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            correct_count: team.correct_count,
            total_response_ms: team.total_response_ms,
        }
    }
}

impl From<(GameEntity, Vec<TeamEntity>)> for GameSummary {
    fn from((game, teams): (GameEntity, Vec<TeamEntity>)) -> Self {
        Self {
            id: game.id,
            join_code: game.join_code,
            status: game.status,
            presentation_state: game.presentation_state,
            plan: game.plan,
            current_question_index: game.current_question_index,
            time_limit_secs: game.time_limit_secs,
            created_at: format_system_time(game.created_at),
            started_at: game.started_at.map(format_system_time),
            completed_at: game.completed_at.map(format_system_time),
            teams: teams.into_iter().map(Into::into).collect(),
            warnings: Vec::new(),
        }
    }
}

/// Which class of client is asking for a catch-up snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// The host's control screen.
    Host,
    /// A player device.
    Player,
    /// The shared TV display.
    Tv,
}

/// Query parameters of the snapshot endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SnapshotQuery {
    /// Requesting client role.
    pub role: ClientRole,
}

/// Authoritative catch-up snapshot a (re)connecting client applies as its
/// baseline before resuming live updates.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSnapshot {
    /// Current game record projection.
    pub game: GameSummary,
    /// Role-scoped view of the on-screen question, when one is showing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<RoleQuestionView>,
}
