pub mod memory;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AnswerSubmissionEntity, GameEntity, GameStatus, QuestionEntity, QuestionInstanceEntity,
    QuestionUsageEntity, RoundEntity, TeamEntity, TeamMembershipEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::state_machine::PresentationState;

/// Field updates applied alongside a presentation-state transition, as one
/// conditional write against the game row.
#[derive(Debug, Clone, Default)]
pub struct GameStateUpdate {
    /// New lifecycle status, if the transition flips it.
    pub set_status: Option<GameStatus>,
    /// Stamp `started_at` with the write time.
    pub stamp_started_at: bool,
    /// Stamp `completed_at` with the write time.
    pub stamp_completed_at: bool,
    /// Move the question cursor forward by one.
    pub increment_question_index: bool,
}

/// Abstraction over the persistence layer for games and their satellites.
///
/// Beyond plain row CRUD the trait captures the three capabilities the core
/// leans on: uniqueness constraints (join code, team name, membership, one
/// answer per team per question), compare-and-swap updates on the game row,
/// and the usage-ledger anti-join behind question selection.
pub trait GameStore: Send + Sync {
    /// Persist a new game row. Fails with a join-code conflict when another
    /// active/recent game already holds the code.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game by primary key.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Fetch a game by join code.
    fn find_game_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Apply a presentation-state transition if and only if the row is still
    /// in `expected`. Returns the updated row; `StaleState` otherwise.
    fn update_game_state(
        &self,
        id: Uuid,
        expected: PresentationState,
        next: PresentationState,
        update: GameStateUpdate,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Conditionally flip the lifecycle status (e.g. active → paused).
    /// Returns the updated row; `StaleState` when the status moved on.
    fn update_game_status(
        &self,
        id: Uuid,
        expected: GameStatus,
        next: GameStatus,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Record a host heartbeat timestamp.
    fn record_host_heartbeat(
        &self,
        id: Uuid,
        seen_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Games currently in `Active` status, for the presence scan.
    fn list_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Remove a game and every dependent row. Used as the compensating
    /// delete when creation fails partway.
    fn delete_game_cascade(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    /// Persist the rounds created with a game.
    fn insert_rounds(&self, rounds: Vec<RoundEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Rounds of a game ordered by position.
    fn find_rounds(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>>;

    /// Persist the question instances created with a game.
    fn insert_question_instances(
        &self,
        instances: Vec<QuestionInstanceEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch an instance by primary key.
    fn find_question_instance(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionInstanceEntity>>>;
    /// All instances of a game ordered by position.
    fn find_question_instances(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionInstanceEntity>>>;
    /// Fetch the instance at a display position of a game.
    fn find_instance_at(
        &self,
        game_id: Uuid,
        position: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionInstanceEntity>>>;
    /// Stamp `revealed_at` if it is still null. Returns whether this call
    /// performed the stamp; a duplicate reveal leaves the original value.
    fn mark_revealed(
        &self,
        id: Uuid,
        revealed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Swap the catalog question and seed of an instance (question recycle).
    fn replace_instance_question(
        &self,
        id: Uuid,
        question_id: Uuid,
        seed: i64,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Catalog question by primary key.
    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Seed catalog questions (setup tooling and tests).
    fn insert_questions(
        &self,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Anti-join of the catalog against the host's usage ledger, optionally
    /// filtered to the given categories.
    fn unused_questions(
        &self,
        host_id: String,
        categories: Option<Vec<String>>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Claim a (host, question) usage record; conflict if already claimed.
    fn claim_question_usage(
        &self,
        usage: QuestionUsageEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Drop a usage record (rollback of a failed game creation).
    fn release_question_usage(
        &self,
        host_id: String,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically release one usage record and claim another (recycle).
    fn swap_question_usage(
        &self,
        host_id: String,
        release: Uuid,
        claim: Uuid,
        used_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert a team; conflict when the name is taken within the game.
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a team by primary key.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Teams of a game in creation order.
    fn find_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Insert a membership; conflict when the player already belongs to a
    /// team in this game, or when the team already holds `max_members`.
    /// The capacity check and the insert are one atomic step, so two racing
    /// joins cannot both land on the last slot.
    fn insert_membership(
        &self,
        membership: TeamMembershipEntity,
        max_members: u32,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Membership of a player in a game, if any.
    fn find_membership(
        &self,
        game_id: Uuid,
        player_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamMembershipEntity>>>;
    /// Number of players currently on a team.
    fn count_team_members(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Insert an answer submission through the (instance, team) uniqueness
    /// constraint, applying its scoring delta to the team in the same write.
    /// This is the sole mechanism behind first-submission-wins; bundling the
    /// score means an accepted submission can never end up unscored.
    fn insert_answer_submission(
        &self,
        submission: AnswerSubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Number of distinct teams that have answered an instance.
    fn count_answered_teams(
        &self,
        question_instance_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// Lightweight backend liveness probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
