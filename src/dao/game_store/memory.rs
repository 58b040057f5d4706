//! In-memory reference implementation of [`GameStore`].
//!
//! Production deployments are expected to point the trait at a real database;
//! this store exists to make the boundary contracts (uniqueness constraints,
//! compare-and-swap updates, the usage-ledger anti-join) concrete and
//! testable. Atomicity of each constraint comes from the `DashMap` entry API
//! (one shard lock per key), mirroring what a database unique index provides.

use std::sync::Arc;
use std::time::SystemTime;

use dashmap::{DashMap, Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AnswerSubmissionEntity, GameEntity, GameStatus, QuestionEntity, QuestionInstanceEntity,
    QuestionUsageEntity, RoundEntity, TeamEntity, TeamMembershipEntity,
};
use crate::dao::storage::{StorageError, StorageResult, UniqueConstraint};
use crate::state::state_machine::PresentationState;

use super::{GameStateUpdate, GameStore};

/// In-memory [`GameStore`] backed by concurrent hash tables.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    games: DashMap<Uuid, GameEntity>,
    // Join-code uniqueness index, code -> game id.
    codes: DashMap<String, Uuid>,
    rounds: DashMap<Uuid, RoundEntity>,
    instances: DashMap<Uuid, QuestionInstanceEntity>,
    questions: DashMap<Uuid, QuestionEntity>,
    // Usage ledger keyed by (host, question).
    usage: DashMap<(String, Uuid), QuestionUsageEntity>,
    teams: DashMap<Uuid, TeamEntity>,
    // Team-name-per-game uniqueness index.
    team_names: DashMap<(Uuid, String), Uuid>,
    memberships: DashMap<Uuid, TeamMembershipEntity>,
    // One-team-per-player-per-game uniqueness index.
    member_index: DashMap<(Uuid, String), Uuid>,
    // Member count per team; its entry lock serializes capacity checks.
    team_sizes: DashMap<Uuid, u64>,
    // Submissions keyed by (question instance, team): the core constraint.
    submissions: DashMap<(Uuid, Uuid), AnswerSubmissionEntity>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            match inner.codes.entry(game.join_code.clone()) {
                Entry::Occupied(_) => Err(StorageError::conflict(UniqueConstraint::GameJoinCode)),
                Entry::Vacant(slot) => {
                    slot.insert(game.id);
                    inner.games.insert(game.id, game);
                    Ok(())
                }
            }
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.games.get(&id).map(|row| row.clone())) })
    }

    fn find_game_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(id) = inner.codes.get(&code).map(|row| *row) else {
                return Ok(None);
            };
            Ok(inner.games.get(&id).map(|row| row.clone()))
        })
    }

    fn update_game_state(
        &self,
        id: Uuid,
        expected: PresentationState,
        next: PresentationState,
        update: GameStateUpdate,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut game = inner
                .games
                .get_mut(&id)
                .ok_or_else(|| StorageError::Missing {
                    what: format!("game {id}"),
                })?;

            if game.presentation_state != expected {
                return Err(StorageError::StaleState {
                    message: format!(
                        "expected {expected:?}, found {:?}",
                        game.presentation_state
                    ),
                });
            }

            let now = SystemTime::now();
            game.presentation_state = next;
            if let Some(status) = update.set_status {
                game.status = status;
            }
            if update.stamp_started_at {
                game.started_at = Some(now);
            }
            if update.stamp_completed_at {
                game.completed_at = Some(now);
            }
            if update.increment_question_index {
                game.current_question_index += 1;
            }
            game.updated_at = now;

            Ok(game.clone())
        })
    }

    fn update_game_status(
        &self,
        id: Uuid,
        expected: GameStatus,
        next: GameStatus,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut game = inner
                .games
                .get_mut(&id)
                .ok_or_else(|| StorageError::Missing {
                    what: format!("game {id}"),
                })?;

            if game.status != expected {
                return Err(StorageError::StaleState {
                    message: format!("expected {expected:?}, found {:?}", game.status),
                });
            }

            game.status = next;
            game.updated_at = SystemTime::now();
            Ok(game.clone())
        })
    }

    fn record_host_heartbeat(
        &self,
        id: Uuid,
        seen_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut game = inner
                .games
                .get_mut(&id)
                .ok_or_else(|| StorageError::Missing {
                    what: format!("game {id}"),
                })?;
            game.host_seen_at = Some(seen_at);
            Ok(())
        })
    }

    fn list_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .games
                .iter()
                .filter(|row| row.status == GameStatus::Active)
                .map(|row| row.clone())
                .collect())
        })
    }

    fn delete_game_cascade(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some((_, game)) = inner.games.remove(&id) {
                inner.codes.remove(&game.join_code);
            }
            inner.rounds.retain(|_, round| round.game_id != id);

            let instance_ids: Vec<Uuid> = inner
                .instances
                .iter()
                .filter(|row| row.game_id == id)
                .map(|row| row.id)
                .collect();
            inner.instances.retain(|_, instance| instance.game_id != id);
            inner
                .submissions
                .retain(|(instance_id, _), _| !instance_ids.contains(instance_id));

            let team_ids: Vec<Uuid> = inner
                .teams
                .iter()
                .filter(|row| row.game_id == id)
                .map(|row| row.id)
                .collect();
            inner.teams.retain(|_, team| team.game_id != id);
            inner.team_names.retain(|(game_id, _), _| *game_id != id);
            inner
                .team_sizes
                .retain(|team_id, _| !team_ids.contains(team_id));
            inner
                .memberships
                .retain(|_, membership| membership.game_id != id);
            inner.member_index.retain(|(game_id, _), _| *game_id != id);
            Ok(())
        })
    }

    fn insert_rounds(&self, rounds: Vec<RoundEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            for round in rounds {
                inner.rounds.insert(round.id, round);
            }
            Ok(())
        })
    }

    fn find_rounds(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut rounds: Vec<RoundEntity> = inner
                .rounds
                .iter()
                .filter(|row| row.game_id == game_id)
                .map(|row| row.clone())
                .collect();
            rounds.sort_by_key(|round| round.position);
            Ok(rounds)
        })
    }

    fn insert_question_instances(
        &self,
        instances: Vec<QuestionInstanceEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            for instance in instances {
                inner.instances.insert(instance.id, instance);
            }
            Ok(())
        })
    }

    fn find_question_instance(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionInstanceEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.instances.get(&id).map(|row| row.clone())) })
    }

    fn find_question_instances(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionInstanceEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut instances: Vec<QuestionInstanceEntity> = inner
                .instances
                .iter()
                .filter(|row| row.game_id == game_id)
                .map(|row| row.clone())
                .collect();
            instances.sort_by_key(|instance| instance.position);
            Ok(instances)
        })
    }

    fn find_instance_at(
        &self,
        game_id: Uuid,
        position: u32,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionInstanceEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .instances
                .iter()
                .find(|row| row.game_id == game_id && row.position == position)
                .map(|row| row.clone()))
        })
    }

    fn mark_revealed(
        &self,
        id: Uuid,
        revealed_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut instance =
                inner
                    .instances
                    .get_mut(&id)
                    .ok_or_else(|| StorageError::Missing {
                        what: format!("question instance {id}"),
                    })?;
            if instance.revealed_at.is_some() {
                return Ok(false);
            }
            instance.revealed_at = Some(revealed_at);
            Ok(true)
        })
    }

    fn replace_instance_question(
        &self,
        id: Uuid,
        question_id: Uuid,
        seed: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut instance =
                inner
                    .instances
                    .get_mut(&id)
                    .ok_or_else(|| StorageError::Missing {
                        what: format!("question instance {id}"),
                    })?;
            instance.question_id = question_id;
            instance.seed = seed;
            Ok(())
        })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.questions.get(&id).map(|row| row.clone())) })
    }

    fn insert_questions(
        &self,
        questions: Vec<QuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            for question in questions {
                inner.questions.insert(question.id, question);
            }
            Ok(())
        })
    }

    fn unused_questions(
        &self,
        host_id: String,
        categories: Option<Vec<String>>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut matches: Vec<QuestionEntity> = inner
                .questions
                .iter()
                .filter(|row| {
                    categories
                        .as_ref()
                        .is_none_or(|wanted| wanted.contains(&row.category))
                })
                .filter(|row| !inner.usage.contains_key(&(host_id.clone(), row.id)))
                .map(|row| row.clone())
                .collect();
            // Stable order so selection is reproducible in tests.
            matches.sort_by(|a, b| (&a.category, &a.text).cmp(&(&b.category, &b.text)));
            Ok(matches)
        })
    }

    fn claim_question_usage(
        &self,
        usage: QuestionUsageEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            match inner
                .usage
                .entry((usage.host_id.clone(), usage.question_id))
            {
                Entry::Occupied(_) => Err(StorageError::conflict(UniqueConstraint::QuestionUsage)),
                Entry::Vacant(slot) => {
                    slot.insert(usage);
                    Ok(())
                }
            }
        })
    }

    fn release_question_usage(
        &self,
        host_id: String,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.usage.remove(&(host_id, question_id));
            Ok(())
        })
    }

    fn swap_question_usage(
        &self,
        host_id: String,
        release: Uuid,
        claim: Uuid,
        used_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            match inner.usage.entry((host_id.clone(), claim)) {
                Entry::Occupied(_) => Err(StorageError::conflict(UniqueConstraint::QuestionUsage)),
                Entry::Vacant(slot) => {
                    slot.insert(QuestionUsageEntity {
                        host_id: host_id.clone(),
                        question_id: claim,
                        used_at,
                    });
                    inner.usage.remove(&(host_id, release));
                    Ok(())
                }
            }
        })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            match inner.team_names.entry((team.game_id, team.name.clone())) {
                Entry::Occupied(_) => {
                    Err(StorageError::conflict(UniqueConstraint::TeamNamePerGame))
                }
                Entry::Vacant(slot) => {
                    slot.insert(team.id);
                    inner.teams.insert(team.id, team);
                    Ok(())
                }
            }
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.teams.get(&id).map(|row| row.clone())) })
    }

    fn find_teams(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut teams: Vec<TeamEntity> = inner
                .teams
                .iter()
                .filter(|row| row.game_id == game_id)
                .map(|row| row.clone())
                .collect();
            teams.sort_by(|a, b| (a.created_at, &a.name).cmp(&(b.created_at, &b.name)));
            Ok(teams)
        })
    }

    fn insert_membership(
        &self,
        membership: TeamMembershipEntity,
        max_members: u32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            match inner
                .member_index
                .entry((membership.game_id, membership.player_id.clone()))
            {
                Entry::Occupied(_) => {
                    Err(StorageError::conflict(UniqueConstraint::OneTeamPerPlayer))
                }
                Entry::Vacant(slot) => {
                    // Claim the seat while holding the size entry, so the
                    // check and the bump cannot interleave with another join.
                    let mut size = inner.team_sizes.entry(membership.team_id).or_insert(0);
                    if *size >= u64::from(max_members) {
                        return Err(StorageError::conflict(UniqueConstraint::TeamCapacity));
                    }
                    *size += 1;
                    drop(size);
                    slot.insert(membership.id);
                    inner.memberships.insert(membership.id, membership);
                    Ok(())
                }
            }
        })
    }

    fn find_membership(
        &self,
        game_id: Uuid,
        player_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamMembershipEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(id) = inner
                .member_index
                .get(&(game_id, player_id))
                .map(|row| *row)
            else {
                return Ok(None);
            };
            Ok(inner.memberships.get(&id).map(|row| row.clone()))
        })
    }

    fn count_team_members(&self, team_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .team_sizes
                .get(&team_id)
                .map(|size| *size)
                .unwrap_or(0))
        })
    }

    fn insert_answer_submission(
        &self,
        submission: AnswerSubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            match inner
                .submissions
                .entry((submission.question_instance_id, submission.team_id))
            {
                Entry::Occupied(_) => {
                    Err(StorageError::conflict(UniqueConstraint::OneAnswerPerTeam))
                }
                Entry::Vacant(slot) => {
                    let mut team = inner
                        .teams
                        .get_mut(&submission.team_id)
                        .ok_or_else(|| StorageError::Missing {
                            what: format!("team {}", submission.team_id),
                        })?;
                    if submission.correct {
                        team.correct_count += 1;
                    }
                    team.total_response_ms += submission.elapsed_ms;
                    drop(team);
                    slot.insert(submission);
                    Ok(())
                }
            }
        })
    }

    fn count_answered_teams(
        &self,
        question_instance_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .submissions
                .iter()
                .filter(|row| row.question_instance_id == question_instance_id)
                .count() as u64)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
