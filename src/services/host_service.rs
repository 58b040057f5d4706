//! Host-driven presentation transitions.
//!
//! The pure state machine decides the next state and its side effects; this
//! service applies the outcome as one conditional write against the game row
//! and broadcasts only after the write sticks. When two advance requests
//! race, the compare-and-swap lets exactly one through; the loser gets a
//! stale-state conflict and no duplicate broadcast.

use std::{sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        game_store::{GameStateUpdate, GameStore},
        models::{GameEntity, GameStatus, QuestionInstanceEntity},
    },
    dto::{events::BroadcastQuestion, game::GameSummary},
    error::ServiceError,
    services::{game_service, sse_events},
    shuffle,
    state::{
        SharedState,
        state_machine::{self, AdvanceOutcome, PresentationState, SideEffect},
    },
};

/// Advance the game's presentation state by one step.
///
/// A no-op on the terminal thank-you screen. The host calling this counts as
/// a heartbeat, so an auto-paused game resumes before advancing.
pub async fn advance(
    state: &SharedState,
    game_id: Uuid,
    host_id: &str,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let mut game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
    game_service::ensure_owner(&game, host_id)?;

    store.record_host_heartbeat(game_id, SystemTime::now()).await?;
    if game.status == GameStatus::Paused {
        game = resume(state, &store, game_id).await?;
    }

    let outcome = state_machine::advance(
        game.presentation_state,
        game.current_question_index,
        &game.plan,
    )?;

    let (next, effects) = match outcome {
        AdvanceOutcome::Finished => return game_service::summarize(state, game).await,
        AdvanceOutcome::Transition { next, effects } => (next, effects),
    };

    let mut update = GameStateUpdate::default();
    let mut stamp_reveal = false;
    for effect in &effects {
        match effect {
            SideEffect::ActivateGame => {
                ensure_rosters_ready(&store, &game).await?;
                update.set_status = Some(GameStatus::Active);
                update.stamp_started_at = true;
            }
            SideEffect::CompleteGame => {
                update.set_status = Some(GameStatus::Completed);
                update.stamp_completed_at = true;
            }
            SideEffect::IncrementQuestionIndex => update.increment_question_index = true,
            SideEffect::StampRevealedAt => stamp_reveal = true,
        }
    }

    let updated = store
        .update_game_state(game_id, game.presentation_state, next, update)
        .await?;

    if stamp_reveal {
        stamp_revealed(&store, &updated).await?;
    }

    // The transition already persisted; a failed read here only degrades the
    // broadcast, so the host still gets the summary it earned.
    if let Err(err) = publish_transition(state, &store, &updated).await {
        tracing::error!(error = %err, game_id = %game_id, "post-transition broadcast failed");
    }

    if next == PresentationState::GameThanks {
        // Terminal screen reached: subscribers see their streams close.
        state.fanout().remove(game_id);
    }

    game_service::summarize(state, updated).await
}

/// Record a host heartbeat, resuming the game when it was auto-paused.
pub async fn heartbeat(
    state: &SharedState,
    game_id: Uuid,
    host_id: &str,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
    game_service::ensure_owner(&game, host_id)?;

    store.record_host_heartbeat(game_id, SystemTime::now()).await?;

    let game = if game.status == GameStatus::Paused {
        resume(state, &store, game_id).await?
    } else {
        game
    };

    game_service::summarize(state, game).await
}

async fn resume(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<GameEntity, ServiceError> {
    match store
        .update_game_status(game_id, GameStatus::Paused, GameStatus::Active)
        .await
    {
        Ok(game) => {
            tracing::info!(game_id = %game_id, "host back; game resumed");
            sse_events::broadcast_game_resumed(state, game_id);
            Ok(game)
        }
        // Lost a race with the presence scan or another resume; re-read.
        Err(err) => match store.find_game(game_id).await? {
            Some(game) if game.status != GameStatus::Paused => Ok(game),
            _ => Err(err.into()),
        },
    }
}

/// The minimum team size binds at the start gate; every team formed during
/// setup must have its floor of players before the game activates.
async fn ensure_rosters_ready(
    store: &Arc<dyn GameStore>,
    game: &GameEntity,
) -> Result<(), ServiceError> {
    for team in store.find_teams(game.id).await? {
        let members = store.count_team_members(team.id).await?;
        if members < u64::from(game.min_team_size) {
            return Err(ServiceError::InvalidState(format!(
                "team `{}` needs at least {} player(s) to start",
                team.name, game.min_team_size
            )));
        }
    }
    Ok(())
}

async fn stamp_revealed(
    store: &Arc<dyn GameStore>,
    game: &GameEntity,
) -> Result<(), ServiceError> {
    let instance = current_instance(store, game).await?;
    let fresh = store.mark_revealed(instance.id, SystemTime::now()).await?;
    if !fresh {
        // Already stamped by an earlier attempt; the value is kept.
        tracing::debug!(instance_id = %instance.id, "revealed_at already stamped");
    }
    Ok(())
}

async fn publish_transition(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
    game: &GameEntity,
) -> Result<(), ServiceError> {
    match game.presentation_state {
        PresentationState::QuestionActive => {
            let instance = current_instance(store, game).await?;
            let question = store
                .find_question(instance.question_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::Invariant(format!(
                        "instance `{}` references missing question `{}`",
                        instance.id, instance.question_id
                    ))
                })?;
            let shuffled = shuffle::shuffle(&question.answers, question.correct, instance.seed);
            sse_events::broadcast_state_changed(
                state,
                game,
                Some(BroadcastQuestion {
                    id: question.id,
                    category: question.category,
                    text: question.text,
                    answers: shuffled.into_texts().into(),
                }),
                Some(instance.id),
                None,
            );
        }
        PresentationState::QuestionRevealed => {
            let instance = current_instance(store, game).await?;
            let question = store
                .find_question(instance.question_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::Invariant(format!(
                        "instance `{}` references missing question `{}`",
                        instance.id, instance.question_id
                    ))
                })?;
            let shuffled = shuffle::shuffle(&question.answers, question.correct, instance.seed);
            sse_events::broadcast_state_changed(
                state,
                game,
                None,
                Some(instance.id),
                Some(shuffled.correct_index()),
            );
        }
        _ => sse_events::broadcast_state_changed(state, game, None, None, None),
    }
    Ok(())
}

async fn current_instance(
    store: &Arc<dyn GameStore>,
    game: &GameEntity,
) -> Result<QuestionInstanceEntity, ServiceError> {
    store
        .find_instance_at(game.id, game.current_question_index)
        .await?
        .ok_or_else(|| {
            ServiceError::Invariant(format!(
                "game `{}` has no question instance at position {}",
                game.id, game.current_question_index
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{game_store::memory::MemoryGameStore, models::QuestionEntity},
        dto::{game::CreateGameRequest, play::CreateTeamRequest},
        services::team_service,
        shuffle::AnswerKey,
        state::{AppState, state_machine::GamePlan},
    };

    async fn hosted_game(num_rounds: u32, questions_per_round: u32) -> (SharedState, Uuid) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::default();
        let questions = (0..num_rounds * questions_per_round)
            .map(|i| QuestionEntity {
                id: Uuid::new_v4(),
                category: "General".into(),
                text: format!("q{i}"),
                answers: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct: AnswerKey::C,
            })
            .collect();
        store.insert_questions(questions).await.unwrap();
        state.set_game_store(Arc::new(store)).await;

        let summary = game_service::create_game(
            &state,
            "host-1",
            CreateGameRequest {
                num_rounds,
                questions_per_round,
                time_limit_secs: 30,
                min_team_size: 1,
                max_team_size: 6,
                round_categories: Vec::new(),
            },
        )
        .await
        .unwrap();
        (state, summary.id)
    }

    #[tokio::test]
    async fn first_advance_activates_the_game() {
        let (state, game_id) = hosted_game(1, 1).await;

        let summary = advance(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.status, GameStatus::Active);
        assert_eq!(summary.presentation_state, PresentationState::GameIntro);
        assert!(summary.started_at.is_some());
    }

    #[tokio::test]
    async fn reveal_stamps_the_instance_exactly_once() {
        let (state, game_id) = hosted_game(1, 1).await;
        for _ in 0..3 {
            advance(&state, game_id, "host-1").await.unwrap();
        }
        // Now in question_active; next advance reveals.
        let summary = advance(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.presentation_state, PresentationState::QuestionRevealed);

        let store = state.game_store().await.unwrap();
        let instance = store.find_instance_at(game_id, 0).await.unwrap().unwrap();
        let first_stamp = instance.revealed_at.expect("revealed_at must be stamped");

        // A second stamp attempt must keep the original timestamp.
        let fresh = store
            .mark_revealed(instance.id, SystemTime::now())
            .await
            .unwrap();
        assert!(!fresh);
        let instance = store.find_instance_at(game_id, 0).await.unwrap().unwrap();
        assert_eq!(instance.revealed_at, Some(first_stamp));
    }

    #[tokio::test]
    async fn walking_a_game_to_its_end_is_idempotent_at_the_terminal() {
        let (state, game_id) = hosted_game(1, 1).await;

        // setup → intro → round intro → active → revealed → scores →
        // complete → thanks: 7 transitions for a 1x1 game.
        for _ in 0..7 {
            advance(&state, game_id, "host-1").await.unwrap();
        }
        let summary = advance(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.presentation_state, PresentationState::GameThanks);
        assert_eq!(summary.status, GameStatus::Completed);
        assert!(summary.completed_at.is_some());

        // Still a no-op on repeat.
        let summary = advance(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.presentation_state, PresentationState::GameThanks);
    }

    #[tokio::test]
    async fn concurrent_advances_cannot_skip_a_state() {
        let (state, game_id) = hosted_game(1, 1).await;

        let left = advance(&state, game_id, "host-1");
        let right = advance(&state, game_id, "host-1");
        let (left, right) = tokio::join!(left, right);

        let successes = [&left, &right].iter().filter(|r| r.is_ok()).count();
        let store = state.game_store().await.unwrap();
        let game = store.find_game(game_id).await.unwrap().unwrap();

        // Either both requests serialized cleanly (two steps) or the loser
        // conflicted (one step); the machine never jumps further.
        match successes {
            2 => assert_eq!(game.presentation_state, PresentationState::RoundIntro),
            1 => assert_eq!(game.presentation_state, PresentationState::GameIntro),
            _ => panic!("at least one advance must succeed"),
        }
    }

    #[tokio::test]
    async fn persisted_transition_outlives_a_failed_broadcast_read() {
        // A game row whose instance rows are missing: the write to
        // question_active sticks, the broadcast read fails, and the host
        // still gets the post-transition summary.
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::default()))
            .await;
        let store = state.game_store().await.unwrap();

        let game_id = Uuid::new_v4();
        let now = SystemTime::now();
        store
            .insert_game(GameEntity {
                id: game_id,
                host_id: "host-1".into(),
                join_code: "ZZ99XX".into(),
                status: GameStatus::Active,
                presentation_state: PresentationState::RoundIntro,
                plan: GamePlan {
                    num_rounds: 1,
                    questions_per_round: 1,
                },
                time_limit_secs: 30,
                min_team_size: 1,
                max_team_size: 6,
                current_question_index: 0,
                created_at: now,
                updated_at: now,
                started_at: Some(now),
                completed_at: None,
                host_seen_at: Some(now),
            })
            .await
            .unwrap();

        let summary = advance(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.presentation_state, PresentationState::QuestionActive);
    }

    #[tokio::test]
    async fn undersized_teams_block_game_start() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::default();
        store
            .insert_questions(vec![QuestionEntity {
                id: Uuid::new_v4(),
                category: "General".into(),
                text: "q0".into(),
                answers: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct: AnswerKey::C,
            }])
            .await
            .unwrap();
        state.set_game_store(Arc::new(store)).await;

        let summary = game_service::create_game(
            &state,
            "host-1",
            CreateGameRequest {
                num_rounds: 1,
                questions_per_round: 1,
                time_limit_secs: 30,
                min_team_size: 2,
                max_team_size: 6,
                round_categories: Vec::new(),
            },
        )
        .await
        .unwrap();
        let game_id = summary.id;

        let team = team_service::create_team(
            &state,
            game_id,
            "player-1",
            CreateTeamRequest { name: "Short".into() },
        )
        .await
        .unwrap();

        let err = advance(&state, game_id, "host-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)), "got {err:?}");

        team_service::join_team(&state, game_id, team.id, "player-2")
            .await
            .unwrap();
        let summary = advance(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.status, GameStatus::Active);
    }

    #[tokio::test]
    async fn advance_is_host_only() {
        let (state, game_id) = hosted_game(1, 1).await;
        let err = advance(&state, game_id, "impostor").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn heartbeat_resumes_a_paused_game() {
        let (state, game_id) = hosted_game(1, 1).await;
        advance(&state, game_id, "host-1").await.unwrap();

        let store = state.game_store().await.unwrap();
        store
            .update_game_status(game_id, GameStatus::Active, GameStatus::Paused)
            .await
            .unwrap();

        let summary = heartbeat(&state, game_id, "host-1").await.unwrap();
        assert_eq!(summary.status, GameStatus::Active);
    }
}
