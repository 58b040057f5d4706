//! Catch-up snapshots for (re)connecting clients.
//!
//! A client that reconnects applies this snapshot as its baseline and then
//! resumes live updates from its SSE stream. The snapshot is read straight
//! from the store, so it reflects everything broadcast before the read; a
//! client that missed events converges on the same screen as everyone else.

use uuid::Uuid;

use crate::{
    dto::{
        game::{ClientRole, GameSnapshot},
        views::{HostQuestionView, PlayerQuestionView, RoleQuestionView, TvQuestionView},
    },
    error::ServiceError,
    services::game_service,
    shuffle,
    state::SharedState,
};

/// Build the role-scoped snapshot of a game.
///
/// The host projection carries the correct answer index before the reveal and
/// is therefore gated on ownership; player and TV projections learn the
/// correct index only once `revealed_at` is stamped. The player path never
/// touches the seed beyond re-deriving the same shuffled texts the broadcast
/// carried.
pub async fn game_snapshot(
    state: &SharedState,
    game_id: Uuid,
    role: ClientRole,
    principal: &str,
) -> Result<GameSnapshot, ServiceError> {
    let store = state.require_game_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;

    if role == ClientRole::Host {
        game_service::ensure_owner(&game, principal)?;
    }

    let question = if game.presentation_state.shows_question() {
        let instance = store
            .find_instance_at(game_id, game.current_question_index)
            .await?
            .ok_or_else(|| {
                ServiceError::Invariant(format!(
                    "game `{}` has no question instance at position {}",
                    game_id, game.current_question_index
                ))
            })?;
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
        let revealed = instance.revealed_at.is_some();
        let answers = shuffled.texts().to_vec();

        let view = match role {
            ClientRole::Host => RoleQuestionView::Host(HostQuestionView {
                game_question_id: instance.id,
                category: question.category,
                text: question.text,
                answers,
                correct_answer_index: shuffled.correct_index(),
                revealed,
            }),
            ClientRole::Player => RoleQuestionView::Player(PlayerQuestionView {
                game_question_id: instance.id,
                category: question.category,
                text: question.text,
                answers,
                correct_answer_index: revealed.then(|| shuffled.correct_index()),
            }),
            ClientRole::Tv => {
                let answered = store.count_answered_teams(instance.id).await?;
                let total = store.find_teams(game_id).await?.len() as u64;
                RoleQuestionView::Tv(TvQuestionView {
                    game_question_id: instance.id,
                    category: question.category,
                    text: question.text,
                    answers,
                    correct_answer_index: revealed.then(|| shuffled.correct_index()),
                    teams_answered_count: answered,
                    total_teams: total,
                })
            }
        };
        Some(view)
    } else {
        None
    };

    Ok(GameSnapshot {
        game: game_service::summarize(state, game).await?,
        question,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryGameStore},
            models::QuestionEntity,
        },
        dto::game::CreateGameRequest,
        services::host_service,
        shuffle::AnswerKey,
        state::{AppState, state_machine::PresentationState},
    };

    async fn game_in_question_active() -> (SharedState, Uuid) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::default();
        store
            .insert_questions(vec![QuestionEntity {
                id: Uuid::new_v4(),
                category: "Geography".into(),
                text: "Capital of France?".into(),
                answers: [
                    "Paris".into(),
                    "London".into(),
                    "Berlin".into(),
                    "Madrid".into(),
                ],
                correct: AnswerKey::A,
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
                min_team_size: 1,
                max_team_size: 6,
                round_categories: Vec::new(),
            },
        )
        .await
        .unwrap();

        for _ in 0..3 {
            host_service::advance(&state, summary.id, "host-1").await.unwrap();
        }
        (state, summary.id)
    }

    #[tokio::test]
    async fn player_snapshot_hides_correctness_before_reveal() {
        let (state, game_id) = game_in_question_active().await;

        let snapshot = game_snapshot(&state, game_id, ClientRole::Player, "anyone")
            .await
            .unwrap();
        assert_eq!(
            snapshot.game.presentation_state,
            PresentationState::QuestionActive
        );
        match snapshot.question {
            Some(RoleQuestionView::Player(view)) => {
                assert_eq!(view.answers.len(), 4);
                assert!(view.correct_answer_index.is_none());
            }
            other => panic!("expected a player view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn player_snapshot_carries_correct_index_after_reveal() {
        let (state, game_id) = game_in_question_active().await;
        host_service::advance(&state, game_id, "host-1").await.unwrap();

        let snapshot = game_snapshot(&state, game_id, ClientRole::Player, "anyone")
            .await
            .unwrap();
        match snapshot.question {
            Some(RoleQuestionView::Player(view)) => {
                let index = view.correct_answer_index.expect("index after reveal");
                assert_eq!(view.answers[index], "Paris");
            }
            other => panic!("expected a player view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn host_snapshot_requires_ownership() {
        let (state, game_id) = game_in_question_active().await;

        let err = game_snapshot(&state, game_id, ClientRole::Host, "impostor")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let snapshot = game_snapshot(&state, game_id, ClientRole::Host, "host-1")
            .await
            .unwrap();
        match snapshot.question {
            Some(RoleQuestionView::Host(view)) => {
                assert!(!view.revealed);
                assert_eq!(view.answers[view.correct_answer_index], "Paris");
            }
            other => panic!("expected a host view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reconnecting_player_sees_the_broadcast_baseline() {
        // The snapshot a late joiner reads must equal what connected players
        // saw on the wire: same shuffled order, same instance id.
        let (state, game_id) = game_in_question_active().await;

        let first = game_snapshot(&state, game_id, ClientRole::Player, "p1")
            .await
            .unwrap();
        let second = game_snapshot(&state, game_id, ClientRole::Player, "p2")
            .await
            .unwrap();

        match (first.question, second.question) {
            (
                Some(RoleQuestionView::Player(a)),
                Some(RoleQuestionView::Player(b)),
            ) => {
                assert_eq!(a.answers, b.answers);
                assert_eq!(a.game_question_id, b.game_question_id);
            }
            other => panic!("expected player views, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tv_snapshot_carries_counters() {
        let (state, game_id) = game_in_question_active().await;

        let snapshot = game_snapshot(&state, game_id, ClientRole::Tv, "tv")
            .await
            .unwrap();
        match snapshot.question {
            Some(RoleQuestionView::Tv(view)) => {
                assert_eq!(view.teams_answered_count, 0);
                assert_eq!(view.total_teams, 0);
                assert!(view.correct_answer_index.is_none());
            }
            other => panic!("expected a TV view, got {other:?}"),
        }
    }
}
