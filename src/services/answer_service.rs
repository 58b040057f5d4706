//! Answer submission: the first-submission-wins guard.
//!
//! Exclusivity is not decided here. The store's (question instance, team)
//! uniqueness constraint is the arbiter; this service just orders the checks
//! around it and turns a constraint hit into a user-facing conflict.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{AnswerSubmissionEntity, GameStatus},
    dto::play::{SubmitAnswerRequest, SubmitAnswerResponse},
    error::ServiceError,
    services::sse_events,
    shuffle,
    state::SharedState,
};

/// Submit one team's answer for the question currently on screen.
///
/// The chosen index is mapped back to its canonical key by re-deriving the
/// shuffle from the stored seed; correctness is computed server-side and
/// never returned to the submitter before the reveal.
pub async fn submit(
    state: &SharedState,
    game_id: Uuid,
    player_id: &str,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;

    if game.status != GameStatus::Active {
        return Err(ServiceError::InvalidState(
            "game is not accepting answers".into(),
        ));
    }
    if !game.presentation_state.accepts_submissions() {
        return Err(ServiceError::SubmissionClosed);
    }

    let instance = store
        .find_question_instance(request.question_instance_id)
        .await?
        .filter(|instance| instance.game_id == game_id)
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "question instance `{}` not found",
                request.question_instance_id
            ))
        })?;

    if instance.position != game.current_question_index {
        return Err(ServiceError::InvalidState(
            "that question is not on screen".into(),
        ));
    }
    // The reveal stamps revealed_at in the same write that flips the state;
    // checking both closes the gap for submissions racing the reveal.
    if instance.revealed_at.is_some() {
        return Err(ServiceError::SubmissionClosed);
    }

    let membership = store
        .find_membership(game_id, player_id.to_string())
        .await?
        .ok_or_else(|| {
            ServiceError::Unauthorized("join a team before answering".into())
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
    let answer_key = shuffled
        .key_at(request.chosen_index)
        .ok_or_else(|| ServiceError::InvalidInput("answer index out of range".into()))?;
    let correct = request.chosen_index == shuffled.correct_index();

    // The store scores the team in the same write that inserts the row.
    // Response time accrues whether or not the answer was right, so a fast
    // wrong answer still beats a slow wrong answer in tie-breaks.
    store
        .insert_answer_submission(AnswerSubmissionEntity {
            id: Uuid::new_v4(),
            question_instance_id: instance.id,
            team_id: membership.team_id,
            submitter_id: player_id.to_string(),
            answer_key,
            correct,
            elapsed_ms: request.elapsed_ms,
            submitted_at: SystemTime::now(),
        })
        .await?;

    let answered = store.count_answered_teams(instance.id).await?;
    let total = store.find_teams(game_id).await?.len() as u64;
    sse_events::broadcast_answer_count(state, game_id, answered, total);

    Ok(SubmitAnswerResponse { accepted: true })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::memory::MemoryGameStore,
            models::{
                GameEntity, GameStatus, QuestionEntity, QuestionInstanceEntity, TeamEntity,
                TeamMembershipEntity,
            },
        },
        shuffle::AnswerKey,
        state::{
            AppState,
            state_machine::{GamePlan, PresentationState},
        },
    };

    struct Fixture {
        state: SharedState,
        game_id: Uuid,
        instance_id: Uuid,
        correct_index: usize,
    }

    async fn fixture(presentation_state: PresentationState, status: GameStatus) -> Fixture {
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
                join_code: "AB12CD".into(),
                status,
                presentation_state,
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

        let question = QuestionEntity {
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
        };
        let seed = 42;
        let shuffled = shuffle::shuffle(&question.answers, question.correct, seed);
        let correct_index = shuffled.correct_index();
        store.insert_questions(vec![question.clone()]).await.unwrap();

        let instance_id = Uuid::new_v4();
        store
            .insert_question_instances(vec![QuestionInstanceEntity {
                id: instance_id,
                game_id,
                round_id: Uuid::new_v4(),
                position: 0,
                question_id: question.id,
                seed,
                revealed_at: None,
            }])
            .await
            .unwrap();

        Fixture {
            state,
            game_id,
            instance_id,
            correct_index,
        }
    }

    async fn add_team(fixture: &Fixture, name: &str, players: &[&str]) -> Uuid {
        let store = fixture.state.game_store().await.unwrap();
        let team_id = Uuid::new_v4();
        store
            .insert_team(TeamEntity {
                id: team_id,
                game_id: fixture.game_id,
                name: name.into(),
                correct_count: 0,
                total_response_ms: 0,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        for player in players {
            store
                .insert_membership(
                    TeamMembershipEntity {
                        id: Uuid::new_v4(),
                        game_id: fixture.game_id,
                        team_id,
                        player_id: (*player).into(),
                    },
                    6,
                )
                .await
                .unwrap();
        }
        team_id
    }

    fn request(fixture: &Fixture, chosen_index: usize, elapsed_ms: u64) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            question_instance_id: fixture.instance_id,
            chosen_index,
            elapsed_ms,
        }
    }

    #[tokio::test]
    async fn accepts_a_submission_and_scores_the_team() {
        let fixture = fixture(PresentationState::QuestionActive, GameStatus::Active).await;
        let team_id = add_team(&fixture, "Lizards", &["p1"]).await;

        let response = submit(
            &fixture.state,
            fixture.game_id,
            "p1",
            request(&fixture, fixture.correct_index, 1_200),
        )
        .await
        .unwrap();
        assert!(response.accepted);

        let store = fixture.state.game_store().await.unwrap();
        let team = store.find_team(team_id).await.unwrap().unwrap();
        assert_eq!(team.correct_count, 1);
        assert_eq!(team.total_response_ms, 1_200);
    }

    #[tokio::test]
    async fn wrong_answers_accrue_time_but_no_points() {
        let fixture = fixture(PresentationState::QuestionActive, GameStatus::Active).await;
        let team_id = add_team(&fixture, "Lizards", &["p1"]).await;

        let wrong_index = (fixture.correct_index + 1) % 4;
        submit(
            &fixture.state,
            fixture.game_id,
            "p1",
            request(&fixture, wrong_index, 900),
        )
        .await
        .unwrap();

        let store = fixture.state.game_store().await.unwrap();
        let team = store.find_team(team_id).await.unwrap().unwrap();
        assert_eq!(team.correct_count, 0);
        assert_eq!(team.total_response_ms, 900);
    }

    #[tokio::test]
    async fn concurrent_teammates_land_exactly_one_submission() {
        let fixture = fixture(PresentationState::QuestionActive, GameStatus::Active).await;
        let team_id = add_team(&fixture, "Lizards", &["p1", "p2"]).await;

        let left = submit(
            &fixture.state,
            fixture.game_id,
            "p1",
            request(&fixture, fixture.correct_index, 800),
        );
        let right = submit(
            &fixture.state,
            fixture.game_id,
            "p2",
            request(&fixture, fixture.correct_index, 820),
        );
        let (left, right) = tokio::join!(left, right);

        let accepted = [&left, &right].iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1, "exactly one submission may win");
        let rejected = if left.is_ok() { right } else { left };
        assert!(matches!(
            rejected.unwrap_err(),
            ServiceError::AlreadyAnswered
        ));

        // The loser's elapsed time must not have been accrued.
        let store = fixture.state.game_store().await.unwrap();
        let team = store.find_team(team_id).await.unwrap().unwrap();
        assert_eq!(team.correct_count, 1);
        assert!(team.total_response_ms == 800 || team.total_response_ms == 820);
    }

    #[tokio::test]
    async fn submissions_after_reveal_are_closed() {
        let fixture = fixture(PresentationState::QuestionRevealed, GameStatus::Active).await;
        add_team(&fixture, "Lizards", &["p1"]).await;

        let err = submit(
            &fixture.state,
            fixture.game_id,
            "p1",
            request(&fixture, 0, 500),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::SubmissionClosed));
    }

    #[tokio::test]
    async fn revealed_instance_rejects_even_in_active_state() {
        // Covers the race where the state row flipped back but revealed_at is
        // already stamped on the instance.
        let fixture = fixture(PresentationState::QuestionActive, GameStatus::Active).await;
        add_team(&fixture, "Lizards", &["p1"]).await;

        let store = fixture.state.game_store().await.unwrap();
        store
            .mark_revealed(fixture.instance_id, SystemTime::now())
            .await
            .unwrap();

        let err = submit(
            &fixture.state,
            fixture.game_id,
            "p1",
            request(&fixture, 0, 500),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::SubmissionClosed));
    }

    #[tokio::test]
    async fn paused_games_reject_submissions() {
        let fixture = fixture(PresentationState::QuestionActive, GameStatus::Paused).await;
        add_team(&fixture, "Lizards", &["p1"]).await;

        let err = submit(
            &fixture.state,
            fixture.game_id,
            "p1",
            request(&fixture, 0, 500),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn players_without_a_team_cannot_answer() {
        let fixture = fixture(PresentationState::QuestionActive, GameStatus::Active).await;

        let err = submit(
            &fixture.state,
            fixture.game_id,
            "stranger",
            request(&fixture, 0, 500),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
