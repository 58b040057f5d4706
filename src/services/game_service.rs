//! Game creation, lookup, and question recycling.

use std::{sync::Arc, time::SystemTime};

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{GameEntity, GameStatus, QuestionInstanceEntity, QuestionUsageEntity, RoundEntity},
    },
    dto::{
        game::{CreateGameRequest, GameSummary},
        validation::{JOIN_CODE_LENGTH, validate_join_code},
        views::HostQuestionView,
    },
    error::ServiceError,
    services::{question_service, team_service},
    shuffle,
    state::{SharedState, state_machine::{GamePlan, PresentationState}},
};

const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bootstrap a new game: pick questions per round, claim their usage, write
/// Game + Rounds + QuestionInstances, all under a fresh join code.
///
/// The creation is one logical unit. Any failure after the first write rolls
/// back via compensating deletes (usage releases, game cascade), so a failed
/// attempt never leaks claimed questions or a half-built game.
pub async fn create_game(
    state: &SharedState,
    host_id: &str,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let plan = validate_request(&request)?;

    let round_categories = normalized_categories(&request, plan.num_rounds);

    // Draw and claim questions round by round; claiming as we go keeps later
    // rounds from re-drawing the same question.
    let mut claimed: Vec<Uuid> = Vec::new();
    let mut per_round = Vec::with_capacity(round_categories.len());
    let mut warnings = Vec::new();
    let questions_per_round = plan.questions_per_round as usize;

    for categories in &round_categories {
        let selection =
            question_service::select(&store, host_id, categories, questions_per_round).await?;

        if selection.is_short(questions_per_round) {
            release_claims(&store, host_id, &claimed).await;
            return Err(ServiceError::InvalidInput(format!(
                "not enough unused questions: needed {questions_per_round}, \
                 {} available in the selected categories, {} overall",
                selection.available_in_selected, selection.available_in_all
            )));
        }
        if let Some(warning) = &selection.warning {
            warnings.push(warning.clone());
        }

        for question in &selection.questions {
            let claim = store
                .claim_question_usage(QuestionUsageEntity {
                    host_id: host_id.to_string(),
                    question_id: question.id,
                    used_at: SystemTime::now(),
                })
                .await;
            if let Err(err) = claim {
                release_claims(&store, host_id, &claimed).await;
                return Err(err.into());
            }
            claimed.push(question.id);
        }

        per_round.push(selection.questions);
    }

    let game = match insert_with_fresh_code(state, &store, host_id, &request, plan).await {
        Ok(game) => game,
        Err(err) => {
            release_claims(&store, host_id, &claimed).await;
            return Err(err);
        }
    };

    let rounds: Vec<RoundEntity> = round_categories
        .iter()
        .enumerate()
        .map(|(position, categories)| RoundEntity {
            id: Uuid::new_v4(),
            game_id: game.id,
            position: position as u32,
            categories: categories.clone(),
        })
        .collect();

    let mut instances = Vec::with_capacity(plan.total_questions() as usize);
    {
        let mut rng = rand::rng();
        for (round, questions) in rounds.iter().zip(&per_round) {
            for (offset, question) in questions.iter().enumerate() {
                instances.push(QuestionInstanceEntity {
                    id: Uuid::new_v4(),
                    game_id: game.id,
                    round_id: round.id,
                    position: round.position * plan.questions_per_round + offset as u32,
                    question_id: question.id,
                    seed: rng.random::<i64>(),
                    revealed_at: None,
                });
            }
        }
    }

    let satellite_writes = async {
        store.insert_rounds(rounds).await?;
        store.insert_question_instances(instances).await?;
        Ok::<(), ServiceError>(())
    };
    if let Err(err) = satellite_writes.await {
        rollback_creation(&store, host_id, game.id, &claimed).await;
        return Err(err);
    }

    info!(game_id = %game.id, join_code = %game.join_code, "game created");

    let mut summary = summarize(state, game).await?;
    summary.warnings = warnings;
    Ok(summary)
}

/// Look a game up by join code, for players keying in what the TV shows.
pub async fn find_by_code(state: &SharedState, code: &str) -> Result<GameSummary, ServiceError> {
    let code = code.trim().to_ascii_uppercase();
    validate_join_code(&code).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "invalid join code".into()),
        )
    })?;

    let store = state.require_game_store().await?;
    let game = store
        .find_game_by_code(code.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no game with code `{code}`")))?;
    summarize(state, game).await
}

/// Swap a not-yet-played question instance for a fresh draw, releasing the
/// old usage claim and claiming the new one atomically.
pub async fn recycle_question(
    state: &SharedState,
    game_id: Uuid,
    instance_id: Uuid,
    host_id: &str,
) -> Result<HostQuestionView, ServiceError> {
    let store = state.require_game_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
    ensure_owner(&game, host_id)?;

    let instance = store
        .find_question_instance(instance_id)
        .await?
        .filter(|instance| instance.game_id == game_id)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("question instance `{instance_id}` not found"))
        })?;
    ensure_recyclable(&game, &instance)?;

    let rounds = store.find_rounds(game_id).await?;
    let categories = rounds
        .iter()
        .find(|round| round.id == instance.round_id)
        .map(|round| round.categories.clone())
        .unwrap_or_default();

    // Exclude everything already placed in this game, not just the host's
    // ledger, so the replacement is no duplicate of an upcoming question.
    let placed: Vec<Uuid> = store
        .find_question_instances(game_id)
        .await?
        .iter()
        .map(|row| row.question_id)
        .collect();

    let replacement = question_service::pick_replacement(&store, host_id, &categories, &placed)
        .await?
        .ok_or_else(|| {
            ServiceError::InvalidInput("no unused question available to swap in".into())
        })?;

    store
        .swap_question_usage(
            host_id.to_string(),
            instance.question_id,
            replacement.id,
            SystemTime::now(),
        )
        .await?;

    let seed: i64 = rand::rng().random();
    if let Err(err) = store
        .replace_instance_question(instance_id, replacement.id, seed)
        .await
    {
        // Claims swapped but the instance kept its old question; swap back so
        // the ledger matches what the game will actually play.
        let undo = store
            .swap_question_usage(
                host_id.to_string(),
                replacement.id,
                instance.question_id,
                SystemTime::now(),
            )
            .await;
        if let Err(undo_err) = undo {
            warn!(error = %undo_err, "failed to undo usage swap after recycle failure");
        }
        return Err(err.into());
    }

    info!(game_id = %game_id, instance_id = %instance_id, "question recycled");

    let shuffled = shuffle::shuffle(&replacement.answers, replacement.correct, seed);
    Ok(HostQuestionView {
        game_question_id: instance_id,
        category: replacement.category,
        text: replacement.text,
        answers: shuffled.texts().to_vec(),
        correct_answer_index: shuffled.correct_index(),
        revealed: false,
    })
}

/// Project a game row into its public summary with a ranked scoreboard.
pub async fn summarize(
    state: &SharedState,
    game: GameEntity,
) -> Result<GameSummary, ServiceError> {
    let scoreboard = team_service::scoreboard(state, game.id).await?;
    let mut summary = GameSummary::from((game, Vec::new()));
    summary.teams = scoreboard.into_values().collect();
    Ok(summary)
}

/// Host-ownership guard shared by the host-only operations.
pub fn ensure_owner(game: &GameEntity, host_id: &str) -> Result<(), ServiceError> {
    if game.host_id != host_id {
        return Err(ServiceError::Unauthorized(
            "only the game's host may do this".into(),
        ));
    }
    Ok(())
}

fn validate_request(request: &CreateGameRequest) -> Result<GamePlan, ServiceError> {
    if request.min_team_size > request.max_team_size {
        return Err(ServiceError::InvalidInput(
            "minimum team size exceeds maximum".into(),
        ));
    }
    if !request.round_categories.is_empty()
        && request.round_categories.len() != request.num_rounds as usize
    {
        return Err(ServiceError::InvalidInput(format!(
            "round_categories must have one entry per round ({} expected, {} given)",
            request.num_rounds,
            request.round_categories.len()
        )));
    }
    Ok(GamePlan {
        num_rounds: request.num_rounds,
        questions_per_round: request.questions_per_round,
    })
}

fn normalized_categories(request: &CreateGameRequest, num_rounds: u32) -> Vec<Vec<String>> {
    if request.round_categories.is_empty() {
        vec![Vec::new(); num_rounds as usize]
    } else {
        request.round_categories.clone()
    }
}

async fn insert_with_fresh_code(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
    host_id: &str,
    request: &CreateGameRequest,
    plan: GamePlan,
) -> Result<GameEntity, ServiceError> {
    let attempts = state.config().join_code_attempts.max(1);

    for attempt in 0..attempts {
        let now = SystemTime::now();
        let game = GameEntity {
            id: Uuid::new_v4(),
            host_id: host_id.to_string(),
            join_code: generate_join_code(),
            status: GameStatus::Setup,
            presentation_state: PresentationState::Setup,
            plan,
            time_limit_secs: request.time_limit_secs,
            min_team_size: request.min_team_size,
            max_team_size: request.max_team_size,
            current_question_index: 0,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            host_seen_at: Some(now),
        };

        match store.insert_game(game.clone()).await {
            Ok(()) => return Ok(game),
            Err(err) if err.is_conflict_on(crate::dao::storage::UniqueConstraint::GameJoinCode) => {
                warn!(attempt, "join code collision; regenerating");
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Conflict(
        "could not generate a unique join code; try again".into(),
    ))
}

fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..JOIN_CODE_ALPHABET.len());
            JOIN_CODE_ALPHABET[index] as char
        })
        .collect()
}

async fn release_claims(store: &Arc<dyn GameStore>, host_id: &str, claimed: &[Uuid]) {
    for question_id in claimed {
        if let Err(err) = store
            .release_question_usage(host_id.to_string(), *question_id)
            .await
        {
            warn!(question_id = %question_id, error = %err, "failed to release usage claim");
        }
    }
}

async fn rollback_creation(
    store: &Arc<dyn GameStore>,
    host_id: &str,
    game_id: Uuid,
    claimed: &[Uuid],
) {
    if let Err(err) = store.delete_game_cascade(game_id).await {
        warn!(game_id = %game_id, error = %err, "failed to roll back partial game creation");
    }
    release_claims(store, host_id, claimed).await;
}

fn ensure_recyclable(
    game: &GameEntity,
    instance: &QuestionInstanceEntity,
) -> Result<(), ServiceError> {
    if instance.revealed_at.is_some() {
        return Err(ServiceError::InvalidState(
            "question already revealed".into(),
        ));
    }
    let in_play = instance.position < game.current_question_index
        || (instance.position == game.current_question_index
            && game.presentation_state.shows_question());
    if in_play {
        return Err(ServiceError::InvalidState(
            "question already in play".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{game_store::memory::MemoryGameStore, models::QuestionEntity},
        shuffle::AnswerKey,
        state::AppState,
    };

    fn question(category: &str, text: &str) -> QuestionEntity {
        QuestionEntity {
            id: Uuid::new_v4(),
            category: category.to_string(),
            text: text.to_string(),
            answers: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct: AnswerKey::B,
        }
    }

    async fn ready_state(questions: Vec<QuestionEntity>) -> SharedState {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::default();
        store.insert_questions(questions).await.unwrap();
        state.set_game_store(Arc::new(store)).await;
        state
    }

    fn request(num_rounds: u32, questions_per_round: u32) -> CreateGameRequest {
        CreateGameRequest {
            num_rounds,
            questions_per_round,
            time_limit_secs: 30,
            min_team_size: 1,
            max_team_size: 6,
            round_categories: Vec::new(),
        }
    }

    #[tokio::test]
    async fn creates_a_game_with_rounds_and_instances() {
        let state =
            ready_state((0..4).map(|i| question("Science", &format!("q{i}"))).collect()).await;

        let summary = create_game(&state, "host-1", request(2, 2)).await.unwrap();

        assert_eq!(summary.status, GameStatus::Setup);
        assert_eq!(summary.presentation_state, PresentationState::Setup);
        validate_join_code(&summary.join_code).unwrap();

        let store = state.game_store().await.unwrap();
        let rounds = store.find_rounds(summary.id).await.unwrap();
        assert_eq!(rounds.len(), 2);
        let instances = store.find_question_instances(summary.id).await.unwrap();
        assert_eq!(instances.len(), 4);
        let positions: Vec<u32> = instances.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(instances.iter().all(|i| i.revealed_at.is_none()));
    }

    #[tokio::test]
    async fn short_question_pool_aborts_and_releases_claims() {
        let state = ready_state(vec![question("Science", "only-one")]).await;

        let err = create_game(&state, "host-1", request(1, 2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "got {err:?}");

        // The single question must be claimable again after the rollback.
        let store = state.game_store().await.unwrap();
        let pool = store
            .unused_questions("host-1".into(), None)
            .await
            .unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn two_games_by_the_same_host_never_share_questions() {
        let state =
            ready_state((0..2).map(|i| question("Science", &format!("q{i}"))).collect()).await;

        create_game(&state, "host-1", request(1, 1)).await.unwrap();
        let second = create_game(&state, "host-1", request(1, 1)).await.unwrap();

        let store = state.game_store().await.unwrap();
        let pool = store
            .unused_questions("host-1".into(), None)
            .await
            .unwrap();
        assert!(pool.is_empty(), "both questions should be claimed");
        drop(second);
    }

    #[tokio::test]
    async fn join_code_lookup_is_case_insensitive() {
        let state = ready_state(vec![question("Science", "q")]).await;
        let created = create_game(&state, "host-1", request(1, 1)).await.unwrap();

        let found = find_by_code(&state, &created.join_code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn recycle_swaps_question_and_usage() {
        let state =
            ready_state(vec![question("Science", "q0"), question("Science", "q1")]).await;
        let created = create_game(&state, "host-1", request(1, 1)).await.unwrap();

        let store = state.game_store().await.unwrap();
        let instance = store
            .find_instance_at(created.id, 0)
            .await
            .unwrap()
            .unwrap();
        let original_question = instance.question_id;

        let view = recycle_question(&state, created.id, instance.id, "host-1")
            .await
            .unwrap();
        assert_eq!(view.game_question_id, instance.id);

        let swapped = store
            .find_question_instance(instance.id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(swapped.question_id, original_question);

        // The old question returned to the pool; the new one left it.
        let pool = store
            .unused_questions("host-1".into(), None)
            .await
            .unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, original_question);
    }

    #[tokio::test]
    async fn recycle_rejects_non_owners() {
        let state = ready_state(vec![question("Science", "q0")]).await;
        let created = create_game(&state, "host-1", request(1, 1)).await.unwrap();
        let store = state.game_store().await.unwrap();
        let instance = store
            .find_instance_at(created.id, 0)
            .await
            .unwrap()
            .unwrap();

        let err = recycle_question(&state, created.id, instance.id, "impostor")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
