//! Host liveness supervision.
//!
//! Hosts heartbeat while their control screen is open. A background scan
//! pauses any active game whose host has been silent past the configured
//! timeout; the next heartbeat resumes it (handled in `host_service`).

use std::time::SystemTime;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    dao::models::GameStatus,
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Periodically scan active games and pause the ones whose host went silent.
/// Runs for the lifetime of the process.
pub async fn run(state: SharedState) {
    let interval = state.config().presence_scan_interval;
    loop {
        sleep(interval).await;
        if let Err(err) = scan_once(&state).await {
            debug!(error = %err, "presence scan skipped");
        }
    }
}

/// One scan pass. Returns how many games were paused.
pub async fn scan_once(state: &SharedState) -> Result<usize, ServiceError> {
    // In degraded mode there is nothing to scan; the supervisor keeps
    // ticking and picks up again once storage returns.
    let Some(store) = state.game_store().await else {
        return Ok(0);
    };

    let timeout = state.config().host_timeout;
    let now = SystemTime::now();
    let mut paused = 0;

    for game in store.list_active_games().await? {
        let silent = match game.host_seen_at {
            Some(seen_at) => now
                .duration_since(seen_at)
                .map(|elapsed| elapsed > timeout)
                .unwrap_or(false),
            None => true,
        };
        if !silent {
            continue;
        }

        match store
            .update_game_status(game.id, GameStatus::Active, GameStatus::Paused)
            .await
        {
            Ok(_) => {
                info!(game_id = %game.id, "host silent past timeout; game paused");
                sse_events::broadcast_game_paused(state, game.id);
                paused += 1;
            }
            // The host came back (or the game completed) between the listing
            // and the flip; nothing to do.
            Err(err) => debug!(game_id = %game.id, error = %err, "pause skipped"),
        }
    }

    Ok(paused)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{game_store::memory::MemoryGameStore, models::GameEntity},
        state::{
            AppState,
            state_machine::{GamePlan, PresentationState},
        },
    };

    async fn active_game(state: &SharedState, seen_ago: Option<Duration>) -> Uuid {
        let store = state.game_store().await.unwrap();
        let game_id = Uuid::new_v4();
        let now = SystemTime::now();
        store
            .insert_game(GameEntity {
                id: game_id,
                host_id: "host-1".into(),
                join_code: format!("{:06}", rand::random::<u32>() % 1_000_000),
                status: GameStatus::Active,
                presentation_state: PresentationState::GameIntro,
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
                host_seen_at: seen_ago.map(|ago| now - ago),
            })
            .await
            .unwrap();
        game_id
    }

    fn test_state() -> SharedState {
        let config = AppConfig {
            host_timeout: Duration::from_secs(5),
            ..AppConfig::default()
        };
        AppState::new(config)
    }

    #[tokio::test]
    async fn silent_hosts_get_their_games_paused() {
        let state = test_state();
        state
            .set_game_store(Arc::new(MemoryGameStore::default()))
            .await;

        let stale = active_game(&state, Some(Duration::from_secs(30))).await;
        let fresh = active_game(&state, Some(Duration::from_millis(100))).await;

        let paused = scan_once(&state).await.unwrap();
        assert_eq!(paused, 1);

        let store = state.game_store().await.unwrap();
        let stale_game = store.find_game(stale).await.unwrap().unwrap();
        assert_eq!(stale_game.status, GameStatus::Paused);
        let fresh_game = store.find_game(fresh).await.unwrap().unwrap();
        assert_eq!(fresh_game.status, GameStatus::Active);
    }

    #[tokio::test]
    async fn games_without_any_heartbeat_are_paused() {
        let state = test_state();
        state
            .set_game_store(Arc::new(MemoryGameStore::default()))
            .await;
        let game_id = active_game(&state, None).await;

        scan_once(&state).await.unwrap();

        let store = state.game_store().await.unwrap();
        let game = store.find_game(game_id).await.unwrap().unwrap();
        assert_eq!(game.status, GameStatus::Paused);
    }

    #[tokio::test]
    async fn degraded_mode_scans_are_noops() {
        let state = test_state();
        assert_eq!(scan_once(&state).await.unwrap(), 0);
    }
}
