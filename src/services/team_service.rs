//! Team creation and membership.

use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{GameStatus, TeamEntity, TeamMembershipEntity},
    dto::{game::TeamSummary, play::CreateTeamRequest},
    error::ServiceError,
    state::SharedState,
};

/// Create a new team in a game and enrol the creator as its first member.
///
/// The team name is unique within the game; the store constraint surfaces a
/// duplicate as a user-facing conflict.
pub async fn create_team(
    state: &SharedState,
    game_id: Uuid,
    player_id: &str,
    request: CreateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
    ensure_joinable(game.status)?;

    // Pre-check so a creator already on a team does not squat the name with
    // an empty team. The membership constraint still backstops races.
    if store
        .find_membership(game_id, player_id.to_string())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(
            "player already belongs to a team in this game".into(),
        ));
    }

    let team = TeamEntity {
        id: Uuid::new_v4(),
        game_id,
        name: request.name.trim().to_string(),
        correct_count: 0,
        total_response_ms: 0,
        created_at: SystemTime::now(),
    };
    store.insert_team(team.clone()).await?;
    enrol(state, game_id, team.id, player_id, game.max_team_size).await?;

    Ok(team.into())
}

/// Join an existing team, honouring the one-team-per-player constraint and
/// the game's maximum team size.
///
/// Capacity is enforced by the store inside the membership insert, not by a
/// count-then-insert here, so two joins racing for the last slot cannot both
/// land.
pub async fn join_team(
    state: &SharedState,
    game_id: Uuid,
    team_id: Uuid,
    player_id: &str,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let game = store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;
    ensure_joinable(game.status)?;

    let team = store
        .find_team(team_id)
        .await?
        .filter(|team| team.game_id == game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;

    enrol(state, game_id, team_id, player_id, game.max_team_size).await?;
    Ok(team.into())
}

/// Teams of a game ranked by correct answers, ties broken by accumulated
/// response time, keyed by team id in rank order.
pub async fn scoreboard(
    state: &SharedState,
    game_id: Uuid,
) -> Result<IndexMap<Uuid, TeamSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let mut teams = store.find_teams(game_id).await?;
    teams.sort_by(|a, b| {
        b.correct_count
            .cmp(&a.correct_count)
            .then(a.total_response_ms.cmp(&b.total_response_ms))
    });
    Ok(teams
        .into_iter()
        .map(|team| (team.id, TeamSummary::from(team)))
        .collect())
}

async fn enrol(
    state: &SharedState,
    game_id: Uuid,
    team_id: Uuid,
    player_id: &str,
    max_members: u32,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    store
        .insert_membership(
            TeamMembershipEntity {
                id: Uuid::new_v4(),
                game_id,
                team_id,
                player_id: player_id.to_string(),
            },
            max_members,
        )
        .await?;
    Ok(())
}

fn ensure_joinable(status: GameStatus) -> Result<(), ServiceError> {
    match status {
        GameStatus::Setup | GameStatus::Active | GameStatus::Paused => Ok(()),
        GameStatus::Completed => Err(ServiceError::InvalidState(
            "game is already completed".into(),
        )),
    }
}
