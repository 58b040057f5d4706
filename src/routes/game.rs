use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::game::{CreateGameRequest, GameSnapshot, GameSummary, SnapshotQuery},
    error::AppError,
    routes::Principal,
    services::{game_service, sync_service},
    state::SharedState,
};

/// Routes handling game bootstrap and lookup.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/by-code/{code}", get(find_by_code))
        .route("/games/{id}/snapshot", get(game_snapshot))
}

/// Create a fresh game owned by the calling principal.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 400, description = "Invalid configuration or question pool too small"),
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    principal: Principal,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::create_game(&state, &principal.0, payload).await?;
    Ok(Json(summary))
}

/// Look a game up by the join code shown on the TV.
#[utoipa::path(
    get,
    path = "/games/by-code/{code}",
    tag = "game",
    params(("code" = String, Path, description = "Six-character join code")),
    responses(
        (status = 200, description = "Game found", body = GameSummary),
        (status = 404, description = "No game with that code"),
    )
)]
pub async fn find_by_code(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::find_by_code(&state, &code).await?;
    Ok(Json(summary))
}

/// Authoritative catch-up snapshot, scoped to the requesting role.
#[utoipa::path(
    get,
    path = "/games/{id}/snapshot",
    tag = "game",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("role" = crate::dto::game::ClientRole, Query, description = "Requesting client role"),
    ),
    responses(
        (status = 200, description = "Current game state for this role", body = GameSnapshot),
        (status = 401, description = "Host snapshot requested by a non-owner"),
    )
)]
pub async fn game_snapshot(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<GameSnapshot>, AppError> {
    let snapshot = sync_service::game_snapshot(&state, id, query.role, &principal.0).await?;
    Ok(Json(snapshot))
}
