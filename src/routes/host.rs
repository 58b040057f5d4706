use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::{game::GameSummary, views::HostQuestionView},
    error::AppError,
    routes::Principal,
    services::{game_service, host_service},
    state::SharedState,
};

/// Host-only control routes; every handler checks game ownership.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/advance", post(advance))
        .route("/games/{id}/heartbeat", post(heartbeat))
        .route("/games/{id}/questions/{qid}/recycle", post(recycle_question))
}

/// Advance the shared presentation state by one step.
#[utoipa::path(
    post,
    path = "/games/{id}/advance",
    tag = "host",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "State advanced (or terminal no-op)", body = GameSummary),
        (status = 401, description = "Caller is not the game's host"),
        (status = 409, description = "Another advance got there first"),
    )
)]
pub async fn advance(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = host_service::advance(&state, id, &principal.0).await?;
    Ok(Json(summary))
}

/// Record a host heartbeat, resuming the game if it was auto-paused.
#[utoipa::path(
    post,
    path = "/games/{id}/heartbeat",
    tag = "host",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Heartbeat recorded", body = GameSummary),
        (status = 401, description = "Caller is not the game's host"),
    )
)]
pub async fn heartbeat(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = host_service::heartbeat(&state, id, &principal.0).await?;
    Ok(Json(summary))
}

/// Swap a not-yet-played question for a fresh draw.
#[utoipa::path(
    post,
    path = "/games/{id}/questions/{qid}/recycle",
    tag = "host",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("qid" = Uuid, Path, description = "Question instance identifier"),
    ),
    responses(
        (status = 200, description = "Question swapped", body = HostQuestionView),
        (status = 409, description = "Question already in play or revealed"),
    )
)]
pub async fn recycle_question(
    State(state): State<SharedState>,
    principal: Principal,
    Path((id, qid)): Path<(Uuid, Uuid)>,
) -> Result<Json<HostQuestionView>, AppError> {
    let view = game_service::recycle_question(&state, id, qid, &principal.0).await?;
    Ok(Json(view))
}
