use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::play::{CreateTeamRequest, SubmitAnswerRequest, SubmitAnswerResponse, TeamResponse},
    error::AppError,
    routes::Principal,
    services::{answer_service, team_service},
    state::SharedState,
};

/// Player-facing routes: team membership and answer submission.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{id}/teams", post(create_team))
        .route("/games/{id}/teams/{team_id}/join", post(join_team))
        .route("/games/{id}/answers", post(submit_answer))
}

/// Create a team and enrol the caller as its first member.
#[utoipa::path(
    post,
    path = "/games/{id}/teams",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team created", body = TeamResponse),
        (status = 409, description = "Name taken or caller already on a team"),
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = team_service::create_team(&state, id, &principal.0, payload).await?;
    Ok(Json(TeamResponse { team }))
}

/// Join an existing team.
#[utoipa::path(
    post,
    path = "/games/{id}/teams/{team_id}/join",
    tag = "play",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("team_id" = Uuid, Path, description = "Team to join"),
    ),
    responses(
        (status = 200, description = "Joined", body = TeamResponse),
        (status = 409, description = "Team full or caller already on a team"),
    )
)]
pub async fn join_team(
    State(state): State<SharedState>,
    principal: Principal,
    Path((id, team_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = team_service::join_team(&state, id, team_id, &principal.0).await?;
    Ok(Json(TeamResponse { team }))
}

/// Submit the caller's team answer for the question on screen.
#[utoipa::path(
    post,
    path = "/games/{id}/answers",
    tag = "play",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Submission accepted", body = SubmitAnswerResponse),
        (status = 409, description = "Team already answered or submissions closed"),
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitAnswerRequest>>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    let response = answer_service::submit(&state, id, &principal.0, payload).await?;
    Ok(Json(response))
}
