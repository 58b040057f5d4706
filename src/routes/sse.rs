use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/games/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Game events stream", content_type = "text/event-stream", body = String))
)]
/// Stream presentation-state transitions and lifecycle events for a game.
pub async fn events_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_events(&state, id);
    info!(game_id = %id, "new game events SSE connection");
    sse_service::to_sse_stream(receiver, StreamKind::Events(id))
}

#[utoipa::path(
    get,
    path = "/sse/games/{id}/tv",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "TV answer-progress stream", content_type = "text/event-stream", body = String))
)]
/// Stream answer-progress counters for the shared TV display.
pub async fn tv_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_tv(&state, id);
    info!(game_id = %id, "new TV SSE connection");
    sse_service::to_sse_stream(receiver, StreamKind::Tv(id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/games/{id}/events", get(events_stream))
        .route("/sse/games/{id}/tv", get(tv_stream))
}
