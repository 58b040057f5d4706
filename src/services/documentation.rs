use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Night Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::find_by_code,
        crate::routes::game::game_snapshot,
        crate::routes::host::advance,
        crate::routes::host::heartbeat,
        crate::routes::host::recycle_question,
        crate::routes::play::create_team,
        crate::routes::play::join_team,
        crate::routes::play::submit_answer,
        crate::routes::sse::events_stream,
        crate::routes::sse::tv_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::GameSummary,
            crate::dto::game::TeamSummary,
            crate::dto::game::GameSnapshot,
            crate::dto::game::ClientRole,
            crate::dto::play::CreateTeamRequest,
            crate::dto::play::TeamResponse,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::SubmitAnswerResponse,
            crate::dto::views::HostQuestionView,
            crate::dto::views::PlayerQuestionView,
            crate::dto::views::TvQuestionView,
            crate::dto::events::StateChangedEvent,
            crate::dto::events::AnswerCountEvent,
            crate::dto::events::GameLifecycleEvent,
            crate::dao::models::GameStatus,
            crate::state::state_machine::PresentationState,
            crate::state::state_machine::GamePlan,
            crate::shuffle::AnswerKey,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game creation and lookup"),
        (name = "host", description = "Host-only game control"),
        (name = "play", description = "Team membership and answer submission"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
