/// First-submission-wins answer guard and scoring.
pub mod answer_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation, join codes, question recycling.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Host-driven presentation transitions and broadcasts.
pub mod host_service;
/// Host heartbeat tracking and auto-pause supervisor.
pub mod presence_service;
/// Question selection against the host's usage ledger.
pub mod question_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage health supervision and degraded-mode toggling.
pub mod storage_supervisor;
/// Catch-up snapshots per client role.
pub mod sync_service;
/// Team creation and membership.
pub mod team_service;
