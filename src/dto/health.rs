use serde::Serialize;
use utoipa::ToSchema;

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when the store answers, "degraded" while it is unreachable.
    pub status: String,
}

impl HealthResponse {
    /// Report a fully operational backend.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Report that the backend is running without its storage layer.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
