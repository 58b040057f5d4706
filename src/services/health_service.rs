use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the store and report whether the backend is degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_game_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "store health probe failed");
            }
        }
        Err(_) => warn!("store unavailable, reporting degraded"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
