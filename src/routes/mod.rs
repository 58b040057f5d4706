use axum::{Router, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, state::SharedState};

pub mod docs;
pub mod game;
pub mod health;
pub mod host;
pub mod play;
pub mod sse;

/// Header carrying the caller's opaque principal identifier.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// Opaque caller identity taken from the `x-principal-id` header.
///
/// Anonymous and registered identities share this shape; the backend only
/// ever compares it for equality (game ownership, team membership).
pub struct Principal(pub String);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Principal(value.to_string()))
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing `{PRINCIPAL_HEADER}` header"))
            })
    }
}

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(game::router())
        .merge(host::router())
        .merge(play::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
