use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::{StorageError, UniqueConstraint},
    state::state_machine::CursorOutOfBounds,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Another team member already submitted for this question. Expected
    /// under concurrent submissions; user-facing, non-fatal.
    #[error("your team has already answered this question")]
    AlreadyAnswered,
    /// Submission arrived after the host revealed the answer.
    #[error("submissions are closed for this question")]
    SubmissionClosed,
    /// Some other uniqueness conflict (duplicate team name, duplicate code).
    #[error("conflict: {0}")]
    Conflict(String),
    /// A system invariant was violated; the operation failed closed.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable { .. } => ServiceError::Unavailable(err),
            StorageError::Conflict { constraint } => match constraint {
                UniqueConstraint::OneAnswerPerTeam => ServiceError::AlreadyAnswered,
                UniqueConstraint::GameJoinCode => {
                    ServiceError::Conflict("join code already in use".into())
                }
                UniqueConstraint::TeamNamePerGame => {
                    ServiceError::Conflict("team name already taken in this game".into())
                }
                UniqueConstraint::OneTeamPerPlayer => {
                    ServiceError::Conflict("player already belongs to a team in this game".into())
                }
                UniqueConstraint::TeamCapacity => ServiceError::Conflict("team is full".into()),
                UniqueConstraint::QuestionUsage => {
                    ServiceError::Conflict("question already used by this host".into())
                }
            },
            StorageError::StaleState { message } => ServiceError::InvalidState(message),
            StorageError::Missing { what } => ServiceError::NotFound(what),
        }
    }
}

impl From<CursorOutOfBounds> for ServiceError {
    fn from(err: CursorOutOfBounds) -> Self {
        ServiceError::Invariant(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::AlreadyAnswered => {
                AppError::Conflict("your team has already answered this question".into())
            }
            ServiceError::SubmissionClosed => {
                AppError::Conflict("submissions are closed for this question".into())
            }
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Invariant(message) => {
                // Invariant violations are system errors, not user conflicts.
                tracing::error!(%message, "invariant violation");
                AppError::Internal(message)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
