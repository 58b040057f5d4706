use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Integrity constraints the storage layer enforces on behalf of the core.
///
/// These are the invariants that must hold under concurrent writers
/// regardless of application-level timing, which is why they live at the
/// store and not in process memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// Join codes are unique among active/recent games.
    GameJoinCode,
    /// Team display names are unique within one game.
    TeamNamePerGame,
    /// A player belongs to at most one team per game.
    OneTeamPerPlayer,
    /// A team holds at most the game's maximum number of members.
    TeamCapacity,
    /// At most one answer submission per (question instance, team) pair.
    OneAnswerPerTeam,
    /// A (host, question) usage record exists at most once.
    QuestionUsage,
}

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend unreachable or failing; the operation may be retried.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness constraint rejected the write. Expected during normal
    /// operation (duplicate code, second submission); never a fault.
    #[error("unique constraint violated: {constraint:?}")]
    Conflict {
        /// Which constraint fired.
        constraint: UniqueConstraint,
    },
    /// A compare-and-swap update found the row in a different state than the
    /// caller expected.
    #[error("stale state: {message}")]
    StaleState {
        /// What was expected versus found.
        message: String,
    },
    /// A row the operation requires does not exist.
    #[error("missing row: {what}")]
    Missing {
        /// Description of the missing row.
        what: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict for the given constraint.
    pub fn conflict(constraint: UniqueConstraint) -> Self {
        StorageError::Conflict { constraint }
    }

    /// Whether this error is a constraint conflict on `constraint`.
    pub fn is_conflict_on(&self, constraint: UniqueConstraint) -> bool {
        matches!(self, StorageError::Conflict { constraint: c } if *c == constraint)
    }
}
