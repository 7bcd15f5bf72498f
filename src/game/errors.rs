//! Round engine error types.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No round exists with the given id.
    #[error("round {0} not found")]
    RoundNotFound(Uuid),
    /// No game exists with the given id.
    #[error("game {0} not found")]
    GameNotFound(Uuid),
    /// No turn exists with the given id.
    #[error("turn {0} not found")]
    TurnNotFound(Uuid),
    /// The pot was asked to pay an empty winner group.
    #[error("the winner group is empty")]
    InvalidWinner,
    /// The round cannot legally do what was asked of it in its current
    /// state; the message says what went wrong.
    #[error("illegal round state: {0}")]
    IllegalRoundState(String),
    /// A backing store failed to load or save.
    #[error("store error: {0}")]
    Storage(String),
}

/// Convenience alias for engine fallible returns.
pub type EngineResult<T> = Result<T, EngineError>;
