//! Error types for the assignment engine.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while grouping, matching or persisting a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Requested group count is outside `1..=participants`.
    #[error("invalid group count {requested} for {participants} participants")]
    InvalidGroupCount { requested: usize, participants: usize },

    /// No valid pairing was found for a group within the retry bound.
    #[error("could not find valid assignments for {group} after {attempts} attempts")]
    AssignmentInfeasible { group: String, attempts: usize },

    /// A matched name is missing from the roster snapshot.
    #[error("participant missing from roster: {0}")]
    UnknownParticipant(String),

    /// Another assignment run has not finished yet.
    #[error("an assignment run is already in progress")]
    RunInProgress,

    /// Store failure.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl EngineError {
    /// Whether this is an internal storage fault rather than a user-facing
    /// condition. Faults are reported to users only generically.
    pub fn is_persistence_fault(&self) -> bool {
        matches!(
            self,
            EngineError::Database(_) | EngineError::UnknownParticipant(_)
        )
    }
}
