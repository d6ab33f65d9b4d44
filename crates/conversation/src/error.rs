//! Error types for conversation handling.

use database::DatabaseError;
use thiserror::Error;

/// Errors that escape a conversation step.
///
/// Validation and authorization problems never show up here: they are
/// answered inside the conversation.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// Message sending failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Store failure.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
