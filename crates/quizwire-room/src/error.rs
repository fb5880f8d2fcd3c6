//! Error types for the room layer.

use quizwire_protocol::{ConnectionId, RoomCode};

use crate::Phase;

/// Errors that can occur during room operations.
///
/// Every failed precondition is reported — to the caller through a
/// reply channel, or to the offending connection as a targeted `error`
/// event. Nothing fails silently.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room exists under this code.
    #[error("Room not found.")]
    NotFound(RoomCode),

    /// A non-host connection attempted a host-only operation.
    #[error("Only the host can do that.")]
    NotHost,

    /// The quiz has not been generated or uploaded yet.
    #[error("The room has no quiz content yet.")]
    NoQuizContent,

    /// No question exists at the given index.
    #[error("No question at index {index} (quiz has {len}).")]
    InvalidIndex { index: usize, len: usize },

    /// The operation is not valid in the room's current phase.
    #[error("That is not possible while the room is in the {0} phase.")]
    InvalidPhase(Phase),

    /// The sender is not a participant of this room.
    #[error("Connection {0} is not a participant of this room.")]
    NotParticipant(ConnectionId),

    /// The participant already answered the current question.
    #[error("You have already answered this question.")]
    AlreadyAnswered,

    /// The connection is already in the room (or is its host).
    #[error("You are already in this room.")]
    AlreadyInRoom,

    /// The display name was empty or too long.
    #[error("Invalid display name: {0}")]
    InvalidName(String),

    /// The timer duration must be at least one second.
    #[error("Timer duration must be at least 1 second, got {0}.")]
    InvalidTimer(u32),

    /// Regeneration was requested but no parameters are stored.
    #[error("Nothing to regenerate: no generation parameters stored.")]
    NoStoredParams,

    /// The room's actor is gone (shutting down or already stopped).
    #[error("Room {0} is unavailable.")]
    Unavailable(RoomCode),
}
