//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an unknown event tag, missing
    /// required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Structural validation failures for quiz content.
///
/// This is the `MalformedQuestion` class of the session contract:
/// content that fails here is rejected before it can reach a room's
/// review phase, whether it was uploaded or generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    /// The question set contained no questions.
    #[error("quiz contains no questions")]
    EmptyQuiz,

    /// The question text was empty or whitespace.
    #[error("question text is empty")]
    EmptyText,

    /// A question did not carry exactly four options.
    #[error("expected 4 options, got {0}")]
    WrongOptionCount(usize),

    /// Two options in one question were identical.
    #[error("duplicate option: {0:?}")]
    DuplicateOption(String),

    /// The correct answer did not exactly match any option.
    #[error("correct answer {0:?} is not one of the options")]
    CorrectAnswerMissing(String),
}
