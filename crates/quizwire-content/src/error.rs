//! Error types for the content collaborators.

use std::time::Duration;

use quizwire_protocol::QuizError;

/// Why quiz generation failed.
///
/// Whatever the variant, the game layer treats it the same way: report
/// once to the requesting host, leave the room where it was.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The model backend itself failed (network, HTTP status, missing
    /// completion in the response).
    #[error("model backend error: {0}")]
    Backend(String),

    /// One attempt exceeded the policy's per-attempt timeout.
    #[error("model attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The model replied, but no usable JSON payload could be
    /// extracted from the text.
    #[error("model response contained no usable quiz payload")]
    InvalidFormat,

    /// The payload parsed but failed structural validation.
    #[error("generated content failed validation: {0}")]
    Malformed(#[from] QuizError),

    /// Every model in the fallback list failed; carries the last
    /// error seen.
    #[error("all models failed, last error: {0}")]
    AllModelsFailed(#[source] Box<GenerationError>),
}

/// Why document extraction failed.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The document bytes could not be read as a supported format.
    #[error("document could not be parsed: {0}")]
    Unreadable(String),

    /// The document produced too little text to build a quiz from.
    #[error("extracted text is too short to build a quiz")]
    TooShort,

    /// The extraction backend failed.
    #[error("extraction backend error: {0}")]
    Backend(String),

    /// The extracted question set failed structural validation.
    #[error("extracted content failed validation: {0}")]
    Malformed(#[from] QuizError),
}
