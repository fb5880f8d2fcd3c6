//! External content collaborators for Quizwire.
//!
//! The game core never talks to a language model or parses a document
//! itself — it sees two opaque async seams:
//!
//! - [`QuizGenerator`] — produce a question set (or one replacement
//!   question) from [`QuizParams`]; may fail.
//! - [`DocumentExtractor`] — turn an uploaded document into a question
//!   set; may fail.
//!
//! This crate defines those seams plus the default generator:
//! [`FallbackGenerator`], which walks an ordered model list
//! ([`GenerationPolicy`]) over any [`ModelBackend`], applies a
//! per-attempt timeout, and validates every candidate set before
//! letting it anywhere near a room. [`HttpModelBackend`] is the
//! shipped backend, speaking the OpenAI-compatible chat-completions
//! shape.
//!
//! Retry-across-models lives entirely here, as policy — the game core
//! reports a failure to the host once and moves on.

mod error;
mod extract;
mod generator;
mod http;
mod policy;

pub use error::{ExtractionError, GenerationError};
pub use extract::{extract_json_array, extract_json_object};
pub use generator::{
    extract_document_quiz, DocumentExtractor, ModelBackend, QuizGenerator,
};
pub use http::{HttpModelBackend, DEFAULT_BASE_URL};
pub use policy::{FallbackGenerator, GenerationPolicy};
