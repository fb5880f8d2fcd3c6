//! The collaborator traits the game core depends on.
//!
//! Both are `async_trait` object-safe so the server can hold them as
//! `Arc<dyn ...>` — production wires in the HTTP-backed implementations,
//! tests wire in mocks.

use async_trait::async_trait;
use quizwire_protocol::{validate_quiz, Question, QuizParams};

use crate::{ExtractionError, GenerationError};

/// Produces quiz content from generation parameters.
///
/// Implementations own their retry/fallback behavior; callers treat a
/// returned error as final and report it to the requesting host once.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Generates a full question set.
    async fn generate(
        &self,
        params: &QuizParams,
    ) -> Result<Vec<Question>, GenerationError>;

    /// Generates a single question to replace the one at `index`.
    async fn generate_replacement(
        &self,
        params: &QuizParams,
        index: usize,
    ) -> Result<Question, GenerationError>;
}

/// One model invocation: prompt in, raw completion text out.
///
/// [`crate::FallbackGenerator`] drives this per model from its policy
/// list; the backend knows nothing about fallback or timeouts.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Runs `prompt` against the named model and returns the raw
    /// completion text.
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenerationError>;
}

/// Turns an uploaded document into a question set.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts questions from raw document bytes, guided by the same
    /// parameters a generation request would carry.
    async fn extract(
        &self,
        bytes: &[u8],
        params: &QuizParams,
    ) -> Result<Vec<Question>, ExtractionError>;
}

/// The document boundary operation: run the extractor, then enforce
/// the structural rules before anything reaches a room.
///
/// Validation here is mandatory — an extractor is trusted to read the
/// document, never to certify question shape.
pub async fn extract_document_quiz<E: DocumentExtractor + ?Sized>(
    extractor: &E,
    bytes: &[u8],
    params: &QuizParams,
) -> Result<Vec<Question>, ExtractionError> {
    let questions = extractor.extract(bytes, params).await?;
    validate_quiz(&questions)?;
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExtractor(Vec<Question>);

    #[async_trait]
    impl DocumentExtractor for FixedExtractor {
        async fn extract(
            &self,
            _bytes: &[u8],
            _params: &QuizParams,
        ) -> Result<Vec<Question>, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    fn params() -> QuizParams {
        QuizParams {
            topic: "Anything".into(),
            subtopics: vec![],
            difficulty: "Easy".into(),
            num_questions: 1,
        }
    }

    fn good_question() -> Question {
        Question {
            text: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: "4".into(),
            explanation: "basic arithmetic".into(),
        }
    }

    #[tokio::test]
    async fn test_extract_document_quiz_passes_valid_content() {
        let extractor = FixedExtractor(vec![good_question()]);
        let quiz = extract_document_quiz(&extractor, b"pdf bytes", &params())
            .await
            .unwrap();
        assert_eq!(quiz.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_document_quiz_rejects_malformed_content() {
        let mut bad = good_question();
        bad.correct_answer = "42".into();
        let extractor = FixedExtractor(vec![bad]);
        let result =
            extract_document_quiz(&extractor, b"pdf bytes", &params()).await;
        assert!(matches!(result, Err(ExtractionError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_extract_document_quiz_rejects_empty_set() {
        let extractor = FixedExtractor(vec![]);
        let result =
            extract_document_quiz(&extractor, b"pdf bytes", &params()).await;
        assert!(matches!(result, Err(ExtractionError::Malformed(_))));
    }
}
