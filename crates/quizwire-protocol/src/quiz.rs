//! Quiz content types and the structural validation that gates them.
//!
//! A [`Question`] is only allowed into a room's review phase after
//! passing [`Question::validate`], whether it came from an upload or
//! from the generation collaborator. The rules are deliberately strict:
//! exactly four distinct options, and a correct answer that is an exact
//! string match for one of them.

use serde::{Deserialize, Serialize};

use crate::QuizError;

/// Every question carries exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

/// One multiple-choice question.
///
/// The wire keys follow the established client contract: `question`,
/// `options`, `correctAnswer`, `explanation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The question text, keyed `question` on the wire.
    #[serde(rename = "question")]
    pub text: String,
    /// The four candidate answers, in display order.
    pub options: Vec<String>,
    /// Must exactly equal one element of `options`.
    pub correct_answer: String,
    /// Shown to players during review.
    pub explanation: String,
}

impl Question {
    /// Checks the structural invariants for a single question.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.text.trim().is_empty() {
            return Err(QuizError::EmptyText);
        }
        if self.options.len() != OPTION_COUNT {
            return Err(QuizError::WrongOptionCount(self.options.len()));
        }
        for (i, a) in self.options.iter().enumerate() {
            if self.options[..i].contains(a) {
                return Err(QuizError::DuplicateOption(a.clone()));
            }
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(QuizError::CorrectAnswerMissing(
                self.correct_answer.clone(),
            ));
        }
        Ok(())
    }
}

/// Validates a whole question set: non-empty, every question
/// well-formed.
pub fn validate_quiz(questions: &[Question]) -> Result<(), QuizError> {
    if questions.is_empty() {
        return Err(QuizError::EmptyQuiz);
    }
    for q in questions {
        q.validate()?;
    }
    Ok(())
}

/// Parameters a host supplies for quiz generation.
///
/// Retained by the room after the first generation so the host can
/// regenerate the whole set, or a single question, with the same
/// settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizParams {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub difficulty: String,
    pub num_questions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question {
            text: "What is the capital of France?".into(),
            options: vec![
                "London".into(),
                "Berlin".into(),
                "Paris".into(),
                "Madrid".into(),
            ],
            correct_answer: "Paris".into(),
            explanation: "Paris is the capital of France.".into(),
        }
    }

    #[test]
    fn test_valid_question_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut q = sample();
        q.text = "   ".into();
        assert!(matches!(q.validate(), Err(QuizError::EmptyText)));
    }

    #[test]
    fn test_three_options_rejected() {
        let mut q = sample();
        q.options.pop();
        assert!(matches!(
            q.validate(),
            Err(QuizError::WrongOptionCount(3))
        ));
    }

    #[test]
    fn test_five_options_rejected() {
        let mut q = sample();
        q.options.push("Rome".into());
        assert!(matches!(
            q.validate(),
            Err(QuizError::WrongOptionCount(5))
        ));
    }

    #[test]
    fn test_duplicate_options_rejected() {
        let mut q = sample();
        q.options[1] = "Paris".into();
        assert!(matches!(q.validate(), Err(QuizError::DuplicateOption(_))));
    }

    #[test]
    fn test_correct_answer_must_match_an_option_exactly() {
        let mut q = sample();
        q.correct_answer = "paris".into(); // case differs — not a match
        assert!(matches!(
            q.validate(),
            Err(QuizError::CorrectAnswerMissing(_))
        ));
    }

    #[test]
    fn test_validate_quiz_rejects_empty_set() {
        assert!(matches!(validate_quiz(&[]), Err(QuizError::EmptyQuiz)));
    }

    #[test]
    fn test_validate_quiz_reports_first_bad_question() {
        let good = sample();
        let mut bad = sample();
        bad.options.pop();
        let result = validate_quiz(&[good, bad]);
        assert!(matches!(result, Err(QuizError::WrongOptionCount(3))));
    }

    #[test]
    fn test_question_wire_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("question").is_some());
        assert!(json.get("correctAnswer").is_some());
        assert!(json.get("text").is_none());
    }

    #[test]
    fn test_quiz_params_wire_keys() {
        let params = QuizParams {
            topic: "Rust".into(),
            subtopics: vec!["ownership".into()],
            difficulty: "Medium".into(),
            num_questions: 5,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["numQuestions"], 5);
        assert_eq!(json["topic"], "Rust");
    }
}
