//! The fallback generation policy and the generator built on it.
//!
//! Which models to try, in what order, and how long to give each
//! attempt is configuration — not game logic. [`GenerationPolicy`]
//! carries that configuration; [`FallbackGenerator`] executes it over
//! any [`ModelBackend`].

use std::time::Duration;

use async_trait::async_trait;
use quizwire_protocol::{validate_quiz, Question, QuizParams};
use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    extract_json_array, extract_json_object, GenerationError, ModelBackend,
    QuizGenerator,
};

/// Ordered model fallback list plus the per-attempt timeout.
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    /// Model identifiers, tried first to last.
    pub models: Vec<String>,
    /// Budget for a single model attempt; an attempt that exceeds it
    /// counts as a failure and the next model is tried.
    pub attempt_timeout: Duration,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            models: vec![
                "NousResearch/Nous-Hermes-2-Mixtral-8x7B-DPO".into(),
                "zai-org/GLM-4.5:novita".into(),
                "google/gemma-7b-it".into(),
                "Open-Orca/Mistral-7B-OpenOrca".into(),
            ],
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

/// A [`QuizGenerator`] that walks a [`GenerationPolicy`]'s model list
/// over a [`ModelBackend`], validating every candidate before
/// returning it.
pub struct FallbackGenerator<B> {
    backend: B,
    policy: GenerationPolicy,
}

impl<B: ModelBackend> FallbackGenerator<B> {
    pub fn new(backend: B, policy: GenerationPolicy) -> Self {
        Self { backend, policy }
    }

    /// Runs one model attempt under the policy timeout.
    async fn attempt(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        match time::timeout(
            self.policy.attempt_timeout,
            self.backend.complete(model, prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.policy.attempt_timeout)),
        }
    }

    /// Tries each model in order with `prompt`, parsing the completion
    /// with `parse`. The last failure is reported when the list runs
    /// dry.
    async fn run_fallback<T>(
        &self,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let mut last =
            GenerationError::Backend("no models configured".to_string());

        for model in &self.policy.models {
            debug!(model, "attempting generation");
            let outcome = match self.attempt(model, prompt).await {
                Ok(text) => parse(&text),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(value) => {
                    info!(model, "generation succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(model, error = %e, "model attempt failed");
                    last = e;
                }
            }
        }

        Err(GenerationError::AllModelsFailed(Box::new(last)))
    }
}

#[async_trait]
impl<B: ModelBackend> QuizGenerator for FallbackGenerator<B> {
    async fn generate(
        &self,
        params: &QuizParams,
    ) -> Result<Vec<Question>, GenerationError> {
        let prompt = build_quiz_prompt(params);
        let expected = params.num_questions as usize;
        self.run_fallback(&prompt, move |text| {
            let questions = parse_question_array(text)?;
            if questions.len() != expected {
                warn!(
                    got = questions.len(),
                    expected, "model returned a different question count"
                );
            }
            Ok(questions)
        })
        .await
    }

    async fn generate_replacement(
        &self,
        params: &QuizParams,
        index: usize,
    ) -> Result<Question, GenerationError> {
        let prompt = build_replacement_prompt(params, index);
        self.run_fallback(&prompt, parse_single_question).await
    }
}

fn parse_question_array(text: &str) -> Result<Vec<Question>, GenerationError> {
    let json = extract_json_array(text).ok_or(GenerationError::InvalidFormat)?;
    let questions: Vec<Question> =
        serde_json::from_str(json).map_err(|_| GenerationError::InvalidFormat)?;
    validate_quiz(&questions)?;
    Ok(questions)
}

fn parse_single_question(text: &str) -> Result<Question, GenerationError> {
    let json = extract_json_object(text).ok_or(GenerationError::InvalidFormat)?;
    let question: Question =
        serde_json::from_str(json).map_err(|_| GenerationError::InvalidFormat)?;
    question.validate()?;
    Ok(question)
}

fn build_quiz_prompt(params: &QuizParams) -> String {
    format!(
        "You are an expert quiz-generating AI. Create a quiz with these \
         specifications.\n\n\
         Topic: \"{topic}\"\n\
         Subtopics: {subtopics}\n\
         Difficulty: {difficulty}\n\
         Number of questions: {count}\n\n\
         Rules:\n\
         1. Respond with ONLY a valid JSON array of exactly {count} \
         question objects — no prose, no markdown.\n\
         2. Each object must have exactly these keys: \"question\", \
         \"options\", \"correctAnswer\", \"explanation\".\n\
         3. \"options\" must contain exactly 4 distinct strings.\n\
         4. \"correctAnswer\" must be the full answer string, identical \
         to one element of \"options\" — never a letter like \"A\".",
        topic = params.topic,
        subtopics = params.subtopics.join(", "),
        difficulty = params.difficulty,
        count = params.num_questions,
    )
}

fn build_replacement_prompt(params: &QuizParams, index: usize) -> String {
    format!(
        "You are an expert quiz-generating AI. Create exactly ONE \
         multiple-choice question to replace question number {number} in \
         an existing quiz.\n\n\
         Topic: \"{topic}\"\n\
         Subtopics: {subtopics}\n\
         Difficulty: {difficulty}\n\n\
         Rules:\n\
         1. Respond with ONLY a single valid JSON object — no prose, no \
         markdown.\n\
         2. The object must have exactly these keys: \"question\", \
         \"options\", \"correctAnswer\", \"explanation\".\n\
         3. \"options\" must contain exactly 4 distinct strings and \
         \"correctAnswer\" must be identical to one of them.",
        number = index + 1,
        topic = params.topic,
        subtopics = params.subtopics.join(", "),
        difficulty = params.difficulty,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays canned completions and records which models were tried.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        tried: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(
            responses: Vec<Result<String, GenerationError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                tried: Mutex::new(Vec::new()),
            })
        }

        fn tried(&self) -> Vec<String> {
            self.tried.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelBackend for Arc<ScriptedBackend> {
        async fn complete(
            &self,
            model: &str,
            _prompt: &str,
        ) -> Result<String, GenerationError> {
            self.tried.lock().unwrap().push(model.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::InvalidFormat))
        }
    }

    fn policy(models: &[&str]) -> GenerationPolicy {
        GenerationPolicy {
            models: models.iter().map(|m| m.to_string()).collect(),
            attempt_timeout: Duration::from_secs(30),
        }
    }

    fn params() -> QuizParams {
        QuizParams {
            topic: "Arithmetic".into(),
            subtopics: vec!["addition".into()],
            difficulty: "Easy".into(),
            num_questions: 1,
        }
    }

    const GOOD_ARRAY: &str = r#"[{
        "question": "2+2?",
        "options": ["3", "4", "5", "6"],
        "correctAnswer": "4",
        "explanation": "basic arithmetic"
    }]"#;

    const GOOD_OBJECT: &str = r#"{
        "question": "3+3?",
        "options": ["5", "6", "7", "8"],
        "correctAnswer": "6",
        "explanation": "basic arithmetic"
    }"#;

    #[tokio::test]
    async fn test_first_model_success_stops_the_fallback() {
        let backend = ScriptedBackend::new(vec![Ok(GOOD_ARRAY.into())]);
        let generator =
            FallbackGenerator::new(Arc::clone(&backend), policy(&["primary", "backup"]));

        let quiz = generator.generate(&params()).await.unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(backend.tried(), vec!["primary"]);
    }

    #[tokio::test]
    async fn test_second_model_tried_after_backend_failure() {
        let backend = ScriptedBackend::new(vec![
            Err(GenerationError::Backend("503".into())),
            Ok(GOOD_ARRAY.into()),
        ]);
        let generator =
            FallbackGenerator::new(Arc::clone(&backend), policy(&["primary", "backup"]));

        let quiz = generator.generate(&params()).await.unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(backend.tried(), vec!["primary", "backup"]);
    }

    #[tokio::test]
    async fn test_unparseable_completion_counts_as_failure() {
        let backend = ScriptedBackend::new(vec![
            Ok("I'd love to help but here is prose".into()),
            Ok(GOOD_ARRAY.into()),
        ]);
        let generator =
            FallbackGenerator::new(Arc::clone(&backend), policy(&["primary", "backup"]));

        let quiz = generator.generate(&params()).await.unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(backend.tried().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_question_counts_as_failure() {
        // Three options — structurally invalid, must not be returned.
        let bad = r#"[{
            "question": "2+2?",
            "options": ["3", "4", "5"],
            "correctAnswer": "4",
            "explanation": "short one"
        }]"#;
        let backend = ScriptedBackend::new(vec![
            Ok(bad.into()),
            Ok(GOOD_ARRAY.into()),
        ]);
        let generator =
            FallbackGenerator::new(Arc::clone(&backend), policy(&["primary", "backup"]));

        let quiz = generator.generate(&params()).await.unwrap();
        assert_eq!(quiz[0].correct_answer, "4");
        assert_eq!(backend.tried().len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_list_reports_all_models_failed() {
        let backend = ScriptedBackend::new(vec![
            Err(GenerationError::Backend("down".into())),
            Ok("no json".into()),
        ]);
        let generator =
            FallbackGenerator::new(Arc::clone(&backend), policy(&["primary", "backup"]));

        let result = generator.generate(&params()).await;
        assert!(matches!(
            result,
            Err(GenerationError::AllModelsFailed(_))
        ));
        assert_eq!(backend.tried().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out_and_falls_back() {
        struct SlowThenGood;

        #[async_trait]
        impl ModelBackend for SlowThenGood {
            async fn complete(
                &self,
                model: &str,
                _prompt: &str,
            ) -> Result<String, GenerationError> {
                if model == "slow" {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                Ok(GOOD_ARRAY.into())
            }
        }

        let generator =
            FallbackGenerator::new(SlowThenGood, policy(&["slow", "backup"]));
        let quiz = generator.generate(&params()).await.unwrap();
        assert_eq!(quiz.len(), 1);
    }

    #[tokio::test]
    async fn test_replacement_parses_a_single_object() {
        let backend = ScriptedBackend::new(vec![Ok(format!(
            "Here you go:\n{GOOD_OBJECT}"
        ))]);
        let generator =
            FallbackGenerator::new(Arc::clone(&backend), policy(&["primary"]));

        let question =
            generator.generate_replacement(&params(), 2).await.unwrap();
        assert_eq!(question.correct_answer, "6");
    }

    #[test]
    fn test_default_policy_has_an_ordered_model_list() {
        let policy = GenerationPolicy::default();
        assert!(policy.models.len() >= 2);
        assert!(policy.attempt_timeout > Duration::ZERO);
    }

    #[test]
    fn test_prompts_mention_every_parameter() {
        let prompt = build_quiz_prompt(&params());
        assert!(prompt.contains("Arithmetic"));
        assert!(prompt.contains("addition"));
        assert!(prompt.contains("Easy"));
        assert!(prompt.contains("exactly 1"));

        let replacement = build_replacement_prompt(&params(), 4);
        assert!(replacement.contains("question number 5"));
    }
}
