//! HTTP model backend speaking the OpenAI-compatible
//! chat-completions shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GenerationError, ModelBackend};

/// Default inference router. Any OpenAI-compatible endpoint works.
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";

/// A [`ModelBackend`] that POSTs to `{base_url}/chat/completions`
/// with bearer authentication.
pub struct HttpModelBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpModelBackend {
    /// Creates a backend against an OpenAI-compatible endpoint.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Creates a backend against the default inference router.
    pub fn with_default_url(api_key: impl Into<String>) -> Self {
        Self::new(DEFAULT_BASE_URL, api_key)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ModelBackend for HttpModelBackend {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens: 2048,
        };

        debug!(model, url = %url, "requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Backend(format!(
                "completion request returned HTTP {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::Backend(
                    "completion response had no message content".to_string(),
                )
            })
    }
}
