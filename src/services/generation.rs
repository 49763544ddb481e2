//! Text-generation boundary.
//!
//! The core only needs `generate(model, instructions, prompt, max_output_tokens) -> text`.
//! Whatever comes back is untrusted and goes through `services::parse`. Callers bound
//! each call with `GeneratorSettings::timeout`.

use crate::domain::models::REQUIRED_QUESTION_COUNT;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequestArgs, Role,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation output failed validation: {0}")]
    Validation(String),
    #[error("only {got} of {required} usable questions after fill")]
    InsufficientQuestions { got: usize, required: usize },
    #[error("generated titles already asked before: {}", titles.join(" | "))]
    HistoryCollision { titles: Vec<String> },
    #[error("text generation unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl GenerationError {
    /// Failures that the primary → fallback transition retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Validation(_) | GenerationError::UpstreamUnavailable(_)
        )
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        instructions: &str,
        prompt: &str,
        max_output_tokens: u16,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub primary_model: String,
    pub fallback_model: String,
    pub max_output_tokens: u16,
    pub timeout: Duration,
    pub required_count: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            primary_model: "gpt-4o".to_string(),
            fallback_model: "gpt-4o-mini".to_string(),
            max_output_tokens: 2200,
            timeout: Duration::from_secs(45),
            required_count: REQUIRED_QUESTION_COUNT,
        }
    }
}

#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
}

impl OpenAiGenerator {
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    #[instrument(skip(self, instructions, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(
        &self,
        model: &str,
        instructions: &str,
        prompt: &str,
        max_output_tokens: u16,
    ) -> Result<String, GenerationError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                role: Role::System,
                content: instructions.to_string(),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                role: Role::User,
                content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                name: None,
            }),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .max_tokens(max_output_tokens)
            .temperature(0.7)
            .build()
            .map_err(|e| GenerationError::UpstreamUnavailable(format!("request build: {e}")))?;

        let started = Instant::now();
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GenerationError::UpstreamUnavailable(format!("{model}: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        tracing::info!(
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_len = content.len(),
            "generation call finished"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(GenerationError::Validation("bad".into()).is_retryable());
        assert!(GenerationError::UpstreamUnavailable("down".into()).is_retryable());
        assert!(!GenerationError::InsufficientQuestions { got: 9, required: 11 }.is_retryable());
        assert!(!GenerationError::HistoryCollision { titles: vec![] }.is_retryable());
    }

    #[test]
    fn test_default_settings() {
        let settings = GeneratorSettings::default();
        assert_eq!(settings.required_count, 11);
        assert_eq!(settings.fallback_model, "gpt-4o-mini");
    }
}
