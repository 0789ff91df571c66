//! LLM provider abstraction
//!
//! Direction generation and recipe chat both go through [`LlmProvider`], so
//! the hosted providers (OpenRouter, Groq) and the offline [`FakeProvider`]
//! are interchangeable.

mod fake;
mod openai_compatible;

pub use fake::FakeProvider;
pub use openai_compatible::{OpenAiCompatibleProvider, ProviderKind};

use async_trait::async_trait;
use recipehub_common::config::AiConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type for LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn (`{"role": "user", "content": "..."}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Sampling options for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tokens_used: u32,
    pub model: String,
}

/// Chat-completion provider
///
/// Implementations must be thread-safe; one instance is shared by all
/// request handlers.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError>;

    /// Provider name (e.g., "openrouter", "groq", "fake")
    fn provider_name(&self) -> &'static str;

    /// Default model name
    fn model_name(&self) -> &str;
}

/// Build the configured provider
///
/// `[ai] provider` selects "openrouter", "groq" or "fake". A hosted provider
/// without an API key is a configuration error.
pub fn create_provider(
    ai: &AiConfig,
    openrouter_key: Option<String>,
    groq_key: Option<String>,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match ai.provider.as_str() {
        "fake" => Ok(Arc::new(FakeProvider::default())),
        "openrouter" => {
            let key = openrouter_key
                .ok_or_else(|| LlmError::NotConfigured("OpenRouter API key not set".to_string()))?;
            let provider = OpenAiCompatibleProvider::new(ProviderKind::OpenRouter, key, ai.chat_model.clone())?
                .with_site(ai.site_url.clone(), ai.site_name.clone());
            Ok(Arc::new(provider))
        }
        "groq" => {
            let key = groq_key
                .ok_or_else(|| LlmError::NotConfigured("Groq API key not set".to_string()))?;
            Ok(Arc::new(OpenAiCompatibleProvider::new(
                ProviderKind::Groq,
                key,
                ai.chat_model.clone(),
            )?))
        }
        other => Err(LlmError::NotConfigured(format!("Unknown provider: {}", other))),
    }
}
