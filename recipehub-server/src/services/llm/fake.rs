//! Fake LLM provider for offline runs and tests
//!
//! Responses are matched by checking whether the last user message contains
//! a registered substring (case-insensitive). Every call is recorded so tests
//! can assert on the prompts that were sent.

use super::{ChatMessage, Completion, CompletionOptions, LlmError, LlmProvider, Role};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug)]
pub struct FakeProvider {
    /// (prompt substring, response) in registration order
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    /// Fail every call with this API status
    fail_with_status: Option<u16>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: Some(
                "I'm running in offline mode, so I can't answer cooking questions right now."
                    .to_string(),
            ),
            fail_with_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    /// Provider with no registered responses and no default
    pub fn new() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Provider whose every call fails with `ApiError { status }`
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::new()
        }
    }

    /// Messages of every call made so far
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }

        if let Some(status) = self.fail_with_status {
            return Err(LlmError::ApiError {
                status,
                message: "FakeProvider configured to fail".to_string(),
            });
        }

        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();

        let content = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| {
                LlmError::RequestFailed(format!(
                    "FakeProvider: No response configured for prompt (first 100 chars): {}",
                    prompt.chars().take(100).collect::<String>()
                ))
            })?;

        Ok(Completion {
            tokens_used: (content.split_whitespace().count()) as u32,
            content,
            model: self.model_name().to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
