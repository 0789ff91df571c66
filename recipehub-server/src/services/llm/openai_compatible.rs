//! OpenAI-compatible chat-completions provider (OpenRouter, Groq)

use super::{ChatMessage, Completion, CompletionOptions, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenRouter,
    Groq,
}

impl ProviderKind {
    pub fn base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openai/gpt-4-turbo",
            ProviderKind::Groq => "llama-3.3-70b-versatile",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Groq => "groq",
        }
    }
}

pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    api_key: String,
    model: String,
    base_url: String,
    /// (HTTP-Referer, X-Title), OpenRouter attribution headers
    site: Option<(String, String)>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(kind: ProviderKind, api_key: String, model: Option<String>) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured(format!("{} API key is empty", kind.name())));
        }

        let client = reqwest::Client::builder()
            .user_agent(recipehub_common::config::get_user_agent())
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        Ok(Self {
            kind,
            api_key,
            model: model.unwrap_or_else(|| kind.default_model().to_string()),
            base_url: kind.base_url().to_string(),
            site: None,
            client,
        })
    }

    pub fn with_site(mut self, site_url: String, site_name: String) -> Self {
        self.site = Some((site_url, site_name));
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_completion(body: &str, fallback_model: &str) -> Result<Completion, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .find_map(|c| c.message.content)
        .ok_or_else(|| LlmError::ParseError("No message content in response".to_string()))?;

    Ok(Completion {
        content,
        tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
        model: response.model.unwrap_or_else(|| fallback_model.to_string()),
    })
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let request = ChatRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request);
        if let Some((site_url, site_name)) = &self.site {
            builder = builder.header("HTTP-Referer", site_url).header("X-Title", site_name);
        }

        tracing::debug!(
            provider = self.kind.name(),
            model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::ApiError { status, message });
        }

        let completion = parse_completion(&body, model)?;

        tracing::info!(
            provider = self.kind.name(),
            model = %completion.model,
            tokens_used = completion.tokens_used,
            "Chat completion received"
        );

        Ok(completion)
    }

    fn provider_name(&self) -> &'static str {
        self.kind.name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
