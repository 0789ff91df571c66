//! Recipe-aware cooking chat
//!
//! Each reply sends a system prompt describing the recipe, the stored
//! conversation so far, and the new user message. Conversations are saved
//! for signed-in users only; anonymous chats are answered but not stored.

use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;

use super::llm::{ChatMessage, CompletionOptions, LlmError, LlmProvider, Role};
use crate::db::{conversations, recipes};
use crate::models::Recipe;

/// User id assumed when a request carries none
pub const ANONYMOUS_USER: &str = "anonymous";

const CHAT_MAX_TOKENS: u32 = 500;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Conversation belongs to another user")]
    NotOwner,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Database(#[from] recipehub_common::Error),
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub recipe_id: String,
    pub message: String,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: Option<String>,
    pub tokens_used: u32,
}

/// The id a request is attributed to (rate limiting, ownership)
pub fn effective_user(user_id: Option<&str>) -> &str {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => ANONYMOUS_USER,
    }
}

#[derive(Debug, Clone)]
pub struct RecipeChat {
    db: SqlitePool,
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
}

impl RecipeChat {
    pub fn new(db: SqlitePool, provider: Arc<dyn LlmProvider>, model: Option<String>) -> Self {
        Self { db, provider, model }
    }

    /// System prompt carrying the recipe context
    pub fn build_context(recipe: &Recipe) -> String {
        let mut context = String::from("You are a professional cooking assistant helping with this recipe:\n\n");

        let _ = writeln!(context, "**{}**", recipe.title);
        let _ = writeln!(context, "- Servings: {}", recipe.servings);
        let _ = writeln!(context, "- Prep: {}min | Cook: {}min\n", recipe.prep_time, recipe.cook_time);

        context.push_str("**Ingredients:**\n");
        for (idx, ing) in recipe.ingredients.iter().enumerate() {
            let unit = ing.unit.as_deref().map(|u| format!(" {}", u)).unwrap_or_default();
            let _ = writeln!(context, "{}. {}{} {}", idx + 1, ing.amount, unit, ing.name);
        }

        context.push_str("\n**Directions:**\n");
        for dir in &recipe.directions {
            let _ = writeln!(context, "Step {}: {}", dir.step_number, dir.instruction);
        }

        if let Some(n) = &recipe.nutrition {
            context.push_str("\n**Nutrition (per serving):**\n");
            let _ = writeln!(
                context,
                "Calories: {} | Protein: {}g | Carbs: {}g | Fat: {}g",
                n.calories, n.protein, n.carbs, n.fat
            );
        }

        context.push_str(
            "\nAnswer cooking questions concisely and helpfully. If asked about substitutions, \
             provide specific ratios and tips. Never hallucinate ingredient quantities.",
        );

        context
    }

    pub async fn reply(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let user = effective_user(request.user_id.as_deref());

        let recipe = recipes::load_recipe(&self.db, &request.recipe_id)
            .await?
            .ok_or_else(|| ChatError::RecipeNotFound(request.recipe_id.clone()))?;

        let mut history = match &request.conversation_id {
            Some(id) => {
                let conversation = conversations::load_conversation(&self.db, id)
                    .await?
                    .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))?;
                if conversation.user_id != user {
                    return Err(ChatError::NotOwner);
                }
                conversation.messages
            }
            None => Vec::new(),
        };
        // Stored system turns would duplicate the context prompt
        history.retain(|m| m.role != Role::System);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(Self::build_context(&recipe)));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(request.message.clone()));

        let options = CompletionOptions {
            model: self.model.clone(),
            max_tokens: CHAT_MAX_TOKENS,
            ..CompletionOptions::default()
        };
        let completion = self.provider.chat(&messages, &options).await?;

        history.push(ChatMessage::user(request.message.clone()));
        history.push(ChatMessage::assistant(completion.content.clone()));

        let conversation_id = match &request.conversation_id {
            Some(id) => {
                conversations::update_messages(&self.db, id, &history).await?;
                Some(id.clone())
            }
            None if user != ANONYMOUS_USER => Some(
                conversations::create_conversation(&self.db, user, Some(&recipe.id), &history).await?,
            ),
            None => None,
        };

        tracing::info!(
            recipe_id = %recipe.id,
            user,
            conversation_id = ?conversation_id,
            tokens_used = completion.tokens_used,
            "Chat reply generated"
        );

        Ok(ChatReply {
            response: completion.content,
            conversation_id,
            tokens_used: completion.tokens_used,
        })
    }
}
