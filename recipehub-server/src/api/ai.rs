//! AI endpoints: direction generation and recipe chat

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::models::NewDirection;
use crate::services::recipe_chat::effective_user;
use crate::services::{ChatReply, ChatRequest, DirectionRequest, IngredientLine};
use super::ApiJson;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDirectionsRequest {
    /// When present, the recipe's stored directions are replaced
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
    pub servings: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateDirectionsResponse {
    pub success: bool,
    pub directions: Vec<NewDirection>,
    pub count: usize,
    pub generated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub recipe_id: String,
    #[serde(default)]
    pub message: String,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
}

/// POST /api/ai/generate-directions
pub async fn generate_directions(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GenerateDirectionsRequest>,
) -> ApiResult<Json<GenerateDirectionsResponse>> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Recipe title is required".to_string()));
    }

    let generator = state
        .directions
        .as_ref()
        .ok_or_else(|| ApiError::internal("Text generation is not configured"))?;

    let directions = generator
        .generate(&DirectionRequest {
            title: body.title,
            servings: body.servings,
            ingredients: body.ingredients,
        })
        .await?;

    if let Some(recipe_id) = body.recipe_id.as_deref().filter(|id| !id.is_empty()) {
        crate::db::recipes::replace_directions(&state.db, recipe_id, &directions).await?;
    }

    Ok(Json(GenerateDirectionsResponse {
        success: true,
        count: directions.len(),
        directions,
        generated: true,
    }))
}

/// POST /api/ai/chat
///
/// **Request:** `{"recipeId": "...", "message": "...", "conversationId"?: "...", "userId"?: "..."}`
/// **Errors:** 400 missing fields, 404 unknown recipe, 429 rate limit
pub async fn chat(State(state): State<AppState>, ApiJson(body): ApiJson<ChatBody>) -> ApiResult<Json<ChatReply>> {
    if body.recipe_id.trim().is_empty() || body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Recipe ID and message are required".to_string()));
    }

    let user = effective_user(body.user_id.as_deref());
    if !state.chat_limiter.check(user).await?.allowed {
        return Err(ApiError::TooManyRequests("Rate limit exceeded. Try again later.".to_string()));
    }

    let chat = state
        .chat
        .as_ref()
        .ok_or_else(|| ApiError::internal("Text generation is not configured"))?;

    let reply = chat
        .reply(&ChatRequest {
            recipe_id: body.recipe_id,
            message: body.message,
            conversation_id: body.conversation_id.filter(|id| !id.is_empty()),
            user_id: body.user_id,
        })
        .await?;

    Ok(Json(reply))
}

/// Build AI routes
pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/generate-directions", post(generate_directions))
        .route("/api/ai/chat", post(chat))
}
