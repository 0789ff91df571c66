//! Recipe chat endpoint tests

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use helpers::*;
use recipehub_server::build_router;
use recipehub_server::services::llm::{FakeProvider, Role};
use recipehub_server::services::{ChatRateLimiter, MemoryCounterStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Router with one imported recipe; returns the router and that recipe's id
async fn app_with_recipe(provider: Arc<FakeProvider>, max_requests: Option<u32>) -> (Router, String) {
    let source = Arc::new(FakeRecipeSource::new().with_recipe(
        source_recipe(99, "Garlic Butter Shrimp", 20),
        &["Melt the butter.", "Cook the shrimp."],
    ));
    let mut state = test_state(test_db().await, source, None, provider);
    if let Some(max) = max_requests {
        state = state.with_chat_limiter(ChatRateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            max,
            Duration::from_secs(3600),
        ));
    }
    let app = build_router(state);

    let (status, body) = read_json(
        app.clone()
            .oneshot(post_json("/api/recipes/import", json!({ "spoonacularId": 99 })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["recipe"]["id"].as_str().unwrap().to_string();
    (app, id)
}

#[tokio::test]
async fn test_chat_reply_includes_recipe_context() {
    let provider = Arc::new(FakeProvider::new().with_response("substitute", "Use olive oil instead."));
    let (app, recipe_id) = app_with_recipe(provider.clone(), None).await;

    let (status, body) = read_json(
        app.oneshot(post_json(
            "/api/ai/chat",
            json!({ "recipeId": recipe_id, "message": "Can I substitute the butter?" }),
        ))
        .await
        .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Use olive oil instead.");
    assert!(body["conversationId"].is_null());
    assert_eq!(body["tokensUsed"], 4);

    let sent = &provider.calls()[0];
    assert_eq!(sent[0].role, Role::System);
    assert!(sent[0].content.contains("Garlic Butter Shrimp"));
    assert!(sent[0].content.contains("Melt the butter."));
    assert_eq!(sent.last().unwrap().content, "Can I substitute the butter?");
}

#[tokio::test]
async fn test_chat_conversation_continues_for_owner_only() {
    let provider = Arc::new(FakeProvider::new().with_default_response("Sure."));
    let (app, recipe_id) = app_with_recipe(provider.clone(), None).await;

    let (_, first) = read_json(
        app.clone()
            .oneshot(post_json(
                "/api/ai/chat",
                json!({ "recipeId": recipe_id, "message": "How spicy is it?", "userId": "cook-1" }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let conversation_id = first["conversationId"].as_str().unwrap().to_string();

    let (status, _) = read_json(
        app.clone()
            .oneshot(post_json(
                "/api/ai/chat",
                json!({
                    "recipeId": recipe_id,
                    "message": "And for kids?",
                    "userId": "cook-1",
                    "conversationId": conversation_id
                }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // system + 2 stored turns + new message
    assert_eq!(provider.calls()[1].len(), 4);

    let (status, body) = read_json(
        app.oneshot(post_json(
            "/api/ai/chat",
            json!({
                "recipeId": recipe_id,
                "message": "Let me in",
                "userId": "cook-2",
                "conversationId": conversation_id
            }),
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Conversation belongs to another user");
}

#[tokio::test]
async fn test_chat_validation_and_lookup_errors() {
    let (app, recipe_id) = app_with_recipe(Arc::new(FakeProvider::default()), None).await;

    let (status, body) = read_json(
        app.clone()
            .oneshot(post_json("/api/ai/chat", json!({ "recipeId": recipe_id })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Recipe ID and message are required");

    let (status, body) = read_json(
        app.clone()
            .oneshot(post_json("/api/ai/chat", json!({ "recipeId": "nope", "message": "hi" })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipe not found");

    let (status, _) = read_json(
        app.oneshot(post_json(
            "/api/ai/chat",
            json!({ "recipeId": recipe_id, "message": "hi", "conversationId": "gone" }),
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_rate_limit_per_user() {
    let provider = Arc::new(FakeProvider::default());
    let (app, recipe_id) = app_with_recipe(provider.clone(), Some(2)).await;

    let ask = |user: &str| {
        post_json(
            "/api/ai/chat",
            json!({ "recipeId": recipe_id, "message": "hi", "userId": user }),
        )
    };

    for _ in 0..2 {
        let (status, _) = read_json(app.clone().oneshot(ask("busy")).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = read_json(app.clone().oneshot(ask("busy")).await.unwrap()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded. Try again later.");
    assert_eq!(provider.call_count(), 2);

    let (status, _) = read_json(app.oneshot(ask("quiet")).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_chat_provider_failure_is_500() {
    let (app, recipe_id) = app_with_recipe(Arc::new(FakeProvider::failing(502)), None).await;

    let (status, body) = read_json(
        app.oneshot(post_json("/api/ai/chat", json!({ "recipeId": recipe_id, "message": "hi" })))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to get AI response");
}
