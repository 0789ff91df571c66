//! Test Helper Utilities
//!
//! Shared utilities for testing recipehub-server through its router
#![allow(dead_code)]

pub mod fakes;

pub use fakes::{source_recipe, FakeRecipeSource, FakeVideoSearch};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use recipehub_common::config::{AiConfig, ChatConfig, ImportConfig};
use recipehub_server::services::llm::FakeProvider;
use recipehub_server::services::{Importer, RecipeSource, VideoSearch};
use recipehub_server::AppState;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const LIVEKIT_KEY: &str = "APItestkey";
pub const LIVEKIT_SECRET: &str = "livekit-test-secret";

/// Fresh in-memory database with the full schema
pub async fn test_db() -> SqlitePool {
    recipehub_common::db::init_memory_database().await.unwrap()
}

pub fn import_config() -> ImportConfig {
    ImportConfig {
        inter_item_delay_ms: 0,
        ..ImportConfig::default()
    }
}

pub fn fake_ai() -> AiConfig {
    AiConfig {
        provider: "fake".to_string(),
        ..AiConfig::default()
    }
}

/// State with every collaborator wired to a fake
pub fn test_state(
    db: SqlitePool,
    source: Arc<FakeRecipeSource>,
    videos: Option<Arc<FakeVideoSearch>>,
    provider: Arc<FakeProvider>,
) -> AppState {
    let state = AppState::new(db.clone(), &ChatConfig::default())
        .with_llm(provider, &fake_ai())
        .with_webhook_verifier(
            recipehub_server::services::WebhookVerifier::new(LIVEKIT_KEY, LIVEKIT_SECRET).unwrap(),
        );

    let source: Arc<dyn RecipeSource> = source;
    let mut importer = Importer::new(db, source.clone(), import_config());
    if let Some(generator) = state.directions.clone() {
        importer = importer.with_direction_generator(generator);
    }
    if let Some(videos) = videos {
        let videos: Arc<dyn VideoSearch> = videos;
        importer = importer.with_video_search(videos);
    }

    state.with_recipe_source(source).with_importer(importer)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Status and parsed JSON body
pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Authorization token for a webhook body, signed the way LiveKit signs it
pub fn sign_webhook(key: &str, secret: &str, body: &[u8]) -> String {
    let claims = json!({
        "iss": key,
        "nbf": chrono::Utc::now().timestamp() - 5,
        "exp": chrono::Utc::now().timestamp() + 300,
        "sha256": recipehub_server::services::livekit_webhook::body_hash(body),
    });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn webhook_request(body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/livekit/webhook")
        .header("content-type", "application/webhook+json");
    if let Some(token) = token {
        builder = builder.header("authorization", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
