//! recipehub-server library interface
//!
//! Exposes the router, application state and services so integration tests
//! can drive the HTTP API with fake collaborators.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use recipehub_common::config::{AiConfig, ChatConfig};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::direction_generator::default_directions_model;
use crate::services::{
    ChatRateLimiter, CounterStore, DirectionGenerator, Importer, LlmProvider, MemoryCounterStore,
    RecipeChat, RecipeSource, SqliteCounterStore, WebhookVerifier,
};

/// Application state shared across handlers
///
/// Collaborators whose credentials are missing stay `None`; the endpoints
/// that need them answer with a configuration error instead.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Recipe search
    pub source: Option<Arc<dyn RecipeSource>>,
    pub importer: Option<Importer>,
    pub directions: Option<DirectionGenerator>,
    pub chat: Option<RecipeChat>,
    pub chat_limiter: ChatRateLimiter,
    pub webhook_verifier: Option<Arc<WebhookVerifier>>,
    /// Bootstrap TOML that the settings endpoint mirrors keys into
    pub config_path: Option<PathBuf>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, chat_config: &ChatConfig) -> Self {
        let store: Arc<dyn CounterStore> = if chat_config.shared_counters {
            Arc::new(SqliteCounterStore::new(db.clone()))
        } else {
            Arc::new(MemoryCounterStore::new())
        };

        Self {
            chat_limiter: ChatRateLimiter::from_config(store, chat_config),
            db,
            source: None,
            importer: None,
            directions: None,
            chat: None,
            webhook_verifier: None,
            config_path: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_recipe_source(mut self, source: Arc<dyn RecipeSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_importer(mut self, importer: Importer) -> Self {
        self.importer = Some(importer);
        self
    }

    /// Wire direction generation and chat to one provider
    pub fn with_llm(mut self, provider: Arc<dyn LlmProvider>, ai: &AiConfig) -> Self {
        let directions_model = ai
            .directions_model
            .clone()
            .or_else(|| default_directions_model(provider.provider_name()));
        self.directions = Some(DirectionGenerator::new(provider.clone(), directions_model));
        self.chat = Some(RecipeChat::new(self.db.clone(), provider, ai.chat_model.clone()));
        self
    }

    pub fn with_chat_limiter(mut self, limiter: ChatRateLimiter) -> Self {
        self.chat_limiter = limiter;
        self
    }

    pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.webhook_verifier = Some(Arc::new(verifier));
        self
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::recipe_routes())
        .merge(api::ai_routes())
        .merge(api::webhook_routes())
        .merge(api::settings_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
