//! Service modules for the recipe import pipeline and AI features
//!
//! Fetcher (`recipe_source`, `spoonacular_client`, `youtube_client`) →
//! `normalizer` → `direction_generator` (fallback) → `recipe_persister`,
//! orchestrated by `importer`. Chat, rate limiting and the live-session
//! webhook sit alongside.

pub mod direction_generator;
pub mod importer;
pub mod livekit_webhook;
pub mod llm;
pub mod normalizer;
pub mod rate_limiter;
pub mod recipe_chat;
pub mod recipe_persister;
pub mod recipe_source;
pub mod slug;
pub mod spoonacular_client;
pub mod youtube_client;

pub use direction_generator::{DirectionError, DirectionGenerator, DirectionRequest, IngredientLine};
pub use importer::{ImportError, ImportOptions, Importer};
pub use livekit_webhook::{WebhookError, WebhookEvent, WebhookVerifier};
pub use llm::{ChatMessage, LlmError, LlmProvider};
pub use rate_limiter::{ChatRateLimiter, CounterStore, MemoryCounterStore, SqliteCounterStore};
pub use recipe_chat::{ChatError, ChatReply, ChatRequest, RecipeChat};
pub use recipe_source::{RecipeSource, SourceError};
pub use spoonacular_client::SpoonacularClient;
pub use youtube_client::{VideoSearch, YouTubeClient};
