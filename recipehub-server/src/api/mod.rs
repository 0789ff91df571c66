//! HTTP API handlers for recipehub-server

pub mod ai;
pub mod health;
pub mod json;
pub mod recipes;
pub mod settings;
pub mod webhook;

pub use ai::ai_routes;
pub use health::health_routes;
pub use json::ApiJson;
pub use recipes::recipe_routes;
pub use settings::settings_routes;
pub use webhook::webhook_routes;
