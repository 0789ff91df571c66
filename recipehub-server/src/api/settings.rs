//! Settings API endpoint
//!
//! `POST /api/settings/:key` stores a third-party API key. The database copy
//! is authoritative; the bootstrap TOML gets a best-effort mirror. Clients
//! built at startup pick the new key up on the next restart.

use super::ApiJson;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use recipehub_common::config::ApiKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SetSettingResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/:key
///
/// **Request:** `{"value": "..."}`
/// **Errors:** 400 for an unknown key or an empty value
pub async fn set_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    ApiJson(payload): ApiJson<SetSettingRequest>,
) -> ApiResult<Json<SetSettingResponse>> {
    let api_key = ApiKey::from_settings_key(&key)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown setting: {}", key)))?;

    if !crate::config::is_valid_key(&payload.value) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }

    let value = payload.value.trim().to_string();
    crate::db::settings::set_api_key(&state.db, api_key, value.clone())
        .await
        .map_err(|e| ApiError::internal_with_details("Failed to save setting to database", e))?;

    info!(key = %key, "API key configured via settings endpoint");

    if let Some(toml_path) = &state.config_path {
        let mut settings = HashMap::new();
        settings.insert(key.clone(), value);
        if let Err(e) = crate::config::sync_settings_to_toml(settings, toml_path).await {
            warn!("TOML sync failed (database write succeeded): {}", e);
        }
    }

    Ok(Json(SetSettingResponse {
        success: true,
        message: format!("{} configured successfully; restart to apply", key),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/:key", post(set_setting))
}
