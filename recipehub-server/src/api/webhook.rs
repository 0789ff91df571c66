//! LiveKit webhook endpoint

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::services::livekit_webhook::{handle_event, WebhookError, WebhookEvent};
use crate::{ApiResult, AppState};

/// POST /api/livekit/webhook
///
/// The body is read raw: its hash must match the signed token.
pub async fn livekit_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let verifier = state
        .webhook_verifier
        .as_ref()
        .ok_or(WebhookError::NotConfigured)?;

    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if let Err(e) = verifier.verify(&body, authorization) {
        tracing::warn!(error = %e, "Rejected webhook delivery");
        return Err(e.into());
    }

    let event = WebhookEvent::parse(&body)?;
    let outcome = handle_event(&state.db, &event).await?;

    tracing::info!(
        event = %outcome.event,
        room = ?outcome.room,
        applied = outcome.applied,
        "Webhook event processed"
    );

    Ok(Json(json!({ "received": true })))
}

/// Build webhook routes
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/api/livekit/webhook", post(livekit_webhook))
}
