//! LiveKit webhook verification and dispatch
//!
//! LiveKit signs each delivery with an HS256 JWT in the `Authorization`
//! header. The token's issuer is the API key and its `sha256` claim is the
//! base64 SHA-256 digest of the raw request body. Verified events are applied
//! to the `live_sessions` table; events for unknown rooms are logged and
//! acknowledged.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::live_sessions;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing Authorization header")]
    MissingAuthorization,

    #[error("Invalid webhook token: {0}")]
    InvalidToken(String),

    #[error("Webhook token carries no body hash")]
    MissingBodyHash,

    #[error("Webhook body hash mismatch")]
    BodyHashMismatch,

    #[error("Webhook credentials not configured")]
    NotConfigured,

    #[error("{0}")]
    Malformed(String),

    #[error(transparent)]
    Database(#[from] recipehub_common::Error),
}

#[derive(Debug, Deserialize)]
struct WebhookClaims {
    #[serde(default)]
    sha256: Option<String>,
}

/// Verifies signed webhook deliveries
pub struct WebhookVerifier {
    api_key: String,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self, WebhookError> {
        if api_key.trim().is_empty() || api_secret.trim().is_empty() {
            return Err(WebhookError::NotConfigured);
        }
        Ok(Self {
            api_key: api_key.to_string(),
            decoding_key: DecodingKey::from_secret(api_secret.as_bytes()),
        })
    }

    /// Check the token against the raw body
    pub fn verify(&self, body: &[u8], authorization: Option<&str>) -> Result<(), WebhookError> {
        let token = authorization
            .map(str::trim)
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|value| !value.is_empty())
            .ok_or(WebhookError::MissingAuthorization)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.api_key]);
        validation.set_required_spec_claims(&["iss"]);
        validation.validate_aud = false;

        let claims = jsonwebtoken::decode::<WebhookClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| WebhookError::InvalidToken(e.to_string()))?
            .claims;

        let expected = claims.sha256.ok_or(WebhookError::MissingBodyHash)?;
        if body_hash(body) != expected {
            return Err(WebhookError::BodyHashMismatch);
        }

        Ok(())
    }
}

/// base64(SHA-256(body))
pub fn body_hash(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub room: Option<RoomInfo>,
    #[serde(default)]
    pub participant: Option<ParticipantInfo>,
    #[serde(default)]
    pub egress_info: Option<EgressInfo>,

    // Older deliveries carry the egress fields at the top level
    #[serde(default)]
    pub egress_id: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub file_results: Vec<FileResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomInfo {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantInfo {
    #[serde(default)]
    pub identity: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressInfo {
    #[serde(default)]
    pub egress_id: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub file_results: Vec<FileResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))
    }

    fn room_name(&self) -> Option<&str> {
        self.room
            .as_ref()
            .map(|r| r.name.as_str())
            .filter(|name| !name.is_empty())
    }

    fn egress_room(&self) -> Option<&str> {
        self.egress_info
            .as_ref()
            .and_then(|e| e.room_name.as_deref())
            .or(self.room_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    fn egress_id(&self) -> Option<&str> {
        self.egress_info
            .as_ref()
            .and_then(|e| e.egress_id.as_deref())
            .or(self.egress_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Download URL (or storage location) of the first file result
    fn recording_url(&self) -> Option<&str> {
        let results = match &self.egress_info {
            Some(info) if !info.file_results.is_empty() => &info.file_results,
            _ => &self.file_results,
        };
        results.first().and_then(|file| {
            file.download_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .or(file.location.as_deref())
        })
    }
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub event: String,
    pub room: Option<String>,
    /// A live session row was changed
    pub applied: bool,
}

/// Apply a verified event to the live sessions table
pub async fn handle_event(db: &SqlitePool, event: &WebhookEvent) -> Result<WebhookOutcome, WebhookError> {
    let (room, applied) = match event.event.as_str() {
        "room_started" => match event.room_name() {
            Some(room) => (Some(room), live_sessions::ensure_session(db, room, room).await?),
            None => (None, false),
        },
        "room_finished" => match event.room_name() {
            Some(room) => (Some(room), live_sessions::mark_room_finished(db, room).await?),
            None => (None, false),
        },
        "participant_joined" => match event.room_name() {
            Some(room) => {
                let count = live_sessions::increment_viewers(db, room).await?;
                tracing::info!(
                    room,
                    participant = event.participant.as_ref().map(|p| p.identity.as_str()),
                    viewer_count = ?count,
                    "Participant joined"
                );
                (Some(room), count.is_some())
            }
            None => (None, false),
        },
        "participant_left" => match event.room_name() {
            Some(room) => (Some(room), live_sessions::decrement_viewers(db, room).await?),
            None => (None, false),
        },
        "egress_started" => match (event.egress_room(), event.egress_id()) {
            (Some(room), Some(egress_id)) => (
                Some(room),
                live_sessions::mark_recording_started(db, room, egress_id).await?,
            ),
            (room, _) => (room, false),
        },
        "egress_ended" => match (event.egress_room(), event.egress_id(), event.recording_url()) {
            (Some(room), Some(egress_id), Some(url)) => {
                let applied = live_sessions::mark_recording_ended(db, room, egress_id, url).await?;
                if applied {
                    tracing::info!(room, recording_url = url, "Recording completed");
                }
                (Some(room), applied)
            }
            (room, _, _) => (room, false),
        },
        other => {
            tracing::debug!(event = other, "Unhandled webhook event");
            (event.room_name().or(event.egress_room()), false)
        }
    };

    if !applied {
        tracing::info!(event = %event.event, room = ?room, "Webhook event changed no live session");
    }

    Ok(WebhookOutcome {
        event: event.event.clone(),
        room: room.map(str::to_string),
        applied,
    })
}
