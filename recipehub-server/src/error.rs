//! Error types for recipehub-server
//!
//! Every handler returns [`ApiResult`]. Service-level errors convert into
//! [`ApiError`] through `From` impls so handlers can use `?` directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::direction_generator::DirectionError;
use crate::services::importer::ImportError;
use crate::services::livekit_webhook::WebhookError;
use crate::services::llm::LlmError;
use crate::services::recipe_chat::ChatError;
use crate::services::recipe_source::SourceError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body missing, not JSON, or the wrong shape (400)
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    /// Missing or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. a concurrent import of the same source recipe
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller exceeded a rate limit (429)
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// Third-party service failed (502)
    #[error("{error}: {details}")]
    Upstream { error: String, details: String },

    /// Internal server error (500)
    #[error("{error}")]
    Internal {
        error: String,
        details: Option<String>,
    },

    /// recipehub-common error
    #[error("Common error: {0}")]
    Common(#[from] recipehub_common::Error),
}

impl ApiError {
    pub fn internal(error: impl Into<String>) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: None,
        }
    }

    pub fn internal_with_details(error: impl Into<String>, details: impl ToString) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: Some(details.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(err) => match err {
                recipehub_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                recipehub_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error, details) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg) => (msg, None),
            ApiError::InvalidBody(details) => ("Invalid JSON body".to_string(), Some(details)),
            ApiError::Upstream { error, details } => (error, Some(details)),
            ApiError::Internal { error, details } => (error, details),
            ApiError::Common(err) => match err {
                recipehub_common::Error::NotFound(msg)
                | recipehub_common::Error::InvalidInput(msg) => (msg, None),
                other => ("Internal server error".to_string(), Some(other.to_string())),
            },
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, details = ?details, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %error, "Request rejected");
        }

        let body = match details {
            Some(details) => json!({ "error": error, "details": details }),
            None => json!({ "error": error }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(id) => ApiError::NotFound(format!("Recipe not found: {}", id)),
            SourceError::NotConfigured(msg) => {
                ApiError::internal_with_details("Recipe source not configured", msg)
            }
            other => ApiError::Upstream {
                error: "Recipe source request failed".to_string(),
                details: other.to_string(),
            },
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        ApiError::internal_with_details("Failed to get AI response", err)
    }
}

impl From<DirectionError> for ApiError {
    fn from(err: DirectionError) -> Self {
        ApiError::internal_with_details("Failed to generate directions", err)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::RecipeNotFound(_) => ApiError::NotFound("Recipe not found".to_string()),
            ChatError::ConversationNotFound(_) => ApiError::NotFound("Conversation not found".to_string()),
            ChatError::NotOwner => {
                ApiError::Forbidden("Conversation belongs to another user".to_string())
            }
            ChatError::Llm(e) => e.into(),
            ChatError::Database(e) => e.into(),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Database(e) => ApiError::internal_with_details("Webhook processing failed", e),
            WebhookError::Malformed(msg) => ApiError::BadRequest(format!("Malformed webhook body: {}", msg)),
            WebhookError::NotConfigured => {
                ApiError::internal("Webhook verification credentials not configured")
            }
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Source(e) => e.into(),
            ImportError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ImportError::AlreadyImporting(id) => {
                ApiError::Conflict(format!("Recipe {} is already being imported", id))
            }
            ImportError::Persist(e) => ApiError::internal_with_details("Failed to import recipe", e),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
