//! Request/response types and the API error for the web endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::features::FeatureError;
use crate::llm::LlmError;
use crate::store::{ChatMessage, KnowledgeStats, StoreError};

/// Response for GET /api/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Service state, always "ok" when reachable.
    pub status: String,
    /// Configured LLM model.
    pub model: String,
    /// Whether any client is connected to the SSE stream.
    pub connected: bool,
    /// Knowledge store summary.
    #[serde(flatten)]
    pub stats: KnowledgeStats,
}

/// Request for POST /api/process-content.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessContentRequest {
    /// URL or raw text to process.
    pub content: String,
}

/// Response for POST /api/process-content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessContentResponse {
    pub item_id: String,
    pub title: String,
    pub key_concepts: Vec<String>,
    pub insights: Vec<String>,
}

/// Request for POST /api/session/:id/chat.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response for POST /api/session/:id/chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
}

/// Error payload returned by failing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors surfaced by API handlers, mapped onto HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Feature(FeatureError::Llm(LlmError::MissingApiKey(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Feature(FeatureError::Llm(_) | FeatureError::Content(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Feature(FeatureError::Store(StoreError::UnknownSession(_))) => {
                StatusCode::NOT_FOUND
            }
            Self::Feature(FeatureError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(status = %status, error = %self, "API request failed");
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
