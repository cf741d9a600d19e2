//! HTTP error mapping for the recommender API.
//!
//! Every variant renders as a JSON body `{"error": "message"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use recipe_core::RecommendError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Request body is well-formed JSON but not a valid pantry request (422).
    Unprocessable(String),
    /// No recipe with the requested id (404).
    NotFound(String),
    /// The corpus index holds no recipes (503).
    ServiceUnavailable(String),
    /// Fit-time failures such as `EmptyDocument`; request handling never fits,
    /// so this only covers an index error surfacing where none is expected (500).
    Internal(String),
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::InvalidInput(_) => ApiError::Unprocessable(err.to_string()),
            RecommendError::EmptyCorpus => ApiError::ServiceUnavailable(err.to_string()),
            RecommendError::EmptyDocument { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
