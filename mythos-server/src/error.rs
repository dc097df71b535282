use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the OAuth handshake itself, distinguishable at the caller.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("twitter api credentials are not configured")]
    Configuration,

    #[error("twitter request failed: {0}")]
    Upstream(#[from] twitter_api::TwitterApiError),

    #[error("invalid oauth state")]
    InvalidState,

    #[error("oauth state expired")]
    ExpiredState,

    #[error("oauth token mismatch")]
    TokenMismatch,

    #[error("state store failure: {0}")]
    Store(String),
}

/// Error surface of the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Flow(flow) => {
                let status = match &flow {
                    FlowError::InvalidState
                    | FlowError::ExpiredState
                    | FlowError::TokenMismatch => StatusCode::BAD_REQUEST,
                    FlowError::Upstream(_) => StatusCode::BAD_GATEWAY,
                    FlowError::Configuration | FlowError::Store(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, flow.to_string())
            }
            ApiError::Database(msg) | ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Internal(format!("configuration error: {err}"))
    }
}
