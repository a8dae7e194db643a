//! Error types shared by the route handlers and the outbound clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::sanitize::ExtractError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while talking to collaborators or the database.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model output unusable: {0}")]
    ModelOutput(#[from] ExtractError),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("{0}")]
    Speech(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Caller-facing error, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized => "Unauthorized",
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        tracing::error!(error = %err, "request failed");
        ApiError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.message() });
        (self.status(), Json(body)).into_response()
    }
}
