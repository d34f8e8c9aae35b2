/*
 * Responsibility
 * - Shared JSON error body ({"error": {"code", "message"}})
 * - AppError for handler-level failures (IntoResponse)
 * - StartupError: everything that stops the process before it serves
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth::access_jwt::InvalidKeyError;
use crate::services::auth::key_provider::KeyUnavailableError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Fatal errors raised while bootstrapping. None of these are recoverable:
/// the process exits instead of serving unverifiable requests.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    KeyUnavailable(#[from] KeyUnavailableError),
    #[error(transparent)]
    InvalidKey(#[from] InvalidKeyError),
    #[error("failed to build key-uri http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}
