//! Error types for the Verifile server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Core(#[from] verifile_core::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use verifile_core::Error as CoreError;

        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                (e.status(), "bad_request", format!("Failed to read upload: {}", e.body_text()))
            }
            AppError::Core(e) => match e {
                CoreError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "not_found", format!("Not found: {}", what))
                }
                CoreError::InvalidFileName(name) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_file_name",
                    format!("Invalid file name: {}", name),
                ),
                CoreError::EmptyInput => (
                    StatusCode::BAD_REQUEST,
                    "empty_batch",
                    "No files to build a Merkle tree from".to_string(),
                ),
                CoreError::NoTree => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no_tree",
                    "No Merkle tree has been built yet".to_string(),
                ),
                _ => {
                    tracing::error!("Core error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "An internal error occurred".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
