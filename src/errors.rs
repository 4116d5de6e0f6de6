use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// --- Storage layer ---

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found with key: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error), // Wrap anyhow errors from the store layer
}

// --- Web layer ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("missing form field: {0}")]
    MissingFormField(String),
    #[error("error processing multipart form data: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("upload exceeds the configured limit of {0} bytes")]
    PayloadTooLarge(usize),

    // Credential missing, malformed, or wrong
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(String),

    // Store-layer failures, translated at this boundary
    #[error("could not perform file storage operation")]
    Storage(#[source] StorageError),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx client errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MissingFormField(field) => {
                (StatusCode::BAD_REQUEST, format!("Missing form field: {field}"))
            }
            AppError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid multipart form data: {e}"),
            ),
            AppError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Upload exceeds the {limit}-byte limit"),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            AppError::Storage(StorageError::NotFound(key)) => {
                (StatusCode::NOT_FOUND, format!("{key} not found"))
            }

            // 5xx server errors: log the detail, return a generic message.
            // Storage internals never reach the client.
            AppError::Storage(e) => {
                tracing::error!(error.source = ?e, "storage error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "File storage operation failed".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("internal server error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        tracing::debug!(error.message = %error_message, error.status = %status, "responding with error");

        let body = Json(serde_json::json!({ "error": error_message }));
        (status, body).into_response()
    }
}
