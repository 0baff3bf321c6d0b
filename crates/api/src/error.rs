use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storybook_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every variant renders as `{"success": false, "error": ..., "code": ...}`
/// so clients of the save endpoints can branch on `success` alone.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `storybook_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A filesystem error while writing a document or blob.
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Parse(msg) => (StatusCode::BAD_REQUEST, "MALFORMED_JSON", msg.clone()),
                CoreError::IdsExhausted => {
                    (StatusCode::CONFLICT, "IDS_EXHAUSTED", core.to_string())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Storage errors ---
            AppError::Io(err) => {
                tracing::error!(error = %err, "Failed to write public file");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to write file".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
