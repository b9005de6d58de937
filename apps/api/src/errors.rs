use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::convert::ConvertError;

/// Application-level error type, one variant per failure family.
/// Implements `IntoResponse` so axum handlers can return `Result<T, AppError>`.
///
/// Every failure surfaces to the caller as a single human-readable message;
/// the specific cause is logged server-side. Nothing is retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// The identity provider rejected a credential operation.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The uploaded bytes are not a decodable image.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object store refused or failed a write or presign.
    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Record store error: {0}")]
    RecordStore(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ConvertError> for AppError {
    fn from(e: ConvertError) -> Self {
        match e {
            ConvertError::Decode(e) => AppError::Decode(e.to_string()),
            ConvertError::Io(e) => AppError::Io(e),
            ConvertError::Encode(msg) => {
                AppError::Internal(anyhow::anyhow!("PDF encode failed: {msg}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone()),
            AppError::Decode(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DECODE_ERROR",
                format!("Could not read the uploaded image: {msg}"),
            ),
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "A temporary-storage error occurred".to_string(),
                )
            }
            AppError::Upload(msg) => {
                tracing::error!("Object store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPLOAD_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::RecordStore(e) => {
                tracing::error!("Record store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RECORD_STORE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_decode_maps_to_decode() {
        let source = image::ImageError::IoError(std::io::Error::other("truncated"));
        let err = AppError::from(ConvertError::Decode(source));
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_convert_io_maps_to_io() {
        let source = std::io::Error::other("read-only filesystem");
        let err = AppError::from(ConvertError::Io(source));
        assert!(matches!(err, AppError::Io(_)));
    }
}
