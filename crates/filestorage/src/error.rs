use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use filestorage_core::StorageError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    InvalidFilename,
    NotFound(String),
    MissingFile,
    Multipart(MultipartError),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::InvalidFilename(reason) => {
                tracing::debug!(%reason, "rejected filename");
                Self::InvalidFilename
            }
            StorageError::NotFound(filename) => Self::NotFound(filename),
            StorageError::Io(err) => Self::Internal(format!("storage I/O error: {err}")),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        Self::Multipart(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidFilename => (StatusCode::BAD_REQUEST, "Invalid filename".to_string()),
            ApiError::NotFound(filename) => {
                tracing::debug!(%filename, "file not found");
                (StatusCode::NOT_FOUND, "File not found".to_string())
            }
            ApiError::MissingFile => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Missing file field".to_string(),
            ),
            ApiError::Multipart(err) => (err.status(), err.body_text()),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
