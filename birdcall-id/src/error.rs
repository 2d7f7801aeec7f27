//! Error types for birdcall-id
//!
//! Every failure leaves the service as `{"error": {"code", "message"}}`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::RecognitionError;
use crate::types::CatalogError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Predicted species missing from the catalog (500)
    #[error("{0}")]
    SpeciesNotFound(String),

    /// Inference failed and was not masked (500)
    #[error("{0}")]
    InferenceUnavailable(String),

    /// Durable storage failed (500)
    #[error("{0}")]
    Storage(String),

    /// Catalog store failure (500)
    #[error("{0}")]
    Catalog(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Optional collaborator not configured (503)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SpeciesNotFound(_)
            | ApiError::InferenceUnavailable(_)
            | ApiError::Storage(_)
            | ApiError::Catalog(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::SpeciesNotFound(_) => "SPECIES_NOT_FOUND",
            ApiError::InferenceUnavailable(_) => "INFERENCE_UNAVAILABLE",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Catalog(_) => "CATALOG_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<RecognitionError> for ApiError {
    fn from(err: RecognitionError) -> Self {
        let message = err.to_string();
        match err {
            RecognitionError::Validation(_) => ApiError::BadRequest(message),
            RecognitionError::InferenceUnavailable(_) => ApiError::InferenceUnavailable(message),
            RecognitionError::Storage(_) => ApiError::Storage(message),
            RecognitionError::SpeciesNotFound(_) => ApiError::SpeciesNotFound(message),
            RecognitionError::Catalog(_) => ApiError::Catalog(message),
        }
    }
}

/// Direct catalog reads (`/birds`): a miss is a plain 404 there
impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::SpeciesNotFound(_) => ApiError::NotFound(message),
            CatalogError::Database(_) | CatalogError::Seed(_) => ApiError::Catalog(message),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::BadRequest("File size exceeds upload limit".to_string())
        } else {
            ApiError::BadRequest(format!("Invalid multipart request: {}", err.body_text()))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ValidationError;
    use crate::types::{InferenceError, StorageError};

    #[test]
    fn test_recognition_error_mapping() {
        let cases = [
            (
                RecognitionError::Validation(ValidationError::MissingFile),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
            ),
            (
                RecognitionError::InferenceUnavailable(InferenceError::Status {
                    status: 503,
                    body: String::new(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INFERENCE_UNAVAILABLE",
            ),
            (
                RecognitionError::Storage(StorageError::Upload("denied".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
            ),
            (
                RecognitionError::SpeciesNotFound("Unknown".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "SPECIES_NOT_FOUND",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_message_is_human_readable() {
        let api = ApiError::from(RecognitionError::SpeciesNotFound("Unknown".to_string()));
        assert_eq!(api.to_string(), "Bird species \"Unknown\" not found in database");
    }

    #[test]
    fn test_catalog_miss_on_direct_read_is_not_found() {
        let api = ApiError::from(CatalogError::SpeciesNotFound("Kiwi".to_string()));
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
    }
}
