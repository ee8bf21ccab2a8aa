use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::uploads::store::UploadError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders as the flat `{"error": "<message>"}` body the browser
/// client reads. Server-side detail is logged and never echoed back.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upload(UploadError::Io(e)) => {
                tracing::error!("Upload I/O error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The file could not be saved. Please try again.".to_string(),
                )
            }
            AppError::Upload(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_bad_request_with_flat_error() {
        let response = AppError::Validation("too short".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "too short" }));
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_bad_request() {
        let response = AppError::from(UploadError::UnsupportedExtension).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("plain-text"));
    }

    #[tokio::test]
    async fn test_upload_io_error_hides_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full at /srv/secret");
        let response = AppError::from(UploadError::Io(io)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap().contains("/srv/secret"));
    }
}
