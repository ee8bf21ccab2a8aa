//! Axum route handler for documentation uploads.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::session::Session;
use crate::state::AppState;
use crate::uploads::store::UploadError;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub filename: String,
}

/// POST /upload
///
/// Stores one plain-text file as the session's pending documentation. The next
/// `/analyze` call from the same session consumes it.
pub async fn handle_upload(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let contents = field
            .bytes()
            .await
            .map_err(|e| UploadError::Malformed(e.body_text()))?;

        let filename = state.uploads.store(&session.id, &filename, &contents).await?;

        let mut response = Json(UploadResponse {
            message: "File uploaded successfully",
            filename,
        })
        .into_response();
        if session.is_new {
            response
                .headers_mut()
                .insert(header::SET_COOKIE, session.cookie());
        }
        return Ok(response);
    }

    Err(UploadError::MissingFile.into())
}
