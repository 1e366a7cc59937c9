//! Axum route handler for the Parse API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::looks_like_pdf;
use crate::state::AppState;

/// Multipart field carrying the résumé.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub text: String,
}

/// POST /parse
///
/// Extracts plain text from an uploaded PDF. Nothing is persisted.
pub async fn handle_parse(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseResponse>, AppError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(FILE_FIELD) {
            upload = Some(field.bytes().await.map_err(multipart_error)?);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} byte upload limit",
            state.config.max_upload_bytes
        )));
    }
    if !looks_like_pdf(&bytes) {
        return Err(AppError::UnsupportedMediaType(
            "Only PDF files are supported".to_string(),
        ));
    }

    let size = bytes.len();
    let text = state.extractor.extract(bytes).await?;
    info!("Parsed {size} byte upload into {} chars", text.chars().count());

    Ok(Json(ParseResponse { text }))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}
