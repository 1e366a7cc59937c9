use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Server-side failures are collapsed to a fixed message; the cause only goes to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Generation error ({kind:?}): {message}")]
    Generation {
        kind: GenerationKind,
        message: String,
    },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Which generation call failed; selects the public message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Resume,
    CoverLetter,
}

impl AppError {
    pub fn resume_generation(message: impl Into<String>) -> Self {
        AppError::Generation {
            kind: GenerationKind::Resume,
            message: message.into(),
        }
    }

    pub fn cover_letter_generation(message: impl Into<String>) -> Self {
        AppError::Generation {
            kind: GenerationKind::CoverLetter,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Extraction(_)
            | AppError::Generation { .. }
            | AppError::Render(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `Json` that rejects with `AppError`, so malformed bodies get the same
/// `{ "error": ... }` shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Extractor rejections keep their 413/415 meaning; everything else is a bad request.
fn rejection_error(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(message),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::UnsupportedMediaType(message),
        _ => AppError::Validation(message),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejection_error(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        rejection_error(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::UnsupportedMediaType(msg) => msg.clone(),
            AppError::Extraction(msg) => {
                tracing::error!("PDF extraction error: {msg}");
                "Failed to parse PDF".to_string()
            }
            AppError::Generation { kind, message } => {
                tracing::error!("LLM error ({kind:?}): {message}");
                match kind {
                    GenerationKind::Resume => "Failed to generate resume".to_string(),
                    GenerationKind::CoverLetter => "Error generating cover letter".to_string(),
                }
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                "Failed to render document".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
