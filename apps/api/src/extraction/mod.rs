//! Document extraction: PDF bytes in, plain text out.
//!
//! `AppState` holds an `Arc<dyn TextExtractor>`; `PdfTextExtractor` is the default.

pub mod handlers;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF library failed: {0}")]
    Library(String),

    #[error("document contains no extractable text")]
    NoText,

    #[error("extraction task failed: {0}")]
    Task(String),
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        AppError::Extraction(e.to_string())
    }
}

/// Maps an uploaded document's bytes to plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError>;
}

/// `pdf-extract` backed extractor. Parsing is CPU-bound, so it runs on the blocking pool.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<String, ExtractionError> {
        let size = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            // pdf-extract panics on some malformed inputs; the join error carries that.
            .map_err(|e| ExtractionError::Task(e.to_string()))?
            .map_err(|e| ExtractionError::Library(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }

        debug!("Extracted {} chars from {} byte PDF", text.chars().count(), size);
        Ok(text)
    }
}

/// True if the `%PDF-` header appears within the first KiB, as readers allow.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}
