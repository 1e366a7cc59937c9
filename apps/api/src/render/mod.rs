//! Document renderers: pure functions from a `ResumeDraft` (or cover-letter text) to
//! PDF or DOCX bytes.
//!
//! Both formats consume the same `layout::Block` list, so section suppression and
//! ordering are decided once. Output is byte-for-byte reproducible: no timestamps,
//! no random identifiers.

pub mod docx;
pub mod filename;
pub mod font_metrics;
pub mod layout;
pub mod pdf;

use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF construction failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Render(e.to_string())
    }
}

/// Output format of a rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Pdf,
    Docx,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Pdf => "application/pdf",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}
