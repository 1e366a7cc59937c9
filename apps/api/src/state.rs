use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::llm_client::{StructuredGenerator, TextStreamer};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds no per-request data: the service is stateless and every collaborator is
/// swappable behind a trait object (tests inject fakes here).
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// PDF → text. Default: `PdfTextExtractor`.
    pub extractor: Arc<dyn TextExtractor>,
    /// Schema-constrained résumé generation. Default: `LlmClient`.
    pub generator: Arc<dyn StructuredGenerator>,
    /// Streaming cover-letter generation. Default: `LlmClient`.
    pub streamer: Arc<dyn TextStreamer>,
}
