pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cover_letter::handlers::handle_cover_letter;
use crate::extraction::handlers::handle_parse;
use crate::rewrite::handlers::handle_rewrite;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/parse",
            post(handle_parse).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/rewrite", post(handle_rewrite))
        .route("/cover-letter", post(handle_cover_letter))
        .with_state(state)
}
