use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_api::config::Config;
use tailor_api::extraction::PdfTextExtractor;
use tailor_api::llm_client::{self, LlmClient};
use tailor_api::routes::build_router;
use tailor_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "tailor_api={},tower_http={}",
                &config.rust_log, &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (serves both structured and streaming generation)
    let llm = Arc::new(LlmClient::from_config(&config)?);
    info!(
        "LLM client initialized (model: {}, max tokens: {})",
        llm_client::MODEL,
        config.llm_max_tokens
    );

    info!(
        "Limits: upload {} bytes, resume {} chars, job description {} chars, cover letter {}s",
        config.max_upload_bytes,
        config.limits.resume_chars,
        config.limits.job_description_chars,
        config.cover_letter_deadline_secs
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        extractor: Arc::new(PdfTextExtractor),
        generator: llm.clone(),
        streamer: llm,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the client origin once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
