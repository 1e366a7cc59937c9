//! Axum route handler for the Cover Letter API.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::cover_letter::generator::open_cover_letter_stream;
use crate::errors::{AppError, AppJson};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

/// POST /cover-letter
///
/// Streams the generated letter as chunked `text/plain`. The deadline is measured
/// from request arrival and is not retried.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    AppJson(request): AppJson<CoverLetterRequest>,
) -> Result<Response, AppError> {
    let deadline = Instant::now() + Duration::from_secs(state.config.cover_letter_deadline_secs);

    let letter = open_cover_letter_stream(
        state.streamer.as_ref(),
        &request,
        state.config.limits,
        deadline,
    )
    .await?;

    let body = Body::from_stream(letter.map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk))));

    let mut response = body.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}
