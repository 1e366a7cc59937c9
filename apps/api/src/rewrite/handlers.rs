//! Axum route handler for the Rewrite API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppJson};
use crate::models::resume::ResumeDraft;
use crate::rewrite::generator::rewrite_resume;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

/// POST /rewrite
///
/// Tailors the résumé text to the job description and returns a `ResumeDraft`.
pub async fn handle_rewrite(
    State(state): State<AppState>,
    AppJson(request): AppJson<RewriteRequest>,
) -> Result<Json<ResumeDraft>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resumeText cannot be empty".to_string()));
    }
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }

    let draft = rewrite_resume(state.generator.as_ref(), &request, state.config.limits).await?;
    Ok(Json(draft))
}
