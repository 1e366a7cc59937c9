//! Résumé rewrite: builds the prompt, calls the structured generator once, and
//! validates the result against `ResumeDraft`.
//!
//! There is no retry or repair: a malformed response fails the whole request.

use tracing::info;

use crate::config::PromptLimits;
use crate::errors::AppError;
use crate::llm_client::prompts::{bounded, GROUNDING_INSTRUCTION};
use crate::llm_client::{StructuredGenerator, ToolSchema};
use crate::models::resume::ResumeDraft;
use crate::rewrite::handlers::RewriteRequest;
use crate::rewrite::prompts::{
    LINKEDIN_NOT_PROVIDED, NO_CUSTOM_INSTRUCTIONS, RESUME_TOOL_DESCRIPTION, RESUME_TOOL_NAME,
    REWRITE_SYSTEM_TEMPLATE,
};

/// Request fields after truncation and blank-stripping; what actually reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRewrite<'a> {
    pub resume_text: &'a str,
    pub job_description: &'a str,
    pub linkedin_url: Option<&'a str>,
    pub custom_instructions: Option<&'a str>,
}

impl<'a> PreparedRewrite<'a> {
    pub fn new(request: &'a RewriteRequest, limits: PromptLimits) -> Self {
        Self {
            resume_text: bounded(&request.resume_text, limits.resume_chars),
            job_description: bounded(&request.job_description, limits.job_description_chars),
            linkedin_url: non_blank(request.linkedin_url.as_deref()),
            custom_instructions: non_blank(request.custom_instructions.as_deref()),
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "RESUME TEXT:\n{}\n\nJOB DESCRIPTION:\n{}\n\nUSER PROVIDED LINKEDIN URL:\n{}\n\nADDITIONAL INSTRUCTIONS:\n{}\n",
            self.resume_text,
            self.job_description,
            self.linkedin_url.unwrap_or(LINKEDIN_NOT_PROVIDED),
            self.custom_instructions.unwrap_or(NO_CUSTOM_INSTRUCTIONS),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn rewrite_system_prompt() -> String {
    REWRITE_SYSTEM_TEMPLATE.replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
}

pub fn resume_tool() -> ToolSchema {
    ToolSchema {
        name: RESUME_TOOL_NAME,
        description: RESUME_TOOL_DESCRIPTION,
        input_schema: ResumeDraft::json_schema(),
    }
}

/// Runs one rewrite against `generator`.
///
/// A supplied LinkedIn URL is written over whatever the model returned, so the
/// precedence rule holds even when the model ignores the instruction.
pub async fn rewrite_resume(
    generator: &dyn StructuredGenerator,
    request: &RewriteRequest,
    limits: PromptLimits,
) -> Result<ResumeDraft, AppError> {
    let prepared = PreparedRewrite::new(request, limits);

    let value = generator
        .generate(&rewrite_system_prompt(), &resume_tool(), &prepared.prompt())
        .await
        .map_err(|e| AppError::resume_generation(format!("Rewrite LLM call failed: {e}")))?;

    let mut draft = ResumeDraft::from_value(value).map_err(|e| {
        AppError::resume_generation(format!("Rewrite response failed schema validation: {e}"))
    })?;

    if let Some(url) = prepared.linkedin_url {
        draft.personal_info.linkedin = url.to_string();
    }

    info!(
        "Rewrote resume: {} experience, {} projects, {} skills",
        draft.experience.len(),
        draft.projects.len(),
        draft.skills.len()
    );

    Ok(draft)
}
