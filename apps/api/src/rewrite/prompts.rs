// Prompt constants for the rewrite endpoint.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Name of the tool the model must call with the finished résumé.
pub const RESUME_TOOL_NAME: &str = "emit_resume";

pub const RESUME_TOOL_DESCRIPTION: &str =
    "Return the tailored resume as structured data. Call this exactly once.";

/// System prompt for the rewrite. `{grounding_instruction}` is filled from
/// `llm_client::prompts::GROUNDING_INSTRUCTION`.
pub const REWRITE_SYSTEM_TEMPLATE: &str = r#"You are an expert resume writer.
1. Analyze the candidate's existing resume and the target job description.
2. Rewrite the resume to highlight experience relevant to the job.
3. Use keywords from the job description naturally. Do not keyword-stuff.
4. {grounding_instruction}
5. CRITICAL: If the "USER PROVIDED LINKEDIN URL" is not empty, you MUST use it for the personalInfo.linkedin field, ignoring any conflicting URL in the resume text.
6. For every project, put the candidate's role in `role` and the time period in `duration`. Never merge the two into one field.
7. If "ADDITIONAL INSTRUCTIONS" are provided, treat them as hard constraints on the rewrite. They never override rule 4.
8. Keep experience and projects in the order that best serves the job description. Leave education, projects, or certifications as empty arrays when the resume has none.
9. Respond only by calling the emit_resume tool."#;

pub const LINKEDIN_NOT_PROVIDED: &str = "Not provided, look in resume text.";
pub const NO_CUSTOM_INSTRUCTIONS: &str = "None.";
