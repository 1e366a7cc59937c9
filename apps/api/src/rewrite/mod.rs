// Résumé rewrite: one structured-generation call, validated against the ResumeDraft schema.
// All LLM calls go through the StructuredGenerator trait.

pub mod generator;
pub mod handlers;
pub mod prompts;
