// Shared prompt fragments and prompt-building utilities.
// Each endpoint that needs LLM calls defines its own prompts.rs alongside it.
// This file contains the cross-cutting pieces.

/// Instruction shared by every generation prompt: reframe, never fabricate.
pub const GROUNDING_INSTRUCTION: &str = "\
    DO NOT invent false experience, employers, dates, degrees, or metrics. \
    Only reframe what the candidate's resume already states. \
    If the resume does not support a claim, leave it out.";

/// Bounds `text` to at most `max_chars` Unicode scalar values.
/// Anything past the bound is dropped silently.
pub fn bounded(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Bounds `text`, or substitutes `fallback` when it is blank.
/// Only the blank check looks at trimmed text; the bound applies to the raw input.
pub fn bounded_or<'a>(text: Option<&'a str>, max_chars: usize, fallback: &'a str) -> &'a str {
    match text {
        Some(t) if !t.trim().is_empty() => bounded(t, max_chars),
        _ => fallback,
    }
}
