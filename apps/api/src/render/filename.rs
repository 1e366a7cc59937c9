//! Download filenames derived from the candidate's name.

use crate::models::resume::ResumeDraft;
use crate::render::Format;

pub const DEFAULT_RESUME_STEM: &str = "Tailored_Resume";
pub const DEFAULT_COVER_LETTER_STEM: &str = "Cover_Letter";

/// `Jane Q. Doe` → `Jane_Q._Doe`. Runs of whitespace collapse to one underscore.
///
/// The name comes from model output, so the result must stay a single path
/// component: path separators and characters Windows rejects split words like
/// whitespace, and leading dots are stripped from every word.
pub fn underscore_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c.is_control() || is_reserved(c))
        .map(|word| word.trim_start_matches('.'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn is_reserved(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// Sanitized candidate name, or `None` when nothing usable is left.
fn name_stem(draft: Option<&ResumeDraft>) -> Option<String> {
    let stem = underscore_name(draft?.candidate_name()?);
    (!stem.is_empty()).then_some(stem)
}

pub fn resume_filename(draft: Option<&ResumeDraft>, format: Format) -> String {
    match name_stem(draft) {
        Some(stem) => format!("{stem}_Resume.{}", format.extension()),
        None => format!("{DEFAULT_RESUME_STEM}.{}", format.extension()),
    }
}

pub fn cover_letter_filename(draft: Option<&ResumeDraft>, format: Format) -> String {
    match name_stem(draft) {
        Some(stem) => format!("{stem}_Cover_Letter.{}", format.extension()),
        None => format!("{DEFAULT_COVER_LETTER_STEM}.{}", format.extension()),
    }
}
