//! Session state and its reducer.
//!
//! All state lives here for the length of a session; nothing is persisted. Every
//! change goes through `reduce`, which is pure, so the interesting transitions can
//! be tested without a server.

use bytes::Bytes;

use crate::cover_letter::handlers::CoverLetterRequest;
use crate::models::resume::ResumeDraft;
use crate::rewrite::handlers::RewriteRequest;

/// A file the user picked. Held in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub upload: Option<UploadedDocument>,
    pub extracted_text: String,
    pub job_description: String,
    pub linkedin_url: String,
    pub custom_instructions: String,
    /// Last successfully generated résumé.
    pub resume: Option<ResumeDraft>,
    /// Last completed (or partially streamed) cover letter.
    pub cover_letter: String,
    /// Letter text accumulated from the stream currently open.
    pub letter_in_progress: Option<String>,
    pub parsing: bool,
    pub rewriting: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FileSelected(UploadedDocument),
    ParseStarted,
    ParseSucceeded(String),
    ParseFailed(String),
    JobDescriptionChanged(String),
    LinkedinUrlChanged(String),
    CustomInstructionsChanged(String),
    RewriteStarted,
    RewriteSucceeded(ResumeDraft),
    RewriteFailed(String),
    CoverLetterStarted,
    CoverLetterChunk(String),
    CoverLetterFinished,
    CoverLetterFailed(String),
    StartOver,
}

pub fn reduce(mut state: SessionState, action: Action) -> SessionState {
    match action {
        Action::FileSelected(document) => {
            state.upload = Some(document);
            state.extracted_text.clear();
            state.resume = None;
            state.cover_letter.clear();
            state.letter_in_progress = None;
            state.last_error = None;
        }
        Action::ParseStarted => {
            state.parsing = true;
            state.last_error = None;
        }
        Action::ParseSucceeded(text) => {
            state.parsing = false;
            state.extracted_text = text;
        }
        Action::ParseFailed(message) => {
            state.parsing = false;
            state.last_error = Some(message);
        }
        Action::JobDescriptionChanged(text) => state.job_description = text,
        Action::LinkedinUrlChanged(url) => state.linkedin_url = url,
        Action::CustomInstructionsChanged(text) => state.custom_instructions = text,
        Action::RewriteStarted => {
            state.rewriting = true;
            state.last_error = None;
        }
        Action::RewriteSucceeded(draft) => {
            state.rewriting = false;
            state.resume = Some(draft);
        }
        Action::RewriteFailed(message) => {
            // The previous résumé, if any, stays downloadable.
            state.rewriting = false;
            state.last_error = Some(message);
        }
        Action::CoverLetterStarted => {
            state.letter_in_progress = Some(String::new());
            state.last_error = None;
        }
        Action::CoverLetterChunk(chunk) => {
            if let Some(letter) = state.letter_in_progress.as_mut() {
                letter.push_str(&chunk);
            }
        }
        Action::CoverLetterFinished => {
            if let Some(letter) = state.letter_in_progress.take() {
                state.cover_letter = letter;
            }
        }
        Action::CoverLetterFailed(message) => {
            // Whatever arrived before the failure is kept; nothing at all keeps the old letter.
            if let Some(partial) = state.letter_in_progress.take() {
                if !partial.is_empty() {
                    state.cover_letter = partial;
                }
            }
            state.last_error = Some(message);
        }
        Action::StartOver => return SessionState::default(),
    }
    state
}

impl SessionState {
    pub fn can_parse(&self) -> bool {
        self.upload.is_some() && !self.parsing
    }

    pub fn can_generate(&self) -> bool {
        !self.extracted_text.trim().is_empty()
            && !self.job_description.trim().is_empty()
            && !self.rewriting
    }

    pub fn can_write_cover_letter(&self) -> bool {
        !self.extracted_text.trim().is_empty() && self.letter_in_progress.is_none()
    }

    /// The letter as the user currently sees it.
    pub fn visible_cover_letter(&self) -> &str {
        match &self.letter_in_progress {
            Some(letter) if !letter.is_empty() => letter,
            _ => &self.cover_letter,
        }
    }

    pub fn rewrite_request(&self) -> RewriteRequest {
        let non_blank = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        RewriteRequest {
            resume_text: self.extracted_text.clone(),
            job_description: self.job_description.clone(),
            linkedin_url: non_blank(&self.linkedin_url),
            custom_instructions: non_blank(&self.custom_instructions),
        }
    }

    pub fn cover_letter_request(&self) -> CoverLetterRequest {
        CoverLetterRequest {
            resume_text: Some(self.extracted_text.clone()),
            job_description: Some(self.job_description.clone()),
        }
    }
}
