//! Format-neutral document structure.
//!
//! `resume_blocks` decides which sections exist and in what order; the PDF and DOCX
//! writers only decide how each block looks. An empty `projects`, `education`, or
//! `certifications` list produces no section at all, heading included.

use crate::models::resume::ResumeDraft;

pub const SUMMARY_TITLE: &str = "Professional Summary";
pub const EXPERIENCE_TITLE: &str = "Experience";
pub const PROJECTS_TITLE: &str = "Key Projects";
pub const EDUCATION_TITLE: &str = "Education";
pub const CERTIFICATIONS_TITLE: &str = "Certifications & Training";
pub const SKILLS_TITLE: &str = "Skills";

/// Label shown in place of the raw LinkedIn URL.
pub const LINKEDIN_LABEL: &str = "LinkedIn Profile";
/// Label shown for a project's link.
pub const PROJECT_LINK_LABEL: &str = "[Link]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactItem {
    Text(String),
    Link { label: String, url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Candidate name and the contact line beneath it.
    Header {
        name: String,
        contacts: Vec<ContactItem>,
    },
    SectionTitle(&'static str),
    Paragraph(String),
    /// A job or project: bold title line, right-aligned duration, one bullet per line.
    Entry {
        title: String,
        link: Option<String>,
        meta: String,
        bullets: Vec<String>,
    },
    /// Bold left text, plain right text. Education and certifications.
    Row { left: String, right: String },
    Badges(Vec<String>),
    /// One line of letter text. Blank lines are kept as vertical space.
    LetterLine(String),
}

pub fn header_block(draft: &ResumeDraft) -> Block {
    let info = &draft.personal_info;
    let mut contacts = Vec::new();

    if !info.email.trim().is_empty() {
        contacts.push(ContactItem::Text(info.email.trim().to_string()));
    }
    if !info.linkedin.trim().is_empty() {
        contacts.push(ContactItem::Link {
            label: LINKEDIN_LABEL.to_string(),
            url: info.linkedin.trim().to_string(),
        });
    }
    if !info.phone.trim().is_empty() {
        contacts.push(ContactItem::Text(info.phone.trim().to_string()));
    }

    Block::Header {
        name: info.name.trim().to_string(),
        contacts,
    }
}

pub fn resume_blocks(draft: &ResumeDraft) -> Vec<Block> {
    let mut blocks = vec![header_block(draft)];

    blocks.push(Block::SectionTitle(SUMMARY_TITLE));
    blocks.push(Block::Paragraph(draft.summary.clone()));

    blocks.push(Block::SectionTitle(EXPERIENCE_TITLE));
    for job in &draft.experience {
        blocks.push(Block::Entry {
            title: format!("{} | {}", job.role, job.company),
            link: None,
            meta: job.duration.clone(),
            bullets: job.description.clone(),
        });
    }

    if !draft.projects.is_empty() {
        blocks.push(Block::SectionTitle(PROJECTS_TITLE));
        for project in &draft.projects {
            blocks.push(Block::Entry {
                title: format!("{} | {}", project.name, project.role),
                link: project
                    .link
                    .as_deref()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
                meta: project.duration.clone(),
                bullets: project.description.clone(),
            });
        }
    }

    if !draft.education.is_empty() {
        blocks.push(Block::SectionTitle(EDUCATION_TITLE));
        for edu in &draft.education {
            blocks.push(Block::Row {
                left: edu.institution.clone(),
                right: format!("{} — {}", edu.degree, edu.year),
            });
        }
    }

    if !draft.certifications.is_empty() {
        blocks.push(Block::SectionTitle(CERTIFICATIONS_TITLE));
        for cert in &draft.certifications {
            blocks.push(Block::Row {
                left: cert.name.clone(),
                right: cert.issuer.clone(),
            });
        }
    }

    blocks.push(Block::SectionTitle(SKILLS_TITLE));
    blocks.push(Block::Badges(draft.skills.clone()));

    blocks
}

/// Header (when résumé data is available) followed by one block per line of `text`.
pub fn cover_letter_blocks(text: &str, draft: Option<&ResumeDraft>) -> Vec<Block> {
    let mut blocks = Vec::new();
    if let Some(draft) = draft {
        blocks.push(header_block(draft));
    }
    blocks.extend(text.lines().map(|line| Block::LetterLine(line.to_string())));
    blocks
}
