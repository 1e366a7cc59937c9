pub mod resume;

pub use resume::{Certification, Education, Experience, PersonalInfo, Project, ResumeDraft};
