//! The tailored résumé value object and its JSON schema.
//!
//! The Rust types are the validator: `ResumeDraft::from_value` rejects anything the
//! schema marks as required. `ResumeDraft::json_schema` is what the generator is
//! constrained with. Keep the two in lockstep when adding fields.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Contact block shown at the top of every rendered document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub duration: String,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub role: String,
    pub duration: String,
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
}

/// A structured résumé as returned by the rewrite endpoint.
///
/// Array order is presentation order. `skills` may contain duplicates; nothing
/// downstream deduplicates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDraft {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    pub skills: Vec<String>,
}

impl ResumeDraft {
    /// Validates an untyped generator response against the résumé shape.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Candidate name, if the draft carries a non-blank one.
    pub fn candidate_name(&self) -> Option<&str> {
        let name = self.personal_info.name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// JSON Schema handed to the structured generator as the tool input schema.
    pub fn json_schema() -> Value {
        let string_list = |description: &str| {
            json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description
            })
        };

        json!({
            "type": "object",
            "properties": {
                "personalInfo": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Name extracted from resume" },
                        "email": { "type": "string", "description": "Email address" },
                        "phone": { "type": "string", "description": "Phone number" },
                        "linkedin": {
                            "type": "string",
                            "description": "The LinkedIn URL. If the user provided one explicitly, use that. Otherwise, extract from resume."
                        }
                    },
                    "required": ["name", "email", "phone", "linkedin"]
                },
                "summary": {
                    "type": "string",
                    "description": "A professional summary tailored to the job description."
                },
                "experience": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "company": { "type": "string" },
                            "role": { "type": "string" },
                            "duration": { "type": "string" },
                            "description": string_list("Bullet points optimized for the job keywords")
                        },
                        "required": ["company", "role", "duration", "description"]
                    }
                },
                "education": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "institution": { "type": "string" },
                            "degree": { "type": "string" },
                            "year": { "type": "string" }
                        },
                        "required": ["institution", "degree", "year"]
                    }
                },
                "projects": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "role": { "type": "string", "description": "The candidate's role on the project, without dates" },
                            "duration": { "type": "string", "description": "When the project ran, without the role" },
                            "description": string_list("Bullet points describing the project"),
                            "link": { "type": "string", "description": "Project URL, if the resume lists one" }
                        },
                        "required": ["name", "role", "duration", "description"]
                    }
                },
                "certifications": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "issuer": { "type": "string" }
                        },
                        "required": ["name", "issuer"]
                    }
                },
                "skills": string_list("List of technical skills matching the job description")
            },
            "required": [
                "personalInfo",
                "summary",
                "experience",
                "education",
                "projects",
                "certifications",
                "skills"
            ]
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn full_draft() -> ResumeDraft {
        ResumeDraft {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: "+1 555 0100".to_string(),
                linkedin: "https://linkedin.com/in/jdoe".to_string(),
            },
            summary: "Backend engineer focused on reliable distributed systems.".to_string(),
            experience: vec![
                Experience {
                    company: "Acme Corp".to_string(),
                    role: "Senior Engineer".to_string(),
                    duration: "2021 - Present".to_string(),
                    description: vec![
                        "Cut p99 latency of the billing API by 40% by moving hot paths to Rust".to_string(),
                        "Led migration of 12 services to Kubernetes".to_string(),
                        "Mentored four engineers through on-call rotations".to_string(),
                    ],
                },
                Experience {
                    company: "Initech".to_string(),
                    role: "Software Engineer".to_string(),
                    duration: "2018 - 2021".to_string(),
                    description: vec!["Built the internal metrics pipeline".to_string()],
                },
            ],
            education: vec![Education {
                institution: "State University".to_string(),
                degree: "B.Sc. Computer Science".to_string(),
                year: "2018".to_string(),
            }],
            projects: vec![Project {
                name: "tinykv".to_string(),
                role: "Author".to_string(),
                duration: "2022".to_string(),
                description: vec![
                    "Embedded key-value store with a write-ahead log".to_string(),
                    "Fuzzed recovery path with cargo-fuzz".to_string(),
                ],
                link: Some("https://github.com/jdoe/tinykv".to_string()),
            }],
            certifications: vec![Certification {
                name: "CKA".to_string(),
                issuer: "CNCF".to_string(),
            }],
            skills: vec![
                "Rust".to_string(),
                "Kubernetes".to_string(),
                "PostgreSQL".to_string(),
                "Rust".to_string(),
            ],
        }
    }

    pub fn minimal_draft() -> ResumeDraft {
        ResumeDraft {
            education: vec![],
            projects: vec![],
            certifications: vec![],
            ..full_draft()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_camel_case_payload() {
        let value = json!({
            "personalInfo": {
                "name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555",
                "linkedin": "https://linkedin.com/in/jdoe"
            },
            "summary": "Engineer",
            "experience": [],
            "skills": ["Rust"]
        });

        let draft = ResumeDraft::from_value(value).unwrap();
        assert_eq!(draft.personal_info.name, "Jane Doe");
        assert!(draft.projects.is_empty());
        assert!(draft.education.is_empty());
        assert!(draft.certifications.is_empty());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let value = json!({
            "personalInfo": { "name": "Jane", "email": "", "phone": "", "linkedin": "" },
            "experience": [],
            "skills": []
        });
        assert!(ResumeDraft::from_value(value).is_err());
    }

    #[test]
    fn test_description_must_be_an_array() {
        let value = json!({
            "personalInfo": { "name": "Jane", "email": "", "phone": "", "linkedin": "" },
            "summary": "",
            "experience": [
                { "company": "Acme", "role": "Eng", "duration": "2020", "description": "not a list" }
            ],
            "skills": []
        });
        assert!(ResumeDraft::from_value(value).is_err());
    }

    #[test]
    fn test_serializes_empty_arrays_and_omits_missing_link() {
        let mut draft = fixtures::minimal_draft();
        draft.projects.push(Project {
            name: "p".to_string(),
            role: "r".to_string(),
            duration: "d".to_string(),
            description: vec![],
            link: None,
        });

        let value = serde_json::to_value(&draft).unwrap();
        assert!(value["education"].as_array().unwrap().is_empty());
        assert!(value["certifications"].as_array().unwrap().is_empty());
        assert!(value["projects"][0].get("link").is_none());
        assert!(value.get("personalInfo").is_some());
    }

    #[test]
    fn test_schema_requires_every_top_level_field() {
        let schema = ResumeDraft::json_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        let properties = schema["properties"].as_object().unwrap();

        assert_eq!(required.len(), properties.len());
        for key in properties.keys() {
            assert!(required.contains(&key.as_str()), "{key} not required");
        }
    }

    #[test]
    fn test_candidate_name_ignores_blank() {
        let mut draft = fixtures::minimal_draft();
        assert_eq!(draft.candidate_name(), Some("Jane Doe"));
        draft.personal_info.name = "   ".to_string();
        assert_eq!(draft.candidate_name(), None);
    }
}
