#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::{json, Value};

use tailor_api::config::{Config, PromptLimits};
use tailor_api::extraction::{ExtractionError, TextExtractor};
use tailor_api::llm_client::{LlmError, StructuredGenerator, TextStream, TextStreamer, ToolSchema};
use tailor_api::routes::build_router;
use tailor_api::state::AppState;

pub const BOUNDARY: &str = "tailor-test-boundary";

pub fn test_config() -> Config {
    Config {
        anthropic_api_key: "test-key".to_string(),
        anthropic_base_url: "http://127.0.0.1:9".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        max_upload_bytes: 4 * 1024,
        limits: PromptLimits::default(),
        cover_letter_deadline_secs: 30,
        llm_max_tokens: 1024,
    }
}

pub struct FakeExtractor {
    pub result: Result<String, String>,
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, _bytes: Bytes) -> Result<String, ExtractionError> {
        self.result.clone().map_err(ExtractionError::Library)
    }
}

/// Returns a canned value and records every prompt it receives.
pub struct FakeGenerator {
    pub response: Result<Value, String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn returning(value: Value) -> Self {
        Self {
            response: Ok(value),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl StructuredGenerator for FakeGenerator {
    async fn generate(
        &self,
        _system: &str,
        _schema: &ToolSchema,
        prompt: &str,
    ) -> Result<Value, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone().map_err(LlmError::Stream)
    }
}

/// Streams scripted fragments. `Err` items become stream errors.
pub struct FakeStreamer {
    pub items: Vec<Result<String, String>>,
    pub fail_open: bool,
}

impl FakeStreamer {
    pub fn chunks(chunks: &[&str]) -> Self {
        Self {
            items: chunks.iter().map(|c| Ok(c.to_string())).collect(),
            fail_open: false,
        }
    }
}

#[async_trait]
impl TextStreamer for FakeStreamer {
    async fn stream(&self, _system: &str, _prompt: &str) -> Result<TextStream, LlmError> {
        if self.fail_open {
            return Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            });
        }
        let items: Vec<Result<String, LlmError>> = self
            .items
            .iter()
            .cloned()
            .map(|item| item.map_err(LlmError::Stream))
            .collect();
        Ok(futures::stream::iter(items).boxed())
    }
}

pub struct Fakes {
    pub extractor: FakeExtractor,
    pub generator: FakeGenerator,
    pub streamer: FakeStreamer,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            extractor: FakeExtractor {
                result: Ok("Jane Doe\nSenior Engineer at Acme Corp".to_string()),
            },
            generator: FakeGenerator::returning(sample_draft_json()),
            streamer: FakeStreamer::chunks(&["Dear ", "hiring ", "team,"]),
        }
    }
}

pub fn app(fakes: Fakes) -> Router {
    build_router(AppState {
        config: test_config(),
        extractor: Arc::new(fakes.extractor),
        generator: Arc::new(fakes.generator),
        streamer: Arc::new(fakes.streamer),
    })
}

pub fn sample_draft_json() -> Value {
    json!({
        "personalInfo": {
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "+1 555 0100",
            "linkedin": "https://linkedin.com/in/someone-else"
        },
        "summary": "Backend engineer focused on reliable distributed systems.",
        "experience": [
            {
                "company": "Acme Corp",
                "role": "Senior Engineer",
                "duration": "2021 - Present",
                "description": [
                    "Cut p99 latency of the billing API by 40%",
                    "Led migration of 12 services to Kubernetes"
                ]
            }
        ],
        "education": [],
        "projects": [],
        "certifications": [],
        "skills": ["Rust", "Kubernetes"]
    })
}

pub fn multipart_request(field: &str, file: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"resume.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/parse")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
