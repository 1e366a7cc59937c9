//! Anthropic Messages API client.
//!
//! Handlers never talk to the API themselves. They hold `StructuredGenerator` and
//! `TextStreamer` trait objects, and `LlmClient` implements both.
//!
//! The model id is a constant, not configuration.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;
pub mod sse;

use sse::{SseDecoder, StreamSignal};

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model used for every call.
pub const MODEL: &str = "claude-sonnet-4-5";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM did not call tool '{0}'")]
    MissingToolCall(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Lazy, finite, non-restartable sequence of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// A named JSON schema the model is forced to fill in.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Structured generation: (system, schema, prompt) → object conforming to the schema.
///
/// Implementations do NOT validate the object; callers deserialize it into their own types.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        schema: &ToolSchema,
        prompt: &str,
    ) -> Result<Value, LlmError>;
}

/// Streaming generation: (system, prompt) → text fragments in generation order.
#[async_trait]
pub trait TextStreamer: Send + Sync {
    async fn stream(&self, system: &str, prompt: &str) -> Result<TextStream, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    pub name: Option<String>,
    pub input: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }

    /// Extracts the input the model passed to the named tool.
    pub fn tool_input(&self, tool: &str) -> Option<&Value> {
        self.content
            .iter()
            .find(|b| b.block_type == "tool_use" && b.name.as_deref() == Some(tool))
            .and_then(|b| b.input.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Every call is attempted once; a failed call fails the request that made it.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            endpoint: format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/')),
            max_tokens: 4096,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(config.anthropic_api_key.clone(), &config.anthropic_base_url)?
            .with_max_tokens(config.llm_max_tokens))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sends a request and returns the successful response with its body unread.
    async fn send(&self, request_body: &AnthropicRequest<'_>) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request_body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("LLM API returned {}: {}", status, body);
        // Anthropic wraps the message in {"error": {"message": ...}}; fall back to the raw body.
        let message = serde_json::from_str::<AnthropicError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Makes a non-streaming call, returning the full response object.
    async fn call(&self, request_body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let llm_response: LlmResponse = self.send(request_body).await?.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl StructuredGenerator for LlmClient {
    async fn generate(
        &self,
        system: &str,
        schema: &ToolSchema,
        prompt: &str,
    ) -> Result<Value, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: self.max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            tools: vec![AnthropicTool {
                name: schema.name,
                description: schema.description,
                input_schema: &schema.input_schema,
            }],
            tool_choice: Some(ToolChoice {
                kind: "tool",
                name: schema.name,
            }),
            stream: false,
        };

        let response = self.call(&request_body).await?;

        if let Some(input) = response.tool_input(schema.name) {
            return Ok(input.clone());
        }

        // Some responses answer in prose-wrapped JSON instead of a tool call.
        match response.text() {
            Some(text) => Ok(serde_json::from_str(strip_json_fences(text))?),
            None => Err(LlmError::MissingToolCall(schema.name.to_string())),
        }
    }
}

#[async_trait]
impl TextStreamer for LlmClient {
    async fn stream(&self, system: &str, prompt: &str) -> Result<TextStream, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: self.max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            tools: Vec::new(),
            tool_choice: None,
            stream: true,
        };

        let response = self.send(&request_body).await?;
        debug!("LLM stream opened");

        Ok(text_deltas(response.bytes_stream().boxed()))
    }
}

struct DeltaState {
    bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, LlmError>>,
    done: bool,
}

/// Turns a raw event-stream body into text deltas. Ends at `message_stop`, at the
/// end of the body, or right after the first error.
fn text_deltas(bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>) -> TextStream {
    let state = DeltaState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in st.decoder.push(&chunk) {
                        match sse::interpret(&event) {
                            Ok(StreamSignal::Text(text)) => st.pending.push_back(Ok(text)),
                            Ok(StreamSignal::Stop) => {
                                st.done = true;
                                break;
                            }
                            Ok(StreamSignal::Ignore) => {}
                            Err(e) => {
                                st.pending.push_back(Err(e));
                                st.done = true;
                                break;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    st.pending.push_back(Err(LlmError::Http(e)));
                }
                None => st.done = true,
            }
        }
    })
    .boxed()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
