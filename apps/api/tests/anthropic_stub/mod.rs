#![allow(dead_code)]

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

/// How the stub answers `POST /v1/messages`.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Non-streaming calls answer with a `tool_use` block carrying `input`.
    ToolUse { input: Value },
    /// Non-streaming calls answer with fenced JSON in a text block.
    FencedText { input: Value },
    /// Streaming calls emit these deltas, then `message_stop`.
    Stream { deltas: Vec<String> },
    /// Streaming calls emit these deltas, then an `error` event.
    StreamThenError { deltas: Vec<String> },
    /// Every call fails with this status and an Anthropic-style error body.
    Fail { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub api_key: Option<String>,
    pub version: Option<String>,
    pub body: Value,
}

pub struct AnthropicStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AnthropicStub {
    pub fn spawn(behavior: StubBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start anthropic stub server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            if request.method() != &tiny_http::Method::Post || request.url() != "/v1/messages" {
                let _ = request.respond(
                    tiny_http::Response::from_string("not found").with_status_code(404),
                );
                continue;
            }

            let header = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv(name))
                    .map(|h| h.value.as_str().to_string())
            };
            let api_key = header("x-api-key");
            let version = header("anthropic-version");

            let mut body = String::new();
            if request.as_reader().read_to_string(&mut body).is_err() {
                let _ = request.respond(
                    tiny_http::Response::from_string("invalid request body").with_status_code(400),
                );
                continue;
            }
            let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
            recorded.lock().unwrap().push(RecordedRequest {
                api_key,
                version,
                body,
            });

            let (status, content_type, payload) = respond(&behavior, streaming);
            let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                .expect("build header");
            let _ = request.respond(
                tiny_http::Response::from_string(payload)
                    .with_status_code(status)
                    .with_header(header),
            );
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for AnthropicStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond(behavior: &StubBehavior, streaming: bool) -> (u16, &'static str, String) {
    match behavior {
        StubBehavior::Fail { status, message } => (
            *status,
            "application/json",
            json!({ "type": "error", "error": { "type": "api_error", "message": message } })
                .to_string(),
        ),
        StubBehavior::ToolUse { input } if !streaming => (
            200,
            "application/json",
            message_body(json!([
                { "type": "tool_use", "id": "toolu_stub", "name": "emit_resume", "input": input }
            ])),
        ),
        StubBehavior::FencedText { input } if !streaming => (
            200,
            "application/json",
            message_body(json!([
                { "type": "text", "text": format!("```json\n{input}\n```") }
            ])),
        ),
        StubBehavior::Stream { deltas } if streaming => {
            (200, "text/event-stream", event_stream(deltas, false))
        }
        StubBehavior::StreamThenError { deltas } if streaming => {
            (200, "text/event-stream", event_stream(deltas, true))
        }
        _ => (
            400,
            "application/json",
            json!({ "type": "error", "error": { "type": "invalid_request_error", "message": "unexpected call mode" } })
                .to_string(),
        ),
    }
}

fn message_body(content: Value) -> String {
    json!({
        "id": "msg_stub",
        "type": "message",
        "role": "assistant",
        "model": "stub-model",
        "content": content,
        "stop_reason": "tool_use",
        "usage": { "input_tokens": 12, "output_tokens": 34 }
    })
    .to_string()
}

fn event_stream(deltas: &[String], fail: bool) -> String {
    let mut out = String::new();
    let mut event = |name: &str, data: Value| {
        out.push_str(&format!("event: {name}\ndata: {data}\n\n"));
    };

    event(
        "message_start",
        json!({ "type": "message_start", "message": { "id": "msg_stub", "usage": { "input_tokens": 12, "output_tokens": 1 } } }),
    );
    event(
        "content_block_start",
        json!({ "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "" } }),
    );
    event("ping", json!({ "type": "ping" }));
    for delta in deltas {
        event(
            "content_block_delta",
            json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": delta } }),
        );
    }
    if fail {
        event(
            "error",
            json!({ "type": "error", "error": { "type": "overloaded_error", "message": "Overloaded" } }),
        );
        return out;
    }
    event(
        "content_block_stop",
        json!({ "type": "content_block_stop", "index": 0 }),
    );
    event("message_stop", json!({ "type": "message_stop" }));
    out
}
