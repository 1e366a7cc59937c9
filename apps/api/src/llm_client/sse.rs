//! Incremental decoder for the Messages API event stream.
//!
//! Bytes arrive in arbitrary chunks; events are only emitted once their blank-line
//! terminator has been seen, so a multi-byte character split across chunks is safe.

use serde::Deserialize;

use super::LlmError;

/// One `event:`/`data:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_block_end(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&block[..end]) {
                events.push(event);
            }
        }
        events
    }
}

fn find_block_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data_lines = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data_lines.push(value.to_string()),
            _ => {}
        }
    }

    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}

/// What a single stream event means for the text being generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Text(String),
    Stop,
    Ignore,
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}

/// Maps a decoded event to a text delta, a stop marker, or nothing.
pub fn interpret(event: &SseEvent) -> Result<StreamSignal, LlmError> {
    if event.data.trim().is_empty() {
        return Ok(StreamSignal::Ignore);
    }
    let payload: StreamPayload = serde_json::from_str(&event.data)?;

    match payload.kind.as_str() {
        "content_block_delta" => match payload.delta {
            Some(Delta {
                kind: Some(kind),
                text: Some(text),
            }) if kind == "text_delta" => Ok(StreamSignal::Text(text)),
            _ => Ok(StreamSignal::Ignore),
        },
        "message_stop" => Ok(StreamSignal::Stop),
        "error" => Err(LlmError::Stream(
            payload
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown stream error".to_string()),
        )),
        _ => Ok(StreamSignal::Ignore),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: &str = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n";

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let (a, b) = DELTA.as_bytes().split_at(30);

        assert!(decoder.push(a).is_empty());
        let events = decoder.push(b);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("content_block_delta"));
        assert_eq!(
            interpret(&events[0]).unwrap(),
            StreamSignal::Text("Hello".to_string())
        );
    }

    #[test]
    fn test_crlf_terminators_and_comments() {
        let mut decoder = SseDecoder::new();
        let raw = ": keepalive\r\n\r\nevent: ping\r\ndata: {\"type\":\"ping\"}\r\n\r\n";
        let events = decoder.push(raw.as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(interpret(&events[0]).unwrap(), StreamSignal::Ignore);
    }

    #[test]
    fn test_multibyte_character_split_between_chunks() {
        let raw = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"résumé\"}}\n\n";
        let bytes = raw.as_bytes();
        let split = raw.find('é').unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        let events = decoder.push(&bytes[split..]);
        assert_eq!(
            interpret(&events[0]).unwrap(),
            StreamSignal::Text("résumé".to_string())
        );
    }

    #[test]
    fn test_message_stop_and_error_events() {
        let mut decoder = SseDecoder::new();
        let raw = "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\nevent: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        let events = decoder.push(raw.as_bytes());
        assert_eq!(events.len(), 2);
        assert_eq!(interpret(&events[0]).unwrap(), StreamSignal::Stop);
        assert!(matches!(interpret(&events[1]), Err(LlmError::Stream(msg)) if msg == "Overloaded"));
    }

    #[test]
    fn test_multiple_data_lines_are_joined() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: one\ndata: two\n\n");
        assert_eq!(events[0].data, "one\ntwo");
        assert_eq!(events[0].event, None);
    }
}
