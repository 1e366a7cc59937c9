//! HTTP client for the three API endpoints.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use thiserror::Error;

use super::state::UploadedDocument;
use crate::cover_letter::handlers::CoverLetterRequest;
use crate::extraction::handlers::ParseResponse;
use crate::models::resume::ResumeDraft;
use crate::rewrite::handlers::RewriteRequest;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
}

/// Letter fragments in arrival order. Finite and not restartable.
pub type LetterChunks = BoxStream<'static, Result<String, ClientError>>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST /parse
    pub async fn parse(&self, document: &UploadedDocument) -> Result<String, ClientError> {
        let part = multipart::Part::bytes(document.bytes.to_vec())
            .file_name(document.file_name.clone())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self.http.post(self.url("/parse")).multipart(form).send().await?;
        let body: ParseResponse = check(response).await?.json().await?;
        Ok(body.text)
    }

    /// POST /rewrite
    pub async fn rewrite(&self, request: &RewriteRequest) -> Result<ResumeDraft, ClientError> {
        let response = self.http.post(self.url("/rewrite")).json(request).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// POST /cover-letter
    ///
    /// Resolves once the response headers arrive; the letter then streams through
    /// the returned chunks.
    pub async fn cover_letter(
        &self,
        request: &CoverLetterRequest,
    ) -> Result<LetterChunks, ClientError> {
        let response = self
            .http
            .post(self.url("/cover-letter"))
            .json(request)
            .send()
            .await?;
        let response = check(response).await?;
        Ok(decode_utf8(response.bytes_stream().boxed()))
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Incremental UTF-8 decoder. A character split across chunks is held back until
/// its remaining bytes arrive; invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flushes a trailing partial character, if the stream ended inside one.
    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }
}

fn decode_utf8(bytes: BoxStream<'static, reqwest::Result<Bytes>>) -> LetterChunks {
    futures::stream::unfold(
        Some((bytes, Utf8Decoder::default())),
        |state| async move {
            let (mut bytes, mut decoder) = state?;
            loop {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = decoder.push(&chunk);
                        if !text.is_empty() {
                            return Some((Ok(text), Some((bytes, decoder))));
                        }
                    }
                    Some(Err(e)) => return Some((Err(ClientError::Http(e)), None)),
                    None => {
                        let tail = decoder.finish();
                        return (!tail.is_empty()).then(|| (Ok(tail), None));
                    }
                }
            }
        },
    )
    .boxed()
}
