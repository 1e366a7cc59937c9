//! Cover-letter streaming with a hard deadline.
//!
//! The first fragment is awaited before anything is returned, so a generator that
//! fails up front becomes an `AppError` (500) instead of an empty 200 body. After
//! that, errors and the deadline simply end the stream.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{info, warn};

use crate::config::PromptLimits;
use crate::cover_letter::handlers::CoverLetterRequest;
use crate::cover_letter::prompts::{COVER_LETTER_SYSTEM, NO_JOB_DESCRIPTION, NO_RESUME_TEXT};
use crate::errors::AppError;
use crate::llm_client::prompts::bounded_or;
use crate::llm_client::TextStreamer;

/// Text fragments as relayed to the caller. Infallible by the time it gets here.
pub type LetterStream = BoxStream<'static, String>;

pub fn build_cover_letter_prompt(request: &CoverLetterRequest, limits: PromptLimits) -> String {
    format!(
        "RESUME:\n{}\n\nJOB DESCRIPTION:\n{}\n\nWrite the cover letter now.",
        bounded_or(request.resume_text.as_deref(), limits.resume_chars, NO_RESUME_TEXT),
        bounded_or(
            request.job_description.as_deref(),
            limits.job_description_chars,
            NO_JOB_DESCRIPTION
        ),
    )
}

/// Opens the generation stream and returns it once the first fragment has arrived.
pub async fn open_cover_letter_stream(
    streamer: &dyn TextStreamer,
    request: &CoverLetterRequest,
    limits: PromptLimits,
    deadline: Instant,
) -> Result<LetterStream, AppError> {
    let prompt = build_cover_letter_prompt(request, limits);

    let mut upstream = timeout_at(deadline, streamer.stream(COVER_LETTER_SYSTEM, &prompt))
        .await
        .map_err(|_| AppError::cover_letter_generation("deadline elapsed before stream opened"))?
        .map_err(|e| AppError::cover_letter_generation(format!("stream open failed: {e}")))?;

    let head = match timeout_at(deadline, upstream.next()).await {
        Err(_) => {
            return Err(AppError::cover_letter_generation(
                "deadline elapsed before first token",
            ))
        }
        Ok(Some(Err(e))) => {
            return Err(AppError::cover_letter_generation(format!(
                "stream failed before first token: {e}"
            )))
        }
        Ok(Some(Ok(chunk))) => Some(chunk),
        Ok(None) => None,
    };

    info!("Cover letter stream started");

    let deadline_hit = async move {
        sleep_until(deadline).await;
        warn!("Cover letter stream cut off at deadline");
    };

    Ok(stream::iter(head.map(Ok))
        .chain(upstream)
        .take_until(deadline_hit)
        .take_while(|item| {
            if let Err(e) = item {
                warn!("Cover letter stream ended early: {e}");
            }
            future::ready(item.is_ok())
        })
        .filter_map(|item| future::ready(item.ok()))
        .boxed())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::{LlmError, TextStream};

    /// Streams scripted items; optionally hangs forever afterwards.
    struct ScriptedStreamer {
        items: Mutex<Option<Vec<Result<String, String>>>>,
        hang_after: bool,
        fail_open: bool,
    }

    impl ScriptedStreamer {
        fn new(items: Vec<Result<&str, &str>>) -> Self {
            Self {
                items: Mutex::new(Some(
                    items
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                )),
                hang_after: false,
                fail_open: false,
            }
        }

        fn hanging(mut self) -> Self {
            self.hang_after = true;
            self
        }
    }

    #[async_trait]
    impl TextStreamer for ScriptedStreamer {
        async fn stream(&self, system: &str, _prompt: &str) -> Result<TextStream, LlmError> {
            assert_eq!(system, COVER_LETTER_SYSTEM);
            if self.fail_open {
                return Err(LlmError::EmptyContent);
            }
            let items = self.items.lock().unwrap().take().unwrap_or_default();
            let scripted = stream::iter(items.into_iter().map(|r| r.map_err(LlmError::Stream)));
            if self.hang_after {
                Ok(scripted.chain(stream::pending()).boxed())
            } else {
                Ok(scripted.boxed())
            }
        }
    }

    fn request() -> CoverLetterRequest {
        CoverLetterRequest {
            resume_text: Some("Jane Doe, Rust engineer".to_string()),
            job_description: Some("Build storage engines".to_string()),
        }
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn test_chunks_relayed_in_order() {
        let streamer = ScriptedStreamer::new(vec![Ok("Dear "), Ok("team,\n"), Ok("Hello.")]);
        let stream = open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), far_deadline())
            .await
            .unwrap();

        let text: String = stream.collect::<Vec<_>>().await.concat();
        assert_eq!(text, "Dear team,\nHello.");
    }

    #[tokio::test]
    async fn test_error_before_first_token_is_generation_error() {
        let streamer = ScriptedStreamer::new(vec![Err("overloaded")]);
        let result =
            open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), far_deadline()).await;
        assert!(matches!(result, Err(AppError::Generation { .. })));
    }

    #[tokio::test]
    async fn test_open_failure_is_generation_error() {
        let mut streamer = ScriptedStreamer::new(vec![]);
        streamer.fail_open = true;
        let result =
            open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), far_deadline()).await;
        assert!(matches!(result, Err(AppError::Generation { .. })));
    }

    #[tokio::test]
    async fn test_mid_stream_error_ends_stream() {
        let streamer = ScriptedStreamer::new(vec![Ok("one "), Ok("two "), Err("reset"), Ok("three")]);
        let stream = open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), far_deadline())
            .await
            .unwrap();

        let chunks: Vec<String> = stream.collect().await;
        assert_eq!(chunks, vec!["one ".to_string(), "two ".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_generation_is_empty_stream() {
        let streamer = ScriptedStreamer::new(vec![]);
        let stream = open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), far_deadline())
            .await
            .unwrap();
        assert!(stream.collect::<Vec<_>>().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cuts_stalled_stream() {
        let streamer = ScriptedStreamer::new(vec![Ok("partial")]).hanging();
        let deadline = Instant::now() + Duration::from_secs(30);
        let stream = open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), deadline)
            .await
            .unwrap();

        let chunks: Vec<String> = stream.collect().await;
        assert_eq!(chunks, vec!["partial".to_string()]);
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_before_first_token_is_error() {
        let streamer = ScriptedStreamer::new(vec![]).hanging();
        let deadline = Instant::now() + Duration::from_secs(30);
        let result = open_cover_letter_stream(&streamer, &request(), PromptLimits::default(), deadline).await;
        assert!(matches!(result, Err(AppError::Generation { .. })));
    }

    #[test]
    fn test_prompt_falls_back_and_bounds() {
        let empty = CoverLetterRequest::default();
        let prompt = build_cover_letter_prompt(&empty, PromptLimits::default());
        assert!(prompt.contains(NO_RESUME_TEXT));
        assert!(prompt.contains(NO_JOB_DESCRIPTION));

        let long = CoverLetterRequest {
            resume_text: Some("x".repeat(6000)),
            job_description: Some("y".repeat(4000)),
        };
        let prompt = build_cover_letter_prompt(&long, PromptLimits::default());
        assert_eq!(prompt.matches('x').count(), 5000);
        assert_eq!(prompt.matches('y').count(), 3000);
    }

    #[test]
    fn test_prompt_bound_counts_leading_whitespace() {
        let padded = CoverLetterRequest {
            resume_text: Some(format!("  {}", "x".repeat(6000))),
            job_description: Some("Rust".to_string()),
        };
        let prompt = build_cover_letter_prompt(&padded, PromptLimits::default());
        assert!(prompt.starts_with(&format!("RESUME:\n  {}\n", "x".repeat(4998))));
        assert_eq!(prompt.matches('x').count(), 4998);
    }
}
