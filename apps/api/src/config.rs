use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on a `/parse` request body, in bytes.
    pub max_upload_bytes: usize,
    pub limits: PromptLimits,
    /// Wall-clock budget for a single cover-letter stream.
    pub cover_letter_deadline_secs: u64,
    pub llm_max_tokens: u32,
}

/// Character bounds applied to user text before it reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    pub resume_chars: usize,
    pub job_description_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            resume_chars: 5000,
            job_description_chars: 3000,
        }
    }
}

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PromptLimits::default();

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            limits: PromptLimits {
                resume_chars: parse_env("RESUME_CHAR_LIMIT", defaults.resume_chars)?,
                job_description_chars: parse_env(
                    "JOB_DESCRIPTION_CHAR_LIMIT",
                    defaults.job_description_chars,
                )?,
            },
            cover_letter_deadline_secs: parse_env("COVER_LETTER_DEADLINE_SECS", 30)?,
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", 4096)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
