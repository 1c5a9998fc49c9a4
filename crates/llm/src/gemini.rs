//! Gemini `generateContent` client.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use regex::Regex;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{LlmError, Result};
use crate::prompts::{strip_code_fences, teacher_guide_prompt};
use crate::GuideGenerator;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Longest single wait between attempts, whatever the server suggests.
pub const MAX_BACKOFF: Duration = Duration::from_secs(600);

/// "retry in 12.5s", "retryDelay: 30s" and similar hints in error text.
static RETRY_HINT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)retry[\s_-]?(?:in|delay)["':\s]+([\d.]+)s"#).unwrap());

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the first retry; doubles after each wait.
    pub initial_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            max_attempts: 4,
            initial_backoff: Duration::from_secs(10),
            max_error_body_bytes: 8 * 1024,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .user_agent("teacher-guide-generator")
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// One `generateContent` call; returns the concatenated candidate text.
    pub async fn generate_content(&self, prompt: &str) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(self.to_api_error(resp).await);
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .iter()
            .flat_map(|c| c.content.iter())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| parsed.candidates.first().and_then(|c| c.finish_reason.clone()))
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(LlmError::EmptyResponse(reason));
        }

        Ok(text)
    }

    /// Generate with backoff on rate limiting.
    pub async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        let text = retry_rate_limited(self.config.max_attempts, self.config.initial_backoff, || {
            self.generate_content(prompt)
        })
        .await?;
        Ok(strip_code_fences(&text))
    }

    async fn to_api_error(&self, resp: reqwest::Response) -> LlmError {
        let status = resp.status();
        let header_hint = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());
        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                let detail_hint = envelope
                    .error
                    .details
                    .iter()
                    .filter_map(|d| d.retry_delay.as_deref())
                    .find_map(parse_seconds);
                let message = envelope
                    .error
                    .message
                    .unwrap_or_else(|| "unknown upstream error".to_string());
                let retry_after = detail_hint
                    .or_else(|| retry_hint(&message))
                    .or(header_hint);
                LlmError::Api {
                    status: status.as_u16(),
                    status_text: envelope.error.status.unwrap_or_default(),
                    message,
                    retry_after,
                }
            }
            Err(_) => LlmError::Api {
                status: status.as_u16(),
                status_text: String::new(),
                retry_after: retry_hint(&body).or(header_hint),
                message: body,
            },
        }
    }
}

impl GuideGenerator for GeminiClient {
    fn generate<'a>(&'a self, file_name: &'a str, slide_text: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let prompt = teacher_guide_prompt(file_name, slide_text);
            log::info!(
                "Generating guide for {} ({} chars of slide text) with {}",
                file_name,
                slide_text.len(),
                self.config.model
            );
            self.generate_with_retry(&prompt).await
        })
    }
}

/// Run `call` until it stops being rate limited, up to `max_attempts` times.
///
/// Each wait is the larger of the server hint and the current delay; the
/// delay then doubles from that wait. Other errors are returned at once.
async fn retry_rate_limited<F, Fut>(max_attempts: u32, initial_backoff: Duration, mut call: F) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let attempts = max_attempts.max(1);
    let mut delay = initial_backoff;

    for attempt in 1..=attempts {
        match call().await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_rate_limited() => {
                if attempt == attempts {
                    log::error!("Gemini rate limited on all {} attempts", attempts);
                    return Err(LlmError::QuotaExhausted);
                }
                let wait = backoff_wait(delay, e.retry_after());
                log::warn!(
                    "Gemini rate limited (attempt {}/{}), retrying in {:.1}s",
                    attempt,
                    attempts,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                delay = wait.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::QuotaExhausted)
}

/// The larger of `delay` and the hinted seconds, capped at [`MAX_BACKOFF`].
///
/// Negative and non-finite hints are ignored.
fn backoff_wait(delay: Duration, hint: Option<f64>) -> Duration {
    let suggested = match hint {
        Some(secs) if secs.is_finite() && secs >= 0.0 => {
            Duration::try_from_secs_f64(secs).unwrap_or(MAX_BACKOFF)
        }
        _ => Duration::ZERO,
    };
    suggested.max(delay).min(MAX_BACKOFF)
}

/// Parse "30s" / "12.5s" durations as used by `RetryInfo.retryDelay`.
fn parse_seconds(value: &str) -> Option<f64> {
    value.trim().trim_end_matches('s').parse().ok()
}

/// Find a retry hint in free-form error text.
fn retry_hint(text: &str) -> Option<f64> {
    RETRY_HINT_REGEX
        .captures(text)
        .and_then(|c| c[1].trim_end_matches('.').parse().ok())
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            log::warn!("failed to read Gemini error body: {}", e);
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    retry_delay: Option<String>,
}
