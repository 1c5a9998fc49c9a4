//! Error types for guide generation.

use thiserror::Error;

/// Result type alias using [`LlmError`].
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors returned while asking the model for a guide.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key was configured.
    #[error("GEMINI_API_KEY is not configured; set it in the environment or a .env file")]
    NotConfigured,

    /// Transport-level failure (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Gemini API error {status} {status_text}: {message}")]
    Api {
        status: u16,
        status_text: String,
        message: String,
        /// Server-suggested wait before retrying, in seconds.
        retry_after: Option<f64>,
    },

    /// The API answered but produced no text.
    #[error("Gemini returned no text: {0}")]
    EmptyResponse(String),

    /// Rate limited on every attempt.
    #[error(
        "Gemini API daily quota exhausted for this API key. Please add a new GEMINI_API_KEY \
         to your .env file or enable billing at https://aistudio.google.com/apikey"
    )]
    QuotaExhausted,
}

impl LlmError {
    /// Whether this is a 429 / `RESOURCE_EXHAUSTED` answer.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            LlmError::Api {
                status,
                status_text,
                ..
            } => *status == 429 || status_text == "RESOURCE_EXHAUSTED",
            _ => false,
        }
    }

    /// Server-suggested wait in seconds, if the error carried one.
    pub fn retry_after(&self) -> Option<f64> {
        match self {
            LlmError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
