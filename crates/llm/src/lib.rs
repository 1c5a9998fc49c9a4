//! Teacher guide generation through a hosted model.
//!
//! [`GuideGenerator`] is the seam the HTTP service talks to; [`GeminiClient`]
//! is the production implementation.

pub mod error;
pub mod gemini;
pub mod prompts;

use futures::future::BoxFuture;

pub use error::{LlmError, Result};
pub use gemini::{GeminiClient, GeminiConfig};
pub use prompts::{strip_code_fences, teacher_guide_prompt};

/// Something that turns extracted slide text into guide HTML.
pub trait GuideGenerator: Send + Sync {
    /// Generate guide HTML for the deck named `file_name`.
    fn generate<'a>(&'a self, file_name: &'a str, slide_text: &'a str) -> BoxFuture<'a, Result<String>>;
}
