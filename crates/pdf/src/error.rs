//! Error types for PDF rendering.

use thiserror::Error;

/// Result type alias using [`PdfError`].
pub type Result<T> = std::result::Result<T, PdfError>;

#[derive(Debug, Error)]
pub enum PdfError {
    /// An embedded image is too large to describe in the document.
    #[error("cannot embed image: {0}")]
    Image(String),
}
