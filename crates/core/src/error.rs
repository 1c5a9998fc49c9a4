//! Errors raised while reading decks and editing guides.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The upload is not a readable zip archive, or a part is missing.
    #[error("Invalid PPTX archive: {0}")]
    Archive(String),

    /// A presentation part is not well-formed XML.
    #[error("Malformed presentation XML: {0}")]
    Xml(String),

    /// Every slide came back without text.
    #[error("No readable text found in the uploaded PPTX.")]
    EmptyPresentation,

    /// Not one of the fields of a structured guide.
    #[error("Unknown guide field: {0}")]
    UnknownField(String),
}
