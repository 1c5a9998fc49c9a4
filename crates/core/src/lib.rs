//! Core domain types, slide-text normalization, guide HTML handling and
//! plain-text export for the teacher guide generator.

pub mod error;
pub mod guide;
pub mod html;
pub mod normalize;
pub mod status;
pub mod text_export;
pub mod types;

pub use error::{Error, Result};
pub use normalize::TextNormalizer;
pub use status::StatusRotator;
pub use text_export::TextExporter;
pub use types::{
    ExportRequest, GlossaryEntry, Guide, GuideResponse, LessonProcedure, Offset, Paragraph,
    PresentationFormat, Slide, SlideDeck, Variant,
};
