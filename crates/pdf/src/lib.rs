//! HTML → PDF rendering for teacher guides.
//!
//! Guide HTML is scanned into blocks, laid out as flowables on A4 pages
//! with the standard Helvetica faces, and written with `pdf-writer`.
//!
//! ```no_run
//! let pdf = guide_pdf::PdfRenderer::new()
//!     .render_html("<h1>Intro to AI</h1><p>Overview</p>", "Intro_to_AI")
//!     .unwrap();
//! assert!(pdf.starts_with(b"%PDF"));
//! ```

pub mod error;
pub mod layout;
pub mod metrics;
pub mod raster;
pub mod render;
pub mod style;

pub use error::{PdfError, Result};
pub use layout::{html_to_flowables, Flowable, EMPTY_DOCUMENT_TEXT};
pub use render::{PdfRenderer, DEFAULT_AUTHOR};
pub use style::{PageGeometry, StyleSheet};
