//! Writing a document out as `.txt` or `.pdf`.

use crate::editor::{Content, Document};
use crate::remote::GuideClient;
use anyhow::{Context, Result};
use guide_core::text_export::export_file_name;
use guide_core::{ExportRequest, TextExporter};
use std::path::{Path, PathBuf};

/// Plain text of a document and the file name to save it under.
pub fn text_export(doc: &Document) -> (String, String) {
    let exporter = TextExporter::new();
    let text = match &doc.content {
        Content::Structured(guide) => exporter.export_guide(guide),
        Content::RichText(html) => exporter.export_html(html),
    };
    (export_file_name(&doc.title(), &doc.file_name, "txt"), text)
}

/// Write the text export into `dir`.
pub fn write_text(doc: &Document, dir: &Path) -> Result<PathBuf> {
    let (name, text) = text_export(doc);
    let path = dir.join(name);
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// The body sent to `/export-pdf`.
pub fn pdf_request(doc: &Document) -> ExportRequest {
    let file_name = if doc.file_name.trim().is_empty() {
        ExportRequest::default().file_name
    } else {
        doc.file_name.clone()
    };
    ExportRequest {
        html: doc.to_html(),
        file_name,
    }
}

/// Have the server render the document and write the PDF into `dir`.
///
/// Uses the server's suggested name, falling back to one derived from the
/// title.
pub async fn write_pdf(client: &GuideClient, doc: &Document, dir: &Path) -> Result<PathBuf> {
    let download = client.export_pdf(&pdf_request(doc)).await?;
    let name = download
        .file_name
        .unwrap_or_else(|| export_file_name(&doc.title(), &doc.file_name, "pdf"));
    let path = dir.join(name);
    std::fs::write(&path, &download.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
