//! The document being edited.
//!
//! A document is either a structured [`Guide`] or a single HTML fragment,
//! depending on what the server returned. It is kept on disk between
//! commands: structured documents as JSON, rich text as HTML.

use anyhow::{bail, Context, Result};
use guide_core::normalize::file_stem;
use guide_core::{Guide, GuideResponse};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Editor used when neither `VISUAL` nor `EDITOR` is set.
const FALLBACK_EDITOR: &str = "vi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Structured(Guide),
    RichText(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: Content,
    /// Name the server reported, usually the deck's file stem.
    pub file_name: String,
}

impl Document {
    /// Replace everything with a server response.
    ///
    /// A `guide` wins over `html`; a response with neither gives an empty
    /// rich-text document.
    pub fn from_response(response: GuideResponse) -> Self {
        let content = match (response.guide, response.html) {
            (Some(guide), _) => Content::Structured(guide),
            (None, Some(html)) => Content::RichText(html),
            (None, None) => Content::RichText(String::new()),
        };
        Self {
            content,
            file_name: response.file_name,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.content, Content::Structured(_))
    }

    /// The guide title, read out of the HTML for rich text.
    pub fn title(&self) -> String {
        match &self.content {
            Content::Structured(guide) => guide.title.clone(),
            Content::RichText(html) => Guide::from_html(html).title,
        }
    }

    pub fn to_html(&self) -> String {
        match &self.content {
            Content::Structured(guide) => guide.to_html(),
            Content::RichText(html) => html.clone(),
        }
    }

    /// Set one named field.
    ///
    /// Structured documents take any of [`guide_core::guide::FIELD_NAMES`];
    /// rich-text documents only take `html`.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        match &mut self.content {
            Content::Structured(guide) => guide.set_field(name, value)?,
            Content::RichText(html) if name == "html" => *html = value.to_string(),
            Content::RichText(_) => {
                bail!("Rich-text documents only have an `html` field, not `{}`", name)
            }
        }
        Ok(())
    }

    /// `<file_name>.json` or `<file_name>.html` inside `dir`.
    pub fn default_path(&self, dir: &Path) -> PathBuf {
        let stem = if self.file_name.trim().is_empty() {
            guide_core::normalize::DEFAULT_EXPORT_STEM
        } else {
            self.file_name.trim()
        };
        let extension = if self.is_structured() { "json" } else { "html" };
        dir.join(format!("{}.{}", stem, extension))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let body = match &self.content {
            Content::Structured(guide) => {
                let saved = GuideResponse::structured(guide.clone(), self.file_name.clone());
                serde_json::to_string_pretty(&saved)?
            }
            Content::RichText(html) => html.clone(),
        };
        std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Saved document to {}", path.display());
        Ok(())
    }

    /// Load a document saved by [`Document::save`].
    ///
    /// `.json` files hold a guide response; `.html`/`.htm` files hold rich
    /// text and take their `file_name` from the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => {
                let response: GuideResponse = serde_json::from_str(&body)
                    .with_context(|| format!("{} is not a saved guide", path.display()))?;
                Ok(Self::from_response(response))
            }
            Some("html") | Some("htm") => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                Ok(Self {
                    content: Content::RichText(body),
                    file_name: file_stem(name),
                })
            }
            _ => bail!(
                "Unsupported document type: {} (expected .json or .html)",
                path.display()
            ),
        }
    }
}

/// Open `path` in the user's editor and wait for it to exit.
pub fn open_in_editor(path: &Path) -> Result<()> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string());

    // EDITOR may carry arguments, e.g. "code --wait".
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(FALLBACK_EDITOR);
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to launch editor `{}`", editor))?;

    if !status.success() {
        bail!("Editor `{}` exited with {}", editor, status);
    }
    Ok(())
}

/// Edit a saved document in place and reload it.
pub fn edit_document(path: &Path) -> Result<Document> {
    open_in_editor(path)?;
    Document::load(path)
}
