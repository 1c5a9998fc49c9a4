//! Plain-text export of a teacher guide.
//!
//! Generates a `.txt` document from a fixed section template:
//!
//! ```text
//! TEACHER GUIDE: Introduction to AI
//! =================================
//!
//! SESSION OVERVIEW
//! Students explore AI.
//!
//! LEARNING OBJECTIVES
//! 1. Recognise AI.
//! ...
//! ```

use crate::html::{parse_blocks, Block};
use crate::normalize::title_file_stem;
use crate::Guide;

/// Formatter for the plain-text download.
#[derive(Debug, Clone)]
pub struct TextExporter {
    /// Whether to draw a rule under the title line.
    underline_title: bool,
}

impl Default for TextExporter {
    fn default() -> Self {
        Self {
            underline_title: true,
        }
    }
}

impl TextExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to draw a rule under the title line.
    pub fn with_underline_title(mut self, underline: bool) -> Self {
        self.underline_title = underline;
        self
    }

    /// Concatenate every guide field into the section template.
    ///
    /// Empty sections keep their heading so the layout never shifts.
    pub fn export_guide(&self, guide: &Guide) -> String {
        let mut out = String::new();

        let heading = if guide.title.trim().is_empty() {
            "TEACHER GUIDE".to_string()
        } else {
            format!("TEACHER GUIDE: {}", guide.title.trim())
        };
        out.push_str(&heading);
        out.push('\n');
        if self.underline_title {
            out.push_str(&"=".repeat(heading.chars().count()));
            out.push('\n');
        }

        section(&mut out, "SESSION OVERVIEW", &guide.overview);

        let objectives = guide
            .objectives
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}. {}", i + 1, o))
            .collect::<Vec<_>>()
            .join("\n");
        section(&mut out, "LEARNING OBJECTIVES", &objectives);

        section(&mut out, "PREPARATION", &guide.preparation);

        out.push_str("\nLESSON PROCEDURE\n");
        let procedure = &guide.lesson_procedure;
        for (name, text) in [
            ("Initiate", &procedure.initiate),
            ("Learn", &procedure.learn),
            ("Make", &procedure.make),
            ("Share", &procedure.share),
        ] {
            out.push_str(&format!("\n{}:\n", name));
            out.push_str(text.trim());
            out.push('\n');
        }

        let glossary = guide
            .glossary
            .iter()
            .map(|e| {
                if e.definition.trim().is_empty() {
                    format!("- {}", e.term)
                } else {
                    format!("- {}: {}", e.term, e.definition)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        section(&mut out, "GLOSSARY", &glossary);

        section(&mut out, "BONUS ACTIVITIES", &guide.bonus_activities);

        out
    }

    /// Export rich-text HTML.
    ///
    /// HTML that carries the usual guide sections goes through the section
    /// template; anything else is flattened block by block.
    pub fn export_html(&self, html: &str) -> String {
        let guide = Guide::from_html(html);
        let has_sections = Guide {
            title: String::new(),
            ..guide.clone()
        } != Guide::default();

        if has_sections {
            self.export_guide(&guide)
        } else {
            flatten_blocks(html)
        }
    }
}

fn section(out: &mut String, heading: &str, body: &str) {
    out.push('\n');
    out.push_str(heading);
    out.push('\n');
    let body = body.trim();
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
}

/// Plain-text rendering of arbitrary guide HTML.
pub fn flatten_blocks(html: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for block in parse_blocks(html) {
        match block {
            Block::Heading { level: 1, content } => {
                parts.push(content.plain_text().trim().to_string());
            }
            Block::Heading { content, .. } => {
                parts.push(content.plain_text().trim().to_uppercase());
            }
            Block::Paragraph(content) => {
                if !content.is_empty() {
                    parts.push(content.plain_text());
                }
            }
            Block::List { ordered, items } => {
                let lines: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        if ordered {
                            format!("{}. {}", i + 1, item.plain_text())
                        } else {
                            format!("- {}", item.plain_text())
                        }
                    })
                    .collect();
                if !lines.is_empty() {
                    parts.push(lines.join("\n"));
                }
            }
            Block::Image { .. } => {}
        }
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("{}\n", parts.join("\n\n"))
    }
}

/// Download name for an exported guide.
///
/// Uses the title, then `file_name`, with every non-alphanumeric
/// character replaced by `_`.
pub fn export_file_name(title: &str, file_name: &str, extension: &str) -> String {
    let source = if title.trim().is_empty() {
        file_name
    } else {
        title
    };
    format!("{}.{}", title_file_stem(source), extension)
}
