//! Conversion between the structured [`Guide`] and its HTML form.
//!
//! The HTML layout is the one requested from the model: an `h1` title,
//! `h2` sections, and `h3` stages under "Lesson Procedure".

use crate::html::{escape_html, parse_blocks, Block, Inline, Span};
use crate::{Error, GlossaryEntry, Guide, Result};

/// Field names accepted by [`Guide::set_field`].
pub const FIELD_NAMES: &[&str] = &[
    "title",
    "overview",
    "objectives",
    "preparation",
    "initiate",
    "learn",
    "make",
    "share",
    "glossary",
    "bonus_activities",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Overview,
    Objectives,
    Preparation,
    Procedure(Stage),
    Glossary,
    Bonus,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unset,
    Initiate,
    Learn,
    Make,
    Share,
}

fn section_for(heading: &str) -> Section {
    let h = heading.to_lowercase();
    if h.contains("overview") {
        Section::Overview
    } else if h.contains("objective") {
        Section::Objectives
    } else if h.contains("preparation") {
        Section::Preparation
    } else if h.contains("procedure") {
        Section::Procedure(Stage::Unset)
    } else if h.contains("glossary") {
        Section::Glossary
    } else if h.contains("bonus") {
        Section::Bonus
    } else {
        Section::Other
    }
}

fn stage_for(heading: &str) -> Stage {
    let h = heading.to_lowercase();
    if h.contains("initiate") {
        Stage::Initiate
    } else if h.contains("learn") {
        Stage::Learn
    } else if h.contains("make") {
        Stage::Make
    } else if h.contains("share") {
        Stage::Share
    } else {
        Stage::Unset
    }
}

fn append_paragraph(field: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !field.is_empty() {
        field.push_str("\n\n");
    }
    field.push_str(text);
}

/// Parse a `Term: definition` line. A line without a colon is all term.
fn glossary_entry(line: &str) -> Option<GlossaryEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line.split_once(':') {
        Some((term, definition)) => GlossaryEntry::new(term.trim(), definition.trim()),
        None => GlossaryEntry::new(line, ""),
    })
}

/// Parse a list item. A leading bold run is the whole term, so terms may
/// contain colons; otherwise the item is read as a `Term: definition` line.
fn glossary_item(item: &Inline) -> Option<GlossaryEntry> {
    let mut term = String::new();
    let mut rest = String::new();
    let mut in_term = true;
    for span in &item.spans {
        match span {
            Span::Text(run) if in_term && run.bold => term.push_str(&run.text),
            Span::Text(run) if in_term && run.text.trim().is_empty() => term.push_str(&run.text),
            Span::Text(run) => {
                in_term = false;
                rest.push_str(&run.text);
            }
            Span::LineBreak => {
                in_term = false;
                rest.push('\n');
            }
        }
    }

    let term = term.trim();
    if term.is_empty() {
        return glossary_entry(&item.plain_text());
    }
    let term = term.strip_suffix(':').unwrap_or(term).trim_end();
    let rest = rest.trim();
    let definition = rest.strip_prefix(':').unwrap_or(rest).trim_start();
    Some(GlossaryEntry::new(term, definition))
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

impl Guide {
    /// Read a guide out of HTML laid out with the usual section headings.
    ///
    /// Unrecognised sections are ignored; missing ones stay empty.
    pub fn from_html(html: &str) -> Self {
        let mut guide = Guide::default();
        let mut section = Section::None;

        for block in parse_blocks(html) {
            match block {
                Block::Heading { level: 1, content } => {
                    if guide.title.is_empty() {
                        guide.title = content.plain_text().trim().to_string();
                    }
                }
                Block::Heading { level: 2, content } => {
                    section = section_for(&content.plain_text());
                }
                Block::Heading { content, .. } => {
                    if let Section::Procedure(_) = section {
                        section = Section::Procedure(stage_for(&content.plain_text()));
                    }
                }
                Block::Paragraph(content) => guide.absorb_paragraph(section, &content),
                Block::List { items, .. } => guide.absorb_list(section, &items),
                Block::Image { .. } => {}
            }
        }

        guide
    }

    fn text_field(&mut self, section: Section) -> Option<&mut String> {
        match section {
            Section::Overview => Some(&mut self.overview),
            Section::Preparation => Some(&mut self.preparation),
            Section::Bonus => Some(&mut self.bonus_activities),
            Section::Procedure(Stage::Initiate) => Some(&mut self.lesson_procedure.initiate),
            Section::Procedure(Stage::Learn) => Some(&mut self.lesson_procedure.learn),
            Section::Procedure(Stage::Make) => Some(&mut self.lesson_procedure.make),
            Section::Procedure(Stage::Share) => Some(&mut self.lesson_procedure.share),
            _ => None,
        }
    }

    fn absorb_paragraph(&mut self, section: Section, content: &Inline) {
        let text = content.plain_text();
        match section {
            Section::Objectives => self.objectives.extend(non_empty_lines(&text)),
            Section::Glossary => self
                .glossary
                .extend(text.lines().filter_map(glossary_entry)),
            _ => {
                if let Some(field) = self.text_field(section) {
                    append_paragraph(field, &text);
                }
            }
        }
    }

    fn absorb_list(&mut self, section: Section, items: &[Inline]) {
        match section {
            Section::Objectives => self.objectives.extend(
                items
                    .iter()
                    .map(|i| i.plain_text().trim().to_string())
                    .filter(|s| !s.is_empty()),
            ),
            Section::Glossary => self
                .glossary
                .extend(items.iter().filter_map(glossary_item)),
            _ => {
                let bullets = items
                    .iter()
                    .map(|i| format!("- {}", i.plain_text().trim()))
                    .collect::<Vec<_>>()
                    .join("\n");
                if let Some(field) = self.text_field(section) {
                    append_paragraph(field, &bullets);
                }
            }
        }
    }

    /// Render the guide as HTML with the usual section headings.
    pub fn to_html(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("<h1>{}</h1>\n\n", escape_html(&self.title)));

        out.push_str("<h2>Session Overview</h2>\n");
        out.push_str(&paragraphs_html(&self.overview));

        out.push_str("\n<h2>Learning Objectives</h2>\n<ul>\n");
        for objective in &self.objectives {
            out.push_str(&format!("  <li>{}</li>\n", escape_html(objective)));
        }
        out.push_str("</ul>\n");

        out.push_str("\n<h2>Preparation</h2>\n");
        out.push_str(&paragraphs_html(&self.preparation));

        out.push_str("\n<h2>Lesson Procedure</h2>\n");
        let procedure = &self.lesson_procedure;
        for (name, text) in [
            ("Initiate", &procedure.initiate),
            ("Learn", &procedure.learn),
            ("Make", &procedure.make),
            ("Share", &procedure.share),
        ] {
            out.push_str(&format!("\n<h3>{}</h3>\n", name));
            out.push_str(&paragraphs_html(text));
        }

        out.push_str("\n<h2>Glossary</h2>\n<ul>\n");
        for entry in &self.glossary {
            out.push_str(&format!(
                "  <li><strong>{}:</strong> {}</li>\n",
                escape_html(&entry.term),
                escape_html(&entry.definition)
            ));
        }
        out.push_str("</ul>\n");

        out.push_str("\n<h2>Bonus Activities</h2>\n");
        out.push_str(&paragraphs_html(&self.bonus_activities));

        out
    }

    /// Overwrite one field by name.
    ///
    /// `objectives` takes one objective per line; `glossary` takes one
    /// `term: definition` pair per line.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "title" => self.title = value.trim().to_string(),
            "overview" => self.overview = value.to_string(),
            "preparation" => self.preparation = value.to_string(),
            "initiate" => self.lesson_procedure.initiate = value.to_string(),
            "learn" => self.lesson_procedure.learn = value.to_string(),
            "make" => self.lesson_procedure.make = value.to_string(),
            "share" => self.lesson_procedure.share = value.to_string(),
            "bonus_activities" | "bonus" => self.bonus_activities = value.to_string(),
            "objectives" => self.objectives = non_empty_lines(value).collect(),
            "glossary" => self.glossary = value.lines().filter_map(glossary_entry).collect(),
            other => return Err(Error::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

/// One `<p>` per blank-line separated paragraph, with `<br/>` for single
/// line breaks. Empty text still yields an empty paragraph so the section
/// stays editable.
fn paragraphs_html(text: &str) -> String {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        return "<p></p>\n".to_string();
    }

    paragraphs
        .iter()
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html(l.trim())).collect();
            format!("<p>{}</p>\n", lines.join("<br/>"))
        })
        .collect()
}
