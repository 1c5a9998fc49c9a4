//! Text normalization for extracted slide text and export file names.
//!
//! Slide text is normalized to NFC, line endings and vertical tabs become
//! newlines, runs of spaces collapse, and empty lines are dropped.

use crate::SlideDeck;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse multiple whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{2007}\u{202F}]+").unwrap());

/// Characters that are not allowed in a download name served by the API.
static UNSAFE_FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-]").unwrap());

/// Name used when neither a title nor a file name is available.
pub const DEFAULT_EXPORT_STEM: &str = "teacher_guide";

/// Normalizer for text pulled out of slide shapes.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Whether to keep line breaks inside a paragraph.
    preserve_line_breaks: bool,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a new text normalizer with default settings.
    pub fn new() -> Self {
        Self {
            preserve_line_breaks: true,
        }
    }

    /// Set whether to keep line breaks inside a paragraph.
    pub fn with_preserve_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Normalize a single paragraph of text.
    ///
    /// - Composes Unicode to NFC
    /// - Turns `\r\n`, `\r` and vertical tabs into `\n`
    /// - Collapses whitespace runs (including non-breaking spaces)
    /// - Trims every line and drops empty ones
    pub fn normalize_line(&self, text: &str) -> String {
        let composed: String = text.nfc().collect();
        let unified = composed
            .replace("\r\n", "\n")
            .replace(['\r', '\u{000B}'], "\n");

        let lines = unified
            .lines()
            .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty());

        if self.preserve_line_breaks {
            lines.collect::<Vec<_>>().join("\n")
        } else {
            lines.collect::<Vec<_>>().join(" ")
        }
    }

    /// Normalize text and split it into non-empty lines.
    pub fn normalize_to_lines(&self, text: &str) -> Vec<String> {
        self.normalize_line(text)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Build the prompt text for a deck.
    ///
    /// Every slide with at least one line contributes a `--- Slide N ---`
    /// header followed by its lines. Slides without text are skipped but
    /// still count towards the numbering.
    pub fn slide_text(&self, deck: &SlideDeck) -> String {
        let mut out: Vec<String> = Vec::new();

        for slide in &deck.slides {
            let slide_lines: Vec<String> = slide
                .texts()
                .flat_map(|text| self.normalize_to_lines(text))
                .collect();

            if slide_lines.is_empty() {
                continue;
            }

            out.push(format!("--- Slide {} ---", slide.number));
            out.extend(slide_lines);
        }

        out.join("\n")
    }
}

/// The file name without directories or extension.
pub fn file_stem(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}

/// Replace every character outside `[\w-]` with `_`.
///
/// Used for the `Content-Disposition` name of a served PDF.
pub fn safe_file_name(name: &str) -> String {
    UNSAFE_FILENAME_REGEX.replace_all(name, "_").into_owned()
}

/// Derive a download stem from a guide title.
///
/// Every non-alphanumeric character becomes `_`. Falls back to
/// [`DEFAULT_EXPORT_STEM`] when the title is blank.
pub fn title_file_stem(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return DEFAULT_EXPORT_STEM.to_string();
    }
    trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
