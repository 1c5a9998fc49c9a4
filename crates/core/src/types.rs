//! Domain types for extracted slide decks and teacher guides.

use serde::{Deserialize, Serialize};

/// Text pulled out of an uploaded deck, slide by slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideDeck {
    /// Upload name, without any directory part.
    pub file_name: String,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            slides: Vec::new(),
        }
    }

    pub fn push(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Paragraph texts of every slide, in deck order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.slides.iter().flat_map(Slide::texts)
    }

    /// Whether any slide carries readable text.
    pub fn has_text(&self) -> bool {
        self.paragraphs().any(|t| !t.trim().is_empty())
    }
}

/// Upload types the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    Pptx,
}

impl PresentationFormat {
    /// Match on the extension, ignoring case. Legacy `.ppt` is not accepted.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        ext.eq_ignore_ascii_case("pptx").then_some(Self::Pptx)
    }
}

/// Top-left corner of a shape in EMUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// One slide and its paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based position in the deck.
    pub number: usize,
    pub paragraphs: Vec<Paragraph>,
}

impl Slide {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            paragraphs: Vec::new(),
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.paragraphs.push(Paragraph {
            text: text.into(),
            offset: None,
        });
    }

    /// Add a paragraph from a shape placed at `offset`.
    pub fn push_at(&mut self, text: impl Into<String>, offset: Offset) {
        self.paragraphs.push(Paragraph {
            text: text.into(),
            offset: Some(offset),
        });
    }

    /// Reading order: top to bottom, then left to right.
    ///
    /// Stable, so paragraphs of one shape stay together. Paragraphs without
    /// an offset sort first.
    pub fn sort_by_offset(&mut self) {
        self.paragraphs.sort_by(|a, b| {
            let key = |p: &Paragraph| p.offset.map(|o| (o.y, o.x));
            key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.paragraphs.iter().map(|p| p.text.as_str())
    }
}

/// One `a:p` of a text shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub offset: Option<Offset>,
}

/// The four stages of the lesson procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonProcedure {
    pub initiate: String,
    pub learn: String,
    pub make: String,
    pub share: String,
}

/// A glossary term and its definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

impl GlossaryEntry {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// A teacher guide in its structured form.
///
/// Every field falls back to empty when a payload omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guide {
    pub title: String,
    pub overview: String,
    pub objectives: Vec<String>,
    pub preparation: String,
    pub lesson_procedure: LessonProcedure,
    pub glossary: Vec<GlossaryEntry>,
    pub bonus_activities: String,
}

impl Guide {
    /// Whether no section carries any content.
    pub fn is_empty(&self) -> bool {
        *self == Guide::default()
    }
}

/// Shape of a guide in a server response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// A single HTML fragment for a rich-text surface.
    #[default]
    Html,
    /// Separate fields for each guide section.
    Structured,
}

/// JSON body returned by `/demo` and `/upload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guide: Option<Guide>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    pub file_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GuideResponse {
    /// A rich-text response.
    pub fn html(html: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// A structured response.
    pub fn structured(guide: Guide, file_name: impl Into<String>) -> Self {
        Self {
            guide: Some(guide),
            file_name: file_name.into(),
            ..Self::default()
        }
    }
}

fn default_export_name() -> String {
    "teacher_guide".to_string()
}

/// JSON body accepted by `/export-pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub html: String,

    #[serde(default = "default_export_name")]
    pub file_name: String,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            html: String::new(),
            file_name: default_export_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            PresentationFormat::from_filename("Lesson.PPTX"),
            Some(PresentationFormat::Pptx)
        );
        assert_eq!(PresentationFormat::from_filename("lesson.ppt"), None);
        assert_eq!(PresentationFormat::from_filename("pptx"), None);
    }

    #[test]
    fn test_guide_defaults_missing_fields() {
        let json = r#"{"overview": "Intro", "lesson_procedure": {"learn": "Read"}}"#;
        let guide: Guide = serde_json::from_str(json).unwrap();

        assert_eq!(guide.overview, "Intro");
        assert_eq!(guide.title, "");
        assert!(guide.objectives.is_empty());
        assert_eq!(guide.lesson_procedure.learn, "Read");
        assert_eq!(guide.lesson_procedure.initiate, "");
        assert!(guide.glossary.is_empty());
    }

    #[test]
    fn test_glossary_entry_defaults() {
        let json = r#"{"glossary": [{"term": "AI"}]}"#;
        let guide: Guide = serde_json::from_str(json).unwrap();
        assert_eq!(guide.glossary, vec![GlossaryEntry::new("AI", "")]);
    }

    #[test]
    fn test_response_skips_absent_fields() {
        let response = GuideResponse::html("<h1>T</h1>", "deck");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["html"], "<h1>T</h1>");
        assert_eq!(json["file_name"], "deck");
        assert!(json.get("guide").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_export_request_defaults() {
        let request: ExportRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.html, "");
        assert_eq!(request.file_name, "teacher_guide");
    }

    #[test]
    fn test_sort_by_offset_is_stable() {
        let mut slide = Slide::new(1);
        slide.push_at("bottom", Offset { x: 0.0, y: 500.0 });
        slide.push_at("top right", Offset { x: 90.0, y: 10.0 });
        slide.push_at("top left", Offset { x: 0.0, y: 10.0 });
        slide.push_at("top left again", Offset { x: 0.0, y: 10.0 });
        slide.sort_by_offset();

        assert_eq!(
            slide.texts().collect::<Vec<_>>(),
            vec!["top left", "top left again", "top right", "bottom"]
        );
    }

    #[test]
    fn test_deck_has_text() {
        let mut deck = SlideDeck::new("blank.pptx");
        let mut slide = Slide::new(1);
        slide.push("  ");
        deck.push(slide);
        assert!(!deck.has_text());

        let mut slide = Slide::new(2);
        slide.push("Hello");
        deck.push(slide);
        assert!(deck.has_text());
        assert_eq!(deck.paragraphs().collect::<Vec<_>>(), vec!["  ", "Hello"]);
    }
}
