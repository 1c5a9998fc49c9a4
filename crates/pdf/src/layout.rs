//! HTML blocks to flowables, and line breaking.

use crate::metrics::{byte_width, encode_winansi, text_width, Font};
use crate::raster::{decode_data_uri, RasterImage};
use crate::style::{StyleSheet, TextStyle, CM};
use guide_core::html::{parse_blocks, Block, Inline, Span, TextRun};

/// Shown when the document has nothing renderable.
pub const EMPTY_DOCUMENT_TEXT: &str = "No content to export.";

/// A unit of vertical page content.
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph { content: Inline, style: TextStyle },
    Spacer(f32),
    List {
        ordered: bool,
        items: Vec<Inline>,
        style: TextStyle,
    },
    Image(RasterImage),
}

/// Convert guide HTML into flowables.
///
/// Headings and lists carry the spacers around them; empty paragraphs and
/// lists without items produce nothing. Images that do not decode are skipped.
pub fn html_to_flowables(html: &str, styles: &StyleSheet) -> Vec<Flowable> {
    let mut flowables = Vec::new();

    for block in parse_blocks(html) {
        match block {
            Block::Heading { level, content } => {
                let style = *styles.heading(level);
                let (before, after) = match level {
                    0 | 1 => (None, 0.3 * CM),
                    2 => (Some(0.4 * CM), 0.15 * CM),
                    _ => (Some(0.2 * CM), 0.1 * CM),
                };
                if let Some(before) = before {
                    flowables.push(Flowable::Spacer(before));
                }
                flowables.push(Flowable::Paragraph { content, style });
                flowables.push(Flowable::Spacer(after));
            }
            Block::Paragraph(content) => {
                if !content.is_empty() {
                    flowables.push(Flowable::Paragraph {
                        content,
                        style: styles.body,
                    });
                    flowables.push(Flowable::Spacer(0.15 * CM));
                }
            }
            Block::List { ordered, items } => {
                if !items.is_empty() {
                    flowables.push(Flowable::List {
                        ordered,
                        items,
                        style: styles.body,
                    });
                    flowables.push(Flowable::Spacer(0.2 * CM));
                }
            }
            Block::Image { src } => {
                if let Some(image) = decode_data_uri(&src) {
                    flowables.push(Flowable::Spacer(0.2 * CM));
                    flowables.push(Flowable::Image(image));
                    flowables.push(Flowable::Spacer(0.2 * CM));
                }
            }
        }
    }

    if flowables.is_empty() {
        flowables.push(Flowable::Paragraph {
            content: Inline {
                spans: vec![Span::Text(TextRun::plain(EMPTY_DOCUMENT_TEXT))],
            },
            style: styles.body,
        });
    }

    flowables
}

/// A run of same-font encoded text placed at `x` within its line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub font: Font,
    pub bytes: Vec<u8>,
    pub x: f32,
    pub width: f32,
}

/// One laid-out line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub segments: Vec<Segment>,
    pub width: f32,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Encoded text of the line with fonts dropped.
    pub fn text_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut end = 0.0;
        for segment in &self.segments {
            if segment.x > end + 0.01 {
                out.push(b' ');
            }
            out.extend_from_slice(&segment.bytes);
            end = segment.x + segment.width;
        }
        out
    }
}

#[derive(Debug, Default)]
struct Word {
    pieces: Vec<(Font, Vec<u8>)>,
    width: f32,
    space_before: bool,
}

impl Word {
    fn push(&mut self, font: Font, byte: u8, size: f32) {
        match self.pieces.last_mut() {
            Some((last, bytes)) if *last == font => bytes.push(byte),
            _ => self.pieces.push((font, vec![byte])),
        }
        self.width += byte_width(byte, font) as f32 * size / 1000.0;
    }

    fn first_font(&self) -> Font {
        self.pieces.first().map(|(f, _)| *f).unwrap_or(Font::Regular)
    }
}

/// Split inline content into space-separated words, keeping style changes
/// inside a word (`<b>Term</b>:` stays one word).
fn words(content: &Inline, bold: bool, size: f32) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;
    let mut pending_space = false;

    for span in &content.spans {
        let Span::Text(run) = span else {
            continue;
        };
        let font = Font::from_style(bold || run.bold, run.italic);
        for byte in encode_winansi(&run.text) {
            if byte == b' ' {
                if let Some(word) = current.take() {
                    words.push(word);
                }
                pending_space = true;
                continue;
            }
            let word = current.get_or_insert_with(|| Word {
                space_before: pending_space,
                ..Word::default()
            });
            pending_space = false;
            word.push(font, byte, size);
        }
    }
    if let Some(word) = current {
        words.push(word);
    }
    words
}

/// Break a word that cannot fit on a line into chunks no wider than `max_width`.
fn split_word(word: Word, max_width: f32, size: f32) -> Vec<Word> {
    let mut chunks = Vec::new();
    let mut chunk = Word {
        space_before: word.space_before,
        ..Word::default()
    };
    for (font, bytes) in word.pieces {
        for byte in bytes {
            let w = byte_width(byte, font) as f32 * size / 1000.0;
            if !chunk.pieces.is_empty() && chunk.width + w > max_width {
                chunks.push(std::mem::take(&mut chunk));
            }
            chunk.push(font, byte, size);
        }
    }
    if !chunk.pieces.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

fn place(line: &mut Line, word: Word, gap: bool, size: f32) {
    let mut x = line.width;
    for (i, (font, bytes)) in word.pieces.into_iter().enumerate() {
        let lead = gap && i == 0;
        let space = if lead { text_width(b" ", font, size) } else { 0.0 };
        let width = text_width(&bytes, font, size);
        match line.segments.last_mut() {
            Some(last) if last.font == font => {
                if lead {
                    last.bytes.push(b' ');
                }
                last.bytes.extend_from_slice(&bytes);
                last.width += space + width;
            }
            _ => line.segments.push(Segment {
                font,
                bytes,
                x: x + space,
                width,
            }),
        }
        x += space + width;
    }
    line.width = x;
}

/// Greedy line breaking of one paragraph.
///
/// Explicit line breaks always start a new line. Words wider than
/// `max_width` are broken between characters.
pub fn wrap(content: &Inline, bold: bool, size: f32, max_width: f32) -> Vec<Line> {
    let mut lines = Vec::new();

    for part in content.lines() {
        let mut line = Line::default();
        for word in words(&part, bold, size) {
            let space = if line.is_empty() || !word.space_before {
                0.0
            } else {
                text_width(b" ", word.first_font(), size)
            };

            if !line.is_empty() && line.width + space + word.width > max_width {
                lines.push(std::mem::take(&mut line));
            }

            if line.is_empty() && word.width > max_width {
                let mut chunks = split_word(word, max_width, size);
                let last = chunks.pop();
                for chunk in chunks {
                    let mut full = Line::default();
                    place(&mut full, chunk, false, size);
                    lines.push(full);
                }
                if let Some(chunk) = last {
                    place(&mut line, chunk, false, size);
                }
                continue;
            }

            let gap = !line.is_empty() && word.space_before;
            place(&mut line, word, gap, size);
        }
        lines.push(line);
    }

    // Blank lines only survive between content.
    while lines.last().is_some_and(Line::is_empty) {
        lines.pop();
    }
    lines
}
