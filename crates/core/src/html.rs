//! Block-level reading of guide HTML.
//!
//! Guides arrive as HTML from the model or from a rich-text editor. Only a
//! small subset matters downstream: `h1`-`h3`, `p`, `ul`/`ol` with `li`
//! items, and `img`. Inline markup is reduced to bold, italic and line
//! breaks; every other tag is dropped and its text kept.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Opening tag of a block we understand.
static BLOCK_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<(h1|h2|h3|p|ul|ol)\b[^>]*>").unwrap());

/// An image tag with a double-quoted `src`.
static IMG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^<img\b[^>]*?\bsrc\s*=\s*"([^"]+)"[^>]*>"#).unwrap());

/// List items inside a `ul`/`ol` body.
static LIST_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li>").unwrap());

/// Any start or end tag.
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").unwrap());

/// Named and numeric character references.
static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A styled piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }
}

/// Inline content: styled runs separated by explicit line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(TextRun),
    LineBreak,
}

/// The inline content of one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inline {
    pub spans: Vec<Span>,
}

impl Inline {
    /// Whether the block has no visible text.
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| match s {
            Span::Text(run) => run.text.trim().is_empty(),
            Span::LineBreak => true,
        })
    }

    /// Text with line breaks as `\n` and styling dropped.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            match span {
                Span::Text(run) => out.push_str(&run.text),
                Span::LineBreak => out.push('\n'),
            }
        }
        out
    }

    /// Split at line breaks into separate inline lines.
    pub fn lines(&self) -> Vec<Inline> {
        let mut lines = vec![Inline::default()];
        for span in &self.spans {
            match span {
                Span::LineBreak => lines.push(Inline::default()),
                Span::Text(run) => {
                    if let Some(last) = lines.last_mut() {
                        last.spans.push(Span::Text(run.clone()));
                    }
                }
            }
        }
        lines
    }

    /// Trim whitespace at the edges and around line breaks, drop empty runs
    /// and merge neighbours that share a style.
    fn tidy(mut self) -> Self {
        let len = self.spans.len();
        for i in 0..len {
            let after_break = i == 0 || matches!(self.spans[i - 1], Span::LineBreak);
            let before_break = i + 1 == len || matches!(self.spans[i + 1], Span::LineBreak);
            if let Span::Text(run) = &mut self.spans[i] {
                if after_break {
                    run.text = run.text.trim_start().to_string();
                }
                if before_break {
                    run.text = run.text.trim_end().to_string();
                }
            }
        }

        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans {
            match span {
                Span::Text(run) if run.text.is_empty() => {}
                Span::Text(run) => match merged.last_mut() {
                    Some(Span::Text(prev)) if prev.bold == run.bold && prev.italic == run.italic => {
                        // Collapse the seam so " a" + " b" does not double up.
                        if prev.text.ends_with(' ') && run.text.starts_with(' ') {
                            prev.text.push_str(run.text.trim_start());
                        } else {
                            prev.text.push_str(&run.text);
                        }
                    }
                    _ => merged.push(Span::Text(run)),
                },
                Span::LineBreak => merged.push(Span::LineBreak),
            }
        }

        while matches!(merged.last(), Some(Span::LineBreak)) {
            merged.pop();
        }
        while matches!(merged.first(), Some(Span::LineBreak)) {
            merged.remove(0);
        }

        Self { spans: merged }
    }
}

/// One block of a guide document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `h1`, `h2` or `h3`.
    Heading { level: u8, content: Inline },
    /// `p`.
    Paragraph(Inline),
    /// `ul` or `ol` with its `li` items.
    List { ordered: bool, items: Vec<Inline> },
    /// `img` with its `src` attribute.
    Image { src: String },
}

/// Scan HTML into blocks.
///
/// A block runs from its opening tag to the first matching close tag.
/// Anything between recognised blocks is skipped.
pub fn parse_blocks(html: &str) -> Vec<Block> {
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lower = html.to_ascii_lowercase();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let rest = &html[pos..];

        let trimmed = rest.trim_start();
        if trimmed.len() != rest.len() {
            pos += rest.len() - trimmed.len();
            continue;
        }

        if let Some(open) = BLOCK_OPEN_REGEX.captures(rest) {
            let tag = open[1].to_ascii_lowercase();
            let body_start = pos + open[0].len();
            let close = format!("</{}>", tag);

            if let Some(rel) = lower[body_start..].find(&close) {
                let body = &html[body_start..body_start + rel];
                blocks.push(block_from(&tag, body));
                pos = body_start + rel + close.len();
                continue;
            }
        }

        if let Some(img) = IMG_REGEX.captures(rest) {
            blocks.push(Block::Image {
                src: decode_entities(&img[1]),
            });
            pos += img[0].len();
            continue;
        }

        pos += rest.chars().next().map_or(1, char::len_utf8);
    }

    blocks
}

fn block_from(tag: &str, body: &str) -> Block {
    match tag {
        "h1" => Block::Heading {
            level: 1,
            content: parse_inline(body),
        },
        "h2" => Block::Heading {
            level: 2,
            content: parse_inline(body),
        },
        "h3" => Block::Heading {
            level: 3,
            content: parse_inline(body),
        },
        "ul" | "ol" => Block::List {
            ordered: tag == "ol",
            items: LIST_ITEM_REGEX
                .captures_iter(body)
                .map(|c| parse_inline(&c[1]))
                .collect(),
        },
        _ => Block::Paragraph(parse_inline(body)),
    }
}

/// Reduce inline HTML to styled runs and line breaks.
pub fn parse_inline(html: &str) -> Inline {
    let mut spans = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut last = 0;

    for caps in TAG_REGEX.captures_iter(html) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push_text(&mut spans, &html[last..whole.start], bold, italic);
        last = whole.end;

        let closing = !caps[1].is_empty();
        match caps[2].to_ascii_lowercase().as_str() {
            "strong" | "b" => {
                bold = if closing { bold.saturating_sub(1) } else { bold + 1 };
            }
            "em" | "i" => {
                italic = if closing {
                    italic.saturating_sub(1)
                } else {
                    italic + 1
                };
            }
            "br" => spans.push(Span::LineBreak),
            _ => {}
        }
    }
    push_text(&mut spans, &html[last..], bold, italic);

    Inline { spans }.tidy()
}

fn push_text(spans: &mut Vec<Span>, raw: &str, bold: usize, italic: usize) {
    if raw.is_empty() {
        return;
    }
    let collapsed = WHITESPACE_REGEX.replace_all(raw, " ");
    let text = decode_entities(&collapsed);
    if !text.is_empty() {
        spans.push(Span::Text(TextRun {
            text,
            bold: bold > 0,
            italic: italic > 0,
        }));
    }
}

/// Decode named and numeric character references used by editors.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "rarr" => '\u{2192}',
        "larr" => '\u{2190}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        _ => return None,
    };
    Some(c)
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
