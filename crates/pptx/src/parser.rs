//! PPTX file parser implementation.

use guide_core::{Error, Offset, Result, Slide, SlideDeck};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
#[derive(Debug, Clone, Default)]
pub struct PptxParser {
    /// Order shapes top-to-bottom, left-to-right instead of document order.
    positional_order: bool,
}

impl PptxParser {
    /// Create a new PPTX parser that keeps shapes in document order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Order shapes by their position on the slide.
    pub fn with_positional_order(mut self, positional: bool) -> Self {
        self.positional_order = positional;
        self
    }

    /// Parse a PPTX held in memory.
    pub fn parse_bytes(&self, data: &[u8], filename: &str) -> Result<SlideDeck> {
        self.parse(Cursor::new(data), filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<SlideDeck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Archive(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = SlideDeck::new(filename);

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("{}: {} slides", filename, slide_order.len());

        for (idx, slide_path) in slide_order.iter().enumerate() {
            match self.parse_slide(&mut archive, slide_path, idx + 1) {
                Ok(slide) => deck.push(slide),
                Err(e) => {
                    log::warn!("Skipping slide {} ({}): {}", idx + 1, slide_path, e);
                    deck.push(Slide::new(idx + 1));
                }
            }
        }

        Ok(deck)
    }

    /// Get the ordered list of slide paths.
    ///
    /// `sldIdLst` in presentation.xml defines the order; relationship ids
    /// resolve to part names. Decks without a usable list fall back to
    /// sorting the slide relationships by trailing number.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let relationships = parse_relationships(&rels_content)?;

        let slide_rels: HashMap<&str, &Relationship> = relationships
            .iter()
            .filter(|r| r.is_slide())
            .map(|r| (r.id.as_str(), r))
            .collect();

        if let Ok(presentation) = self.read_file_from_archive(archive, PRESENTATION_PATH) {
            let ids = parse_slide_id_list(&presentation)?;
            let ordered: Vec<String> = ids
                .iter()
                .filter_map(|id| slide_rels.get(id.as_str()))
                .map(|r| r.part_name())
                .collect();
            if !ordered.is_empty() {
                return Ok(ordered);
            }
        }

        log::debug!("No slide id list, ordering slides by relationship number");
        let mut slides: Vec<(String, Option<usize>)> = relationships
            .iter()
            .filter(|r| r.is_slide())
            .map(|r| {
                let order = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (r.part_name(), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = Slide::new(slide_number);

        for shape in extract_shapes_from_xml(&content)? {
            for paragraph in shape.paragraphs {
                slide.push_at(paragraph, shape.offset);
            }
        }

        if self.positional_order {
            slide.sort_by_offset();
        }

        Ok(slide)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Archive(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Archive(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

/// A relationship from presentation.xml.rels.
#[derive(Debug, Default)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }

    /// Resolve the target against the `ppt/` directory.
    fn part_name(&self) -> String {
        match self.target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("ppt/{}", self.target),
        }
    }
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship::default();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }
                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The numeric `id` is unprefixed; the relationship id is `r:id`.
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    (key != b"id" && local_name(key) == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!(
                    "Error parsing presentation.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Paragraphs and offset of one text shape.
#[derive(Debug, Default)]
struct ShapeInfo {
    paragraphs: Vec<String>,
    offset: Offset,
    has_offset: bool,
}

impl ShapeInfo {
    fn read_offset(&mut self, e: &BytesStart) {
        if self.has_offset {
            return;
        }
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.as_ref() {
                b"x" => self.offset.x = value.parse().unwrap_or(0.0),
                b"y" => self.offset.y = value.parse().unwrap_or(0.0),
                _ => {}
            }
        }
        self.has_offset = true;
    }
}

/// Extract text shapes from slide XML, in document order.
///
/// Each `a:p` inside a shape's `p:txBody` becomes one trimmed paragraph;
/// empty paragraphs are dropped. Text comes from `a:t` elements (runs and
/// fields) and `a:br` becomes a newline.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<ShapeInfo>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    // Whitespace inside `a:t` is significant.
    reader.trim_text(false);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut in_text_body = false;
    let mut current_paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current_shape = Some(ShapeInfo::default()),
                b"off" => {
                    if let Some(ref mut shape) = current_shape {
                        shape.read_offset(e);
                    }
                }
                b"txBody" if current_shape.is_some() => in_text_body = true,
                b"p" if in_text_body => current_paragraph = Some(String::new()),
                b"t" if current_paragraph.is_some() => in_text = true,
                b"br" => {
                    if let Some(ref mut paragraph) = current_paragraph {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => {
                    if let Some(ref mut shape) = current_shape {
                        shape.read_offset(e);
                    }
                }
                b"br" => {
                    if let Some(ref mut paragraph) = current_paragraph {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_text {
                    if let Some(ref mut paragraph) = current_paragraph {
                        let text = e.unescape().unwrap_or_default();
                        paragraph.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"p" if in_text_body => {
                    if let (Some(paragraph), Some(shape)) =
                        (current_paragraph.take(), current_shape.as_mut())
                    {
                        let text = paragraph.trim();
                        if !text.is_empty() {
                            shape.paragraphs.push(text.to_string());
                        }
                    }
                }
                b"txBody" => in_text_body = false,
                b"sp" => {
                    if let Some(shape) = current_shape.take() {
                        if !shape.paragraphs.is_empty() {
                            shapes.push(shape);
                        }
                    }
                    in_text_body = false;
                    current_paragraph = None;
                    in_text = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Trailing number of a part name or relationship id ("slides/slide3.xml",
/// "rId2").
fn extract_slide_number(s: &str) -> Option<usize> {
    let stem = s.trim_end_matches(".rels").trim_end_matches(".xml");
    let start = stem
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    stem[start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const SLIDE_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    const LAYOUT_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

    fn slide_xml(shapes: &[(i64, &[&str])]) -> String {
        let mut body = String::new();
        for (y, paragraphs) in shapes {
            body.push_str(&format!(
                "<p:sp><p:spPr><a:xfrm><a:off x=\"0\" y=\"{}\"/></a:xfrm></p:spPr><p:txBody>",
                y
            ));
            for p in *paragraphs {
                body.push_str(&format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p));
            }
            body.push_str("</p:txBody></p:sp>");
        }
        format!(
            "<?xml version=\"1.0\"?><p:sld xmlns:p=\"p\" xmlns:a=\"a\"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>",
            body
        )
    }

    fn build_pptx(files: &[(&str, String)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn rels(entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(id, ty, target)| {
                format!("<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>", id, ty, target)
            })
            .collect();
        format!("<?xml version=\"1.0\"?><Relationships>{}</Relationships>", body)
    }

    fn presentation(ids: &[&str]) -> String {
        let body: String = ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!("<p:sldId id=\"{}\" r:id=\"{}\"/>", 256 + i, id))
            .collect();
        format!(
            "<?xml version=\"1.0\"?><p:presentation xmlns:p=\"p\" xmlns:r=\"r\"><p:sldIdLst>{}</p:sldIdLst></p:presentation>",
            body
        )
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId7"), Some(7));
        assert_eq!(extract_slide_number("slides/slide12.xml"), Some(12));
        assert_eq!(extract_slide_number("slides/_rels/slide4.xml.rels"), Some(4));
        assert_eq!(extract_slide_number("slideLayout"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:txBody"), b"txBody");
        assert_eq!(local_name(b"sldId"), b"sldId");
    }

    #[test]
    fn test_paragraphs_keep_run_spacing() {
        let xml = "<p:sld xmlns:p=\"p\" xmlns:a=\"a\"><p:sp><p:txBody>\
            <a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>world</a:t></a:r></a:p>\
            <a:p><a:r><a:t>   </a:t></a:r></a:p>\
            <a:p><a:r><a:t>Line</a:t></a:r><a:br/><a:r><a:t>break</a:t></a:r></a:p>\
            <a:p><a:fld id=\"1\" type=\"slidenum\"><a:t>7</a:t></a:fld></a:p>\
            </p:txBody></p:sp></p:sld>";
        let shapes = extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].paragraphs, vec!["Hello world", "Line\nbreak", "7"]);
    }

    #[test]
    fn test_unescapes_entities() {
        let xml = "<p:sp xmlns:p=\"p\" xmlns:a=\"a\"><p:txBody><a:p><a:r><a:t>Q &amp; A</a:t></a:r></a:p></p:txBody></p:sp>";
        let shapes = extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes[0].paragraphs, vec!["Q & A"]);
    }

    #[test]
    fn test_group_shapes_included_and_pictures_skipped() {
        let xml = "<p:spTree xmlns:p=\"p\" xmlns:a=\"a\">\
            <p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>Grouped</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp>\
            <p:pic><p:nvPicPr/></p:pic>\
            <p:graphicFrame><a:tbl><a:tc><a:txBody><a:p><a:r><a:t>Cell</a:t></a:r></a:p></a:txBody></a:tc></a:tbl></p:graphicFrame>\
            </p:spTree>";
        let shapes = extract_shapes_from_xml(xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].paragraphs, vec!["Grouped"]);
    }

    #[test]
    fn test_parse_follows_slide_id_list() {
        let data = build_pptx(&[
            (
                PRESENTATION_RELS_PATH,
                rels(&[
                    ("rId1", LAYOUT_REL, "slideLayouts/slideLayout1.xml"),
                    ("rId2", SLIDE_REL, "slides/slide1.xml"),
                    ("rId3", SLIDE_REL, "slides/slide2.xml"),
                ]),
            ),
            (PRESENTATION_PATH, presentation(&["rId3", "rId2"])),
            ("ppt/slides/slide1.xml", slide_xml(&[(0, &["Second"][..])])),
            ("ppt/slides/slide2.xml", slide_xml(&[(0, &["First"][..])])),
        ]);

        let deck = PptxParser::new().parse_bytes(&data, "Lesson.pptx").unwrap();
        assert_eq!(deck.file_name, "Lesson.pptx");
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].number, 1);
        assert_eq!(deck.slides[0].texts().collect::<Vec<_>>(), vec!["First"]);
        assert_eq!(deck.slides[1].texts().collect::<Vec<_>>(), vec!["Second"]);
    }

    #[test]
    fn test_parse_falls_back_to_relationship_numbers() {
        let data = build_pptx(&[
            (
                PRESENTATION_RELS_PATH,
                rels(&[
                    ("rId9", SLIDE_REL, "slides/slide10.xml"),
                    ("rId2", SLIDE_REL, "/ppt/slides/slide2.xml"),
                ]),
            ),
            ("ppt/slides/slide2.xml", slide_xml(&[(0, &["Two"][..])])),
            ("ppt/slides/slide10.xml", slide_xml(&[(0, &["Ten"][..])])),
        ]);

        let deck = PptxParser::new().parse_bytes(&data, "d.pptx").unwrap();
        assert_eq!(deck.paragraphs().collect::<Vec<_>>(), vec!["Two", "Ten"]);
    }

    #[test]
    fn test_positional_order() {
        let data = build_pptx(&[
            (
                PRESENTATION_RELS_PATH,
                rels(&[("rId2", SLIDE_REL, "slides/slide1.xml")]),
            ),
            (PRESENTATION_PATH, presentation(&["rId2"])),
            (
                "ppt/slides/slide1.xml",
                slide_xml(&[(900, &["Footer"][..]), (100, &["Title", "Subtitle"][..])]),
            ),
        ]);

        let document_order = PptxParser::new().parse_bytes(&data, "d.pptx").unwrap();
        assert_eq!(document_order.paragraphs().collect::<Vec<_>>(), vec!["Footer", "Title", "Subtitle"]);

        let positional = PptxParser::new()
            .with_positional_order(true)
            .parse_bytes(&data, "d.pptx")
            .unwrap();
        assert_eq!(positional.paragraphs().collect::<Vec<_>>(), vec!["Title", "Subtitle", "Footer"]);
    }

    #[test]
    fn test_missing_slide_part_keeps_numbering() {
        let data = build_pptx(&[
            (
                PRESENTATION_RELS_PATH,
                rels(&[
                    ("rId2", SLIDE_REL, "slides/slide1.xml"),
                    ("rId3", SLIDE_REL, "slides/slide2.xml"),
                ]),
            ),
            (PRESENTATION_PATH, presentation(&["rId2", "rId3"])),
            ("ppt/slides/slide2.xml", slide_xml(&[(0, &["Kept"][..])])),
        ]);

        let deck = PptxParser::new().parse_bytes(&data, "d.pptx").unwrap();
        assert_eq!(deck.slides.len(), 2);
        assert!(deck.slides[0].paragraphs.is_empty());
        assert_eq!(deck.slides[1].number, 2);
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxParser::new()
            .parse_bytes(b"definitely not a zip", "x.pptx")
            .unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }

    #[test]
    fn test_missing_relationships() {
        let data = build_pptx(&[("ppt/slides/slide1.xml", slide_xml(&[]))]);
        let err = PptxParser::new().parse_bytes(&data, "x.pptx").unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }
}
