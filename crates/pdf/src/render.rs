//! Pagination and PDF assembly.

use crate::error::{PdfError, Result};
use crate::layout::{html_to_flowables, wrap, Flowable, Line};
use crate::metrics::{text_width, Font};
use crate::raster::RasterImage;
use crate::style::{Color, PageGeometry, StyleSheet, TextStyle, CM};
use guide_core::html::Inline;
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

/// Author recorded in the document info dictionary.
pub const DEFAULT_AUTHOR: &str = "Teacher Guide Generator";

/// Images are drawn at this width unless the frame is narrower.
const IMAGE_WIDTH: f32 = 14.0 * CM;

/// Distance from the frame's left edge to list item text.
const LIST_INDENT: f32 = 20.0;
/// Distance from the frame's left edge to a bullet.
const BULLET_OFFSET: f32 = 8.0;
const BULLET_SIZE: f32 = 8.0;
/// Space after each list item.
const LIST_ITEM_SPACING: f32 = 3.0;

/// Renders guide HTML to an A4 PDF.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    styles: StyleSheet,
    page: PageGeometry,
    author: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self {
            styles: StyleSheet::default(),
            page: PageGeometry::a4(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Render guide HTML; `title` goes into the document info.
    pub fn render_html(&self, html: &str, title: &str) -> Result<Vec<u8>> {
        let flowables = html_to_flowables(html, &self.styles);
        self.render(&flowables, title)
    }

    /// Render prepared flowables.
    pub fn render(&self, flowables: &[Flowable], title: &str) -> Result<Vec<u8>> {
        let layout = self.paginate(flowables);
        log::debug!(
            "Laid out {} flowables on {} pages with {} images",
            flowables.len(),
            layout.pages.len(),
            layout.images.len()
        );

        let mut ids = RefAllocator::default();
        let catalog_id = ids.next();
        let page_tree_id = ids.next();
        let info_id = ids.next();
        let font_ids: Vec<(Font, Ref)> = Font::all().into_iter().map(|f| (f, ids.next())).collect();
        let image_ids: Vec<Ref> = layout.images.iter().map(|_| ids.next()).collect();
        let page_ids: Vec<(Ref, Ref)> = layout.pages.iter().map(|_| (ids.next(), ids.next())).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id)
            .kids(page_ids.iter().map(|(page_id, _)| *page_id))
            .count(page_ids.len() as i32);

        for (font, id) in &font_ids {
            pdf.type1_font(*id)
                .base_font(Name(font.base_font().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        for (index, (image, id)) in layout.images.iter().zip(&image_ids).enumerate() {
            let (width, height) = match (i32::try_from(image.width), i32::try_from(image.height)) {
                (Ok(w), Ok(h)) => (w, h),
                _ => {
                    return Err(PdfError::Image(format!(
                        "image {} is {}x{} pixels",
                        index + 1,
                        image.width,
                        image.height
                    )))
                }
            };
            let mut xobject = pdf.image_xobject(*id, &image.rgb);
            xobject.width(width);
            xobject.height(height);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
        }

        let media_box = Rect::new(0.0, 0.0, self.page.width, self.page.height);
        for (ops, (page_id, content_id)) in layout.pages.iter().zip(&page_ids) {
            let mut page = pdf.page(*page_id);
            page.media_box(media_box);
            page.parent(page_tree_id);
            page.contents(*content_id);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for (font, id) in &font_ids {
                    fonts.pair(Name(font.resource_name().as_bytes()), *id);
                }
            }
            {
                let mut xobjects = resources.x_objects();
                for (index, id) in image_ids.iter().enumerate() {
                    xobjects.pair(Name(image_name(index).as_bytes()), *id);
                }
            }
            drop(resources);
            drop(page);

            pdf.stream(*content_id, &encode_page(ops));
        }

        pdf.document_info(info_id)
            .title(TextStr(title))
            .author(TextStr(&self.author))
            .producer(TextStr("guide-pdf"));

        Ok(pdf.finish())
    }

    fn paginate<'a>(&self, flowables: &'a [Flowable]) -> Layout<'a> {
        let mut canvas = Canvas::new(self.page);

        for flowable in flowables {
            match flowable {
                Flowable::Spacer(height) => canvas.space(*height),
                Flowable::Paragraph { content, style } => self.paragraph(&mut canvas, content, style),
                Flowable::List {
                    ordered,
                    items,
                    style,
                } => self.list(&mut canvas, *ordered, items, style),
                Flowable::Image(image) => self.image(&mut canvas, image),
            }
        }

        canvas.finish()
    }

    fn paragraph(&self, canvas: &mut Canvas<'_>, content: &Inline, style: &TextStyle) {
        let lines = wrap(content, style.bold, style.font_size, self.page.frame_width());
        if lines.is_empty() {
            return;
        }
        canvas.space(style.space_before);
        for line in &lines {
            canvas.ensure(style.leading);
            let baseline = canvas.baseline(style);
            canvas.text_line(line, self.page.margin, baseline, style);
            canvas.advance(style.leading);
        }
        canvas.space(style.space_after);
    }

    fn list(&self, canvas: &mut Canvas<'_>, ordered: bool, items: &[Inline], style: &TextStyle) {
        let left = self.page.margin;
        let text_x = left + LIST_INDENT;
        let max_width = self.page.frame_width() - LIST_INDENT;

        for (index, item) in items.iter().enumerate() {
            let lines = wrap(item, style.bold, style.font_size, max_width);
            for (n, line) in lines.iter().enumerate() {
                canvas.ensure(style.leading);
                let baseline = canvas.baseline(style);
                if n == 0 {
                    if ordered {
                        let label = format!("{}.", index + 1).into_bytes();
                        let width = text_width(&label, Font::Regular, style.font_size);
                        let x = text_x - 3.0 - width;
                        canvas.raw_text(&label, Font::Regular, style.font_size, x, baseline, style.color);
                    } else {
                        let x = left + BULLET_OFFSET;
                        canvas.raw_text(&[0x95], Font::Regular, BULLET_SIZE, x, baseline, style.color);
                    }
                }
                canvas.text_line(line, text_x, baseline, style);
                canvas.advance(style.leading);
            }
            canvas.space(LIST_ITEM_SPACING);
        }
    }

    fn image<'a>(&self, canvas: &mut Canvas<'a>, image: &'a RasterImage) {
        let mut width = IMAGE_WIDTH.min(self.page.frame_width());
        let mut height = width * image.aspect();
        let max_height = self.page.frame_height();
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }
        canvas.ensure(height);
        canvas.draw_image(image, self.page.margin, width, height);
    }
}

/// One drawing step on a page.
#[derive(Debug, Clone, PartialEq)]
enum DrawOp {
    Fill(Color),
    Text {
        font: Font,
        size: f32,
        x: f32,
        baseline: f32,
        bytes: Vec<u8>,
    },
    /// `index` into [`Layout::images`].
    Image {
        index: usize,
        x: f32,
        bottom: f32,
        width: f32,
        height: f32,
    },
}

/// Page draw lists plus the images they reference, in `Im{n}` order.
struct Layout<'a> {
    pages: Vec<Vec<DrawOp>>,
    images: Vec<&'a RasterImage>,
}

/// Cursor over the text frame, top to bottom, page after page.
struct Canvas<'a> {
    page: PageGeometry,
    pages: Vec<Vec<DrawOp>>,
    ops: Vec<DrawOp>,
    images: Vec<&'a RasterImage>,
    y: f32,
}

impl<'a> Canvas<'a> {
    fn new(page: PageGeometry) -> Self {
        Self {
            page,
            pages: Vec::new(),
            ops: Vec::new(),
            images: Vec::new(),
            y: page.top(),
        }
    }

    fn at_top(&self) -> bool {
        self.y >= self.page.top() - 0.01
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = self.page.top();
    }

    /// Vertical gap; swallowed at the top of a page.
    fn space(&mut self, height: f32) {
        if height <= 0.0 || self.at_top() {
            return;
        }
        if self.y - height < self.page.bottom() {
            self.break_page();
        } else {
            self.y -= height;
        }
    }

    /// Start a new page unless `height` still fits.
    fn ensure(&mut self, height: f32) {
        if self.y - height < self.page.bottom() - 0.01 && !self.at_top() {
            self.break_page();
        }
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    /// Baseline for a line whose box starts at the cursor.
    fn baseline(&self, style: &TextStyle) -> f32 {
        self.y - style.leading + (style.leading - style.font_size) / 2.0 + 0.2 * style.font_size
    }

    fn text_line(&mut self, line: &Line, x: f32, baseline: f32, style: &TextStyle) {
        if line.segments.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Fill(style.color));
        for segment in &line.segments {
            self.ops.push(DrawOp::Text {
                font: segment.font,
                size: style.font_size,
                x: x + segment.x,
                baseline,
                bytes: segment.bytes.clone(),
            });
        }
    }

    fn raw_text(&mut self, bytes: &[u8], font: Font, size: f32, x: f32, baseline: f32, color: Color) {
        self.ops.push(DrawOp::Fill(color));
        self.ops.push(DrawOp::Text {
            font,
            size,
            x,
            baseline,
            bytes: bytes.to_vec(),
        });
    }

    fn draw_image(&mut self, image: &'a RasterImage, x: f32, width: f32, height: f32) {
        let bottom = self.y - height;
        self.ops.push(DrawOp::Image {
            index: self.images.len(),
            x,
            bottom,
            width,
            height,
        });
        self.images.push(image);
        self.y = bottom;
    }

    fn finish(mut self) -> Layout<'a> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        Layout {
            pages: self.pages,
            images: self.images,
        }
    }
}

/// Hands out object ids in order.
#[derive(Default)]
struct RefAllocator(i32);

impl RefAllocator {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

/// Content stream for one page.
fn encode_page(ops: &[DrawOp]) -> Vec<u8> {
    let mut content = Content::new();
    for op in ops {
        match op {
            DrawOp::Fill(color) => {
                content.set_fill_rgb(color.r, color.g, color.b);
            }
            DrawOp::Text {
                font,
                size,
                x,
                baseline,
                bytes,
            } => {
                content.begin_text();
                content.set_font(Name(font.resource_name().as_bytes()), *size);
                content.set_text_matrix([1.0, 0.0, 0.0, 1.0, *x, *baseline]);
                content.show(Str(bytes));
                content.end_text();
            }
            DrawOp::Image {
                index,
                x,
                bottom,
                width,
                height,
            } => {
                content.save_state();
                content.transform([*width, 0.0, 0.0, *height, *x, *bottom]);
                content.x_object(Name(image_name(*index).as_bytes()));
                content.restore_state();
            }
        }
    }
    content.finish().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::tests::png_data_uri;

    fn shown_text(ops: &[DrawOp]) -> Vec<Vec<u8>> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text { bytes, .. } => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    fn layout_pages(renderer: &PdfRenderer, html: &str) -> (usize, Vec<Vec<u8>>, usize) {
        let flowables = html_to_flowables(html, &renderer.styles);
        let layout = renderer.paginate(&flowables);
        let text = layout.pages.iter().flat_map(|ops| shown_text(ops)).collect();
        (layout.pages.len(), text, layout.images.len())
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = PdfRenderer::new()
            .render_html("<h1>Intro</h1><p>Hello <strong>world</strong></p>", "Intro_AI")
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, "%%EOF"));
        assert!(contains(&bytes, "/Count 1\n"));
        assert!(contains(&bytes, "/Title (Intro_AI)"));
        assert!(contains(&bytes, &format!("/Author ({})", DEFAULT_AUTHOR)));
        assert!(contains(&bytes, "/BaseFont /Helvetica-Bold"));
        assert!(contains(&bytes, "/WinAnsiEncoding"));
    }

    #[test]
    fn test_empty_document_gets_placeholder() {
        let renderer = PdfRenderer::new();
        let (pages, text, _) = layout_pages(&renderer, "<div>nothing here</div>");
        assert_eq!(pages, 1);
        assert_eq!(text, vec![b"No content to export.".to_vec()]);

        let bytes = renderer.render_html("", "empty").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_document_paginates() {
        let paragraph = "<p>Students explore how machines learn from examples and discuss \
                         where they meet AI in everyday life.</p>";
        let html = paragraph.repeat(120);
        let renderer = PdfRenderer::new();
        let (pages, text, _) = layout_pages(&renderer, &html);
        assert!(pages > 1, "expected several pages, got {}", pages);
        assert!(text.len() >= 120);

        let bytes = renderer.render_html(&html, "long").unwrap();
        assert!(contains(&bytes, &format!("/Count {}\n", pages)));
    }

    #[test]
    fn test_list_labels() {
        let renderer = PdfRenderer::new();
        let (_, text, _) = layout_pages(&renderer, "<ol><li>First</li><li>Second</li></ol><ul><li>Dot</li></ul>");
        assert_eq!(
            text,
            vec![
                b"1.".to_vec(),
                b"First".to_vec(),
                b"2.".to_vec(),
                b"Second".to_vec(),
                vec![0x95],
                b"Dot".to_vec(),
            ]
        );
    }

    #[test]
    fn test_images_are_embedded() {
        let renderer = PdfRenderer::new();
        let html = format!(r#"<p>Diagram</p><img src="{}">"#, png_data_uri(20, 10));
        let flowables = html_to_flowables(&html, &renderer.styles);
        let layout = renderer.paginate(&flowables);
        assert_eq!(layout.images.len(), 1);

        let drawn = layout.pages[0].iter().find_map(|op| match op {
            DrawOp::Image { index, width, height, .. } => Some((*index, *width, *height)),
            _ => None,
        });
        let (index, width, height) = drawn.expect("image drawn on the first page");
        assert_eq!(index, 0);
        assert!((width - IMAGE_WIDTH).abs() < 0.01);
        assert!((height - IMAGE_WIDTH / 2.0).abs() < 0.01);

        let bytes = renderer.render_html(&html, "img").unwrap();
        assert!(contains(&bytes, "/Subtype /Image"));
        assert!(contains(&bytes, "/Im1"));
        assert!(contains(&bytes, "/Count 1\n"));
    }

    #[test]
    fn test_entities_and_typography_survive() {
        let renderer = PdfRenderer::new();
        let (_, text, _) = layout_pages(&renderer, "<p>Think &mdash; pair &rarr; share</p>");
        assert_eq!(text, vec![b"Think \x97 pair -> share".to_vec()]);
    }

    #[test]
    fn test_page_content_stream() {
        let ops = vec![
            DrawOp::Fill(Color::from_hex(0x4f46e5)),
            DrawOp::Text {
                font: Font::Bold,
                size: 14.0,
                x: 72.0,
                baseline: 700.0,
                bytes: b"Overview".to_vec(),
            },
        ];
        let stream = encode_page(&ops);
        assert!(contains(&stream, "/F2 14 Tf"));
        assert!(contains(&stream, "(Overview) Tj"));
        assert!(contains(&stream, "BT"));
        assert!(contains(&stream, "ET"));
    }
}
