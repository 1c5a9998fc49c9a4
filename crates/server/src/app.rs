//! Routes and handlers.

use crate::demo::{DEMO_FILE_NAME, DEMO_HTML};
use crate::error::AppError;
use axum::extract::multipart::Multipart;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use guide_core::normalize::{file_stem, safe_file_name};
use guide_core::{ExportRequest, Guide, GuideResponse, PresentationFormat, TextNormalizer, Variant};
use guide_llm::{GuideGenerator, LlmError};
use guide_pdf::PdfRenderer;
use guide_pptx::PptxParser;
use serde::Deserialize;
use std::sync::Arc;

/// Multipart field carrying the deck.
pub const UPLOAD_FIELD: &str = "file";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; uploads then fail with 500.
    pub generator: Option<Arc<dyn GuideGenerator>>,
    pub renderer: Arc<PdfRenderer>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(generator: Option<Arc<dyn GuideGenerator>>, max_upload_bytes: usize) -> Self {
        Self {
            generator,
            renderer: Arc::new(PdfRenderer::new()),
            max_upload_bytes,
        }
    }
}

/// `?variant=html|structured`
#[derive(Debug, Default, Deserialize)]
pub struct VariantQuery {
    #[serde(default)]
    pub variant: Variant,
}

pub fn router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/demo", get(demo))
        .route("/upload", post(upload))
        .route("/export-pdf", post(export_pdf))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Shape a guide for the requested variant.
fn guide_response(html: String, file_name: String, variant: Variant) -> GuideResponse {
    match variant {
        Variant::Html => GuideResponse::html(html, file_name),
        Variant::Structured => GuideResponse::structured(Guide::from_html(&html), file_name),
    }
}

async fn demo(Query(query): Query<VariantQuery>) -> Json<GuideResponse> {
    Json(guide_response(
        DEMO_HTML.to_string(),
        DEMO_FILE_NAME.to_string(),
        query.variant,
    ))
}

async fn upload(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
    mut multipart: Multipart,
) -> Result<Json<GuideResponse>, AppError> {
    let (filename, data) = read_upload(&mut multipart).await?;
    if PresentationFormat::from_filename(&filename).is_none() {
        return Err(AppError::InvalidUpload);
    }
    log::info!("Received {} ({} bytes)", filename, data.len());

    let (file_name, slide_text) =
        tokio::task::spawn_blocking(move || extract_slide_text(&filename, &data)).await??;

    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| AppError::Generation(LlmError::NotConfigured))?;
    let html = generator.generate(&file_name, &slide_text).await?;
    log::info!("Generated guide for {} ({} chars)", file_name, html.len());

    Ok(Json(guide_response(html, file_name, query.variant)))
}

/// Pull the first `file` field out of the form.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok((filename, data.to_vec()));
    }
    Err(AppError::BadRequest(format!(
        "Missing '{}' field in upload.",
        UPLOAD_FIELD
    )))
}

/// Parse a deck and flatten it to prompt text.
///
/// Returns the file stem and the `--- Slide N ---` text.
pub fn extract_slide_text(filename: &str, data: &[u8]) -> Result<(String, String), AppError> {
    let deck = PptxParser::new().parse_bytes(data, filename)?;
    let slide_text = TextNormalizer::new().slide_text(&deck);
    if !deck.has_text() || slide_text.trim().is_empty() {
        return Err(guide_core::Error::EmptyPresentation.into());
    }
    log::debug!("{}: {} slides, {} chars of text", filename, deck.slides.len(), slide_text.len());
    Ok((file_stem(filename), slide_text))
}

async fn export_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let disposition = format!(
        "attachment; filename=\"{}.pdf\"",
        safe_file_name(&request.file_name)
    );

    let renderer = Arc::clone(&state.renderer);
    let pdf = tokio::task::spawn_blocking(move || {
        renderer.render_html(&request.html, &request.file_name)
    })
    .await??;
    log::info!("Rendered PDF ({} bytes)", pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use reqwest::multipart::{Form, Part};
    use serde_json::{json, Value};
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const SLIDE_REL: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

    /// Echoes its inputs back as HTML.
    struct EchoGenerator;

    impl GuideGenerator for EchoGenerator {
        fn generate<'a>(
            &'a self,
            file_name: &'a str,
            slide_text: &'a str,
        ) -> BoxFuture<'a, guide_llm::Result<String>> {
            Box::pin(async move {
                Ok(format!(
                    "<h1>{}</h1><h2>Session Overview</h2><p>{}</p>",
                    file_name,
                    slide_text.replace('\n', "<br/>")
                ))
            })
        }
    }

    fn pptx(slides: &[&[&str]]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let rels: String = (1..=slides.len())
            .map(|n| {
                format!(
                    "<Relationship Id=\"rId{n}\" Type=\"{SLIDE_REL}\" Target=\"slides/slide{n}.xml\"/>"
                )
            })
            .collect();
        zip.start_file("ppt/_rels/presentation.xml.rels", FileOptions::default())
            .unwrap();
        write!(zip, "<?xml version=\"1.0\"?><Relationships>{}</Relationships>", rels).unwrap();

        for (i, paragraphs) in slides.iter().enumerate() {
            let body: String = paragraphs
                .iter()
                .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
                .collect();
            zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), FileOptions::default())
                .unwrap();
            write!(
                zip,
                "<p:sld xmlns:p=\"p\" xmlns:a=\"a\"><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
                body
            )
            .unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    async fn spawn(generator: Option<Arc<dyn GuideGenerator>>) -> String {
        let app = router(AppState::new(generator, 5 * 1024 * 1024));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn upload_file(base: &str, query: &str, name: &str, data: Vec<u8>) -> (u16, Value) {
        let form = Form::new().part(UPLOAD_FIELD, Part::bytes(data).file_name(name.to_string()));
        let resp = reqwest::Client::new()
            .post(format!("{}/upload{}", base, query))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    fn echo() -> Option<Arc<dyn GuideGenerator>> {
        Some(Arc::new(EchoGenerator))
    }

    #[test]
    fn test_extract_slide_text() {
        let data = pptx(&[&["What is AI?", "Machines that learn"], &[], &["Examples"]]);
        let (stem, text) = extract_slide_text("Intro AI.pptx", &data).unwrap();
        assert_eq!(stem, "Intro AI");
        assert_eq!(
            text,
            "--- Slide 1 ---\nWhat is AI?\nMachines that learn\n--- Slide 3 ---\nExamples"
        );
    }

    #[test]
    fn test_extract_empty_deck() {
        let data = pptx(&[&["   "], &[]]);
        let err = extract_slide_text("blank.pptx", &data).unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(guide_core::Error::EmptyPresentation)
        ));
    }

    #[tokio::test]
    async fn test_demo_variants() {
        let base = spawn(None).await;
        let html: Value = reqwest::get(format!("{}/demo", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(html["file_name"], DEMO_FILE_NAME);
        assert!(html["html"]
            .as_str()
            .unwrap()
            .starts_with("<h1>Introduction to Artificial Intelligence</h1>"));
        assert!(html.get("guide").is_none());

        let structured: GuideResponse = reqwest::get(format!("{}/demo?variant=structured", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let guide = structured.guide.unwrap();
        assert_eq!(guide.title, "Introduction to Artificial Intelligence");
        assert_eq!(guide.objectives.len(), 5);
        assert!(structured.html.is_none());
    }

    #[tokio::test]
    async fn test_upload_generates_guide() {
        let base = spawn(echo()).await;
        let (status, body) =
            upload_file(&base, "", "Lesson.PPTX", pptx(&[&["Welcome"], &["Goals"]])).await;
        assert_eq!(status, 200);
        assert_eq!(body["file_name"], "Lesson");
        let html = body["html"].as_str().unwrap();
        assert!(html.starts_with("<h1>Lesson</h1>"));
        assert!(html.contains("--- Slide 1 ---<br/>Welcome<br/>--- Slide 2 ---<br/>Goals"));
    }

    #[tokio::test]
    async fn test_upload_structured_variant() {
        let base = spawn(echo()).await;
        let (status, body) =
            upload_file(&base, "?variant=structured", "Lesson.pptx", pptx(&[&["Welcome"]])).await;
        assert_eq!(status, 200);
        assert_eq!(body["guide"]["title"], "Lesson");
        assert!(body["guide"]["overview"]
            .as_str()
            .unwrap()
            .contains("Welcome"));
        assert!(body.get("html").is_none());
    }

    #[tokio::test]
    async fn test_upload_rejects_other_extensions() {
        let base = spawn(echo()).await;
        let (status, body) = upload_file(&base, "", "lesson.ppt", pptx(&[&["x"]])).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({ "error": "Please upload a valid .pptx file." }));
    }

    #[tokio::test]
    async fn test_upload_empty_deck_is_unprocessable() {
        let base = spawn(echo()).await;
        let (status, body) = upload_file(&base, "", "blank.pptx", pptx(&[&[]])).await;
        assert_eq!(status, 422);
        assert_eq!(
            body,
            json!({ "error": "No readable text found in the uploaded PPTX." })
        );
    }

    #[tokio::test]
    async fn test_upload_without_generator() {
        let base = spawn(None).await;
        let (status, body) = upload_file(&base, "", "Lesson.pptx", pptx(&[&["Hi"]])).await;
        assert_eq!(status, 500);
        assert!(body["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_upload_corrupt_deck() {
        let base = spawn(echo()).await;
        let (status, body) = upload_file(&base, "", "broken.pptx", b"not a zip".to_vec()).await;
        assert_eq!(status, 500);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid PPTX archive"));
    }

    #[tokio::test]
    async fn test_upload_missing_field() {
        let base = spawn(echo()).await;
        let form = Form::new().text("other", "value");
        let resp = reqwest::Client::new()
            .post(format!("{}/upload", base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Missing 'file' field in upload.");
    }

    #[tokio::test]
    async fn test_export_pdf() {
        let base = spawn(None).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/export-pdf", base))
            .json(&json!({ "html": "<h1>Guide</h1><p>Body</p>", "file_name": "My Guide (v2)" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"My_Guide__v2_.pdf\""
        );
        let bytes = resp.bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_pdf_defaults() {
        let base = spawn(None).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/export-pdf", base))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"teacher_guide.pdf\""
        );
    }

    #[tokio::test]
    async fn test_export_pdf_bad_json() {
        let base = spawn(None).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/export-pdf", base))
            .header(header::CONTENT_TYPE, "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}
