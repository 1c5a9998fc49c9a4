//! Calls to the guide server.
//!
//! Every call holds an [`InFlight`] guard while it runs; a second call made
//! meanwhile fails with [`ClientError::Busy`] without touching the network.
//! Failures of any kind come back as one displayable message. Nothing is
//! retried here.

use crate::input::FileSelection;
use guide_core::{ExportRequest, GuideResponse, Variant};
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Response, StatusCode};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;

/// Default server address.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

static DISPOSITION_FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\s*=\s*"?([^";]+)"?"#).unwrap());

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please select a .pptx file first.")]
    NoFile,

    #[error("Another request is already in progress.")]
    Busy,

    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    /// An `error` field, or a failed status without one.
    #[error("{0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Marks a request as running; released on drop.
#[derive(Debug)]
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A rendered PDF and the name the server suggested for it.
#[derive(Debug, Clone)]
pub struct PdfDownload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

/// HTTP client for `/demo`, `/upload` and `/export-pdf`.
#[derive(Debug, Clone)]
pub struct GuideClient {
    http: reqwest::Client,
    base_url: String,
    busy: Arc<AtomicBool>,
}

impl GuideClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the in-flight slot.
    pub fn begin(&self) -> Result<InFlight> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::Busy)?;
        Ok(InFlight {
            flag: Arc::clone(&self.busy),
        })
    }

    fn url(&self, path: &str, variant: Variant) -> String {
        match variant {
            Variant::Html => format!("{}{}", self.base_url, path),
            Variant::Structured => format!("{}{}?variant=structured", self.base_url, path),
        }
    }

    /// Fetch the sample guide.
    pub async fn demo(&self, variant: Variant) -> Result<GuideResponse> {
        let _guard = self.begin()?;
        log::debug!("GET {}/demo", self.base_url);
        let resp = self.http.get(self.url("/demo", variant)).send().await?;
        read_guide(resp).await
    }

    /// Upload the selected deck and wait for the generated guide.
    pub async fn upload(
        &self,
        selection: Option<&FileSelection>,
        variant: Variant,
    ) -> Result<GuideResponse> {
        let selection = selection.ok_or(ClientError::NoFile)?;
        let _guard = self.begin()?;

        log::debug!("POST {}/upload ({})", self.base_url, selection.name);
        let part = Part::bytes(selection.bytes.clone())
            .file_name(selection.name.clone())
            .mime_str(PPTX_MIME)?;
        let form = Form::new().part("file", part);
        let resp = self
            .http
            .post(self.url("/upload", variant))
            .multipart(form)
            .send()
            .await?;
        read_guide(resp).await
    }

    /// Render HTML to PDF on the server.
    pub async fn export_pdf(&self, request: &ExportRequest) -> Result<PdfDownload> {
        let _guard = self.begin()?;
        log::debug!("POST {}/export-pdf ({})", self.base_url, request.file_name);
        let resp = self
            .http
            .post(format!("{}/export-pdf", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(ClientError::Server(error_message(status, &body)));
        }

        let file_name = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);
        let bytes = resp.bytes().await?.to_vec();
        Ok(PdfDownload { bytes, file_name })
    }
}

async fn read_guide(resp: Response) -> Result<GuideResponse> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ClientError::Server(error_message(status, &body)));
    }

    let payload: GuideResponse = serde_json::from_str(&body)
        .map_err(|e| ClientError::Server(format!("Unexpected response from server: {}", e)))?;
    if let Some(error) = payload.error {
        return Err(ClientError::Server(error));
    }
    Ok(payload)
}

/// The `error` field of a JSON body, or a generic status message.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("Server returned {}", status))
}

/// File name from a `Content-Disposition` header, without any directories.
pub fn disposition_file_name(header: &str) -> Option<String> {
    let raw = DISPOSITION_FILENAME_REGEX.captures(header)?.get(1)?.as_str().trim();
    let name = Path::new(raw).file_name()?.to_str()?;
    if name.is_empty() || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Default)]
    struct Hits(Arc<AtomicUsize>);

    async fn fake_demo(
        State(hits): State<Hits>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        hits.0.fetch_add(1, Ordering::SeqCst);
        if query.get("variant").map(String::as_str) == Some("structured") {
            Json(json!({ "guide": { "title": "Demo" }, "file_name": "Sample" }))
        } else {
            Json(json!({ "html": "<h1>Demo</h1>", "file_name": "Sample" }))
        }
    }

    async fn fake_upload(State(hits): State<Hits>, body: axum::body::Bytes) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        let text = String::from_utf8_lossy(&body);
        if text.contains("filename=\"bad.ppt\"") {
            (
                AxumStatus::BAD_REQUEST,
                Json(json!({ "error": "Please upload a valid .pptx file." })),
            )
        } else if text.contains("filename=\"quota.pptx\"") {
            (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "quota exhausted" })),
            )
        } else if text.contains("filename=\"soft.pptx\"") {
            (AxumStatus::OK, Json(json!({ "error": "soft failure", "file_name": "" })))
        } else {
            (
                AxumStatus::OK,
                Json(json!({ "html": "<h1>Generated</h1>", "file_name": "Lesson" })),
            )
        }
    }

    async fn fake_export(State(hits): State<Hits>, Json(body): Json<Value>) -> impl IntoResponse {
        hits.0.fetch_add(1, Ordering::SeqCst);
        let name = body["file_name"].as_str().unwrap_or("teacher_guide").to_string();
        (
            [
                (header::CONTENT_TYPE.as_str(), "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION.as_str(),
                    format!("attachment; filename=\"{}.pdf\"", name),
                ),
            ],
            b"%PDF-1.5 fake".to_vec(),
        )
    }

    async fn spawn_fake() -> (GuideClient, Hits) {
        let hits = Hits::default();
        let app = Router::new()
            .route("/demo", get(fake_demo))
            .route("/upload", post(fake_upload))
            .route("/export-pdf", post(fake_export))
            .route("/broken/demo", get(|| async { (AxumStatus::BAD_GATEWAY, "upstream down") }))
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (GuideClient::new(format!("http://{}/", addr)).unwrap(), hits)
    }

    fn deck(name: &str) -> FileSelection {
        FileSelection {
            name: name.to_string(),
            bytes: b"PK\x03\x04deck".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_without_file_sends_nothing() {
        let (client, hits) = spawn_fake().await;
        let err = client.upload(None, Variant::Html).await.unwrap_err();
        assert!(matches!(err, ClientError::NoFile));
        assert_eq!(err.to_string(), "Please select a .pptx file first.");
        assert_eq!(hits.0.load(Ordering::SeqCst), 0);
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_upload_success() {
        let (client, hits) = spawn_fake().await;
        let resp = client
            .upload(Some(&deck("Lesson.pptx")), Variant::Html)
            .await
            .unwrap();
        assert_eq!(resp.html.as_deref(), Some("<h1>Generated</h1>"));
        assert_eq!(resp.file_name, "Lesson");
        assert_eq!(hits.0.load(Ordering::SeqCst), 1);
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_failures_collapse_to_message() {
        let (client, _) = spawn_fake().await;

        let err = client
            .upload(Some(&deck("bad.ppt")), Variant::Html)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please upload a valid .pptx file.");

        let err = client
            .upload(Some(&deck("quota.pptx")), Variant::Html)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quota exhausted");

        let err = client
            .upload(Some(&deck("soft.pptx")), Variant::Html)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "soft failure");
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_non_json_failure() {
        let (client, _) = spawn_fake().await;
        let broken = GuideClient::new(format!("{}/broken", client.base_url())).unwrap();
        let err = broken.demo(Variant::Html).await.unwrap_err();
        assert_eq!(err.to_string(), "Server returned 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_transport_failure_releases_guard() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GuideClient::new(format!("http://{}", addr)).unwrap();
        let err = client.demo(Variant::Html).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!client.is_busy());
    }

    #[tokio::test]
    async fn test_busy_client_rejects_without_request() {
        let (client, hits) = spawn_fake().await;
        let guard = client.begin().unwrap();
        assert!(client.is_busy());

        let err = client.demo(Variant::Html).await.unwrap_err();
        assert!(matches!(err, ClientError::Busy));
        assert_eq!(hits.0.load(Ordering::SeqCst), 0);

        drop(guard);
        assert!(!client.is_busy());
        client.demo(Variant::Html).await.unwrap();
        assert_eq!(hits.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_demo_variants() {
        let (client, _) = spawn_fake().await;
        let html = client.demo(Variant::Html).await.unwrap();
        assert_eq!(html.html.as_deref(), Some("<h1>Demo</h1>"));

        let structured = client.demo(Variant::Structured).await.unwrap();
        let guide = structured.guide.unwrap();
        assert_eq!(guide.title, "Demo");
        assert!(guide.objectives.is_empty());
        assert_eq!(structured.file_name, "Sample");
    }

    #[tokio::test]
    async fn test_export_pdf() {
        let (client, _) = spawn_fake().await;
        let request = ExportRequest {
            html: "<h1>T</h1>".to_string(),
            file_name: "Lesson".to_string(),
        };
        let download = client.export_pdf(&request).await.unwrap();
        assert!(download.bytes.starts_with(b"%PDF"));
        assert_eq!(download.file_name.as_deref(), Some("Lesson.pdf"));
    }

    #[test]
    fn test_disposition_file_name() {
        assert_eq!(
            disposition_file_name("attachment; filename=\"Intro_AI.pdf\"").as_deref(),
            Some("Intro_AI.pdf")
        );
        assert_eq!(
            disposition_file_name("attachment; filename=plain.pdf").as_deref(),
            Some("plain.pdf")
        );
        assert_eq!(
            disposition_file_name("attachment; filename=\"../../etc/x.pdf\"").as_deref(),
            Some("x.pdf")
        );
        assert_eq!(disposition_file_name("inline"), None);
    }
}
