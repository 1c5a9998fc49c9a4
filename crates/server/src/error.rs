//! Request failures and their JSON form.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use guide_llm::LlmError;
use guide_pdf::PdfError;
use serde_json::json;
use thiserror::Error;

/// Anything a handler can fail with. Rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// The upload is not named `*.pptx`.
    #[error("Please upload a valid .pptx file.")]
    InvalidUpload,

    /// Malformed request body or missing form field.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Extraction(#[from] guide_core::Error),

    #[error(transparent)]
    Generation(#[from] LlmError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUpload | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Extraction(guide_core::Error::EmptyPresentation) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::info!("Rejected request ({}): {}", status.as_u16(), self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
