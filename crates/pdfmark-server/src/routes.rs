//! HTTP routes: PDF upload, annotated PNG export and stored-file serving.

use crate::config::ServerConfig;
use crate::storage::{ANNOTATED_DIR, PDF_DIR, Storage, file_stem, timestamped};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pdfmark_core::{ErrorBody, ExportRequest, ExportResponse, PNG_DATA_URL_PREFIX, UploadResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "pdf_file";

/// Room for multipart framing on top of the upload ceiling.
const BODY_SLACK: usize = 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub storage: Storage,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let storage = Storage::new(config.storage_root.clone(), config.public_base_url.clone());
        Self { config, storage }
    }
}

/// Failures reported to clients as JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with `{error}`.
    #[error("{0}")]
    BadRequest(String),
    /// 422 with `{message, errors: {field: [message]}}`.
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    /// 500 with `{error}`.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorBody::error(message)),
            ApiError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: None,
                    errors: Some(BTreeMap::from([(field.to_string(), vec![message.clone()])])),
                    message: Some(message),
                },
            ),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::error(message)),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes().saturating_add(BODY_SLACK);
    Router::new()
        .route("/upload", post(upload))
        .route("/export", post(export))
        .route("/health", get(health))
        .nest_service("/storage", ServeDir::new(state.storage.root()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

fn too_large(max_kib: u64) -> ApiError {
    ApiError::Validation {
        field: UPLOAD_FIELD,
        message: format!("The pdf file field must not be greater than {} kilobytes.", max_kib),
    }
}

fn read_error(e: MultipartError, max_kib: u64) -> ApiError {
    warn!("Failed to read multipart upload: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_kib)
    } else {
        ApiError::BadRequest("Failed to read upload.".to_string())
    }
}

/// Every PDF starts with this header.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// A `.pdf` name or `application/pdf` type, and a PDF header either way.
fn is_pdf(file_name: &str, content_type: Option<&str>, bytes: &[u8]) -> bool {
    let by_extension = file_name.to_ascii_lowercase().ends_with(".pdf");
    let by_type = content_type.is_some_and(|t| t.eq_ignore_ascii_case("application/pdf"));
    (by_extension || by_type) && bytes.starts_with(PDF_MAGIC)
}

fn required(field: &'static str, label: &str) -> ApiError {
    ApiError::Validation {
        field,
        message: format!("The {} field is required.", label),
    }
}

/// Store an uploaded PDF as `pdfs/<slug>_<unix-seconds>.pdf`.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let max_kib = state.config.max_upload_kib;
    let mut received = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| read_error(e, max_kib))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| read_error(e, max_kib))?;
        if !(file_name.is_empty() && bytes.is_empty()) {
            received = Some((file_name, content_type, bytes));
        }
        break;
    }

    let Some((file_name, content_type, bytes)) = received else {
        warn!("Upload without a {} field", UPLOAD_FIELD);
        return Err(ApiError::BadRequest("No PDF file received.".to_string()));
    };
    if !is_pdf(&file_name, content_type.as_deref(), &bytes) {
        return Err(ApiError::Validation {
            field: UPLOAD_FIELD,
            message: "The pdf file field must be a file of type: pdf.".to_string(),
        });
    }
    if bytes.len() > state.config.max_upload_bytes() {
        return Err(too_large(max_kib));
    }

    let stored = timestamped(file_stem(&file_name), chrono::Utc::now().timestamp());
    let name = format!("{}.pdf", stored);
    let url = state.storage.put(PDF_DIR, &name, &bytes).await.map_err(|e| {
        error!("Error saving uploaded PDF {}: {}", name, e);
        ApiError::Internal("Failed to save PDF on server. Please check server logs.".to_string())
    })?;
    info!("Stored {} ({} bytes) as {}", file_name, bytes.len(), name);
    Ok(Json(UploadResponse::new(url, stored)))
}

/// Decode a PNG data URL and store it as `annotated/annotated_<slug>_<unix-seconds>.png`.
async fn export(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Json<ExportResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!("Rejected export request: {}", e);
        ApiError::Validation {
            field: "image_data",
            message: e.body_text(),
        }
    })?;

    let encoded = request
        .image_data
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .unwrap_or(&request.image_data)
        .replace(' ', "+");
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(required("image_data", "image data"));
    }
    if request.filename.trim().is_empty() {
        return Err(required("filename", "filename"));
    }
    let png = STANDARD.decode(encoded).map_err(|e| {
        error!("Base64 decode failed for image export: {}", e);
        ApiError::BadRequest("Failed to decode image data.".to_string())
    })?;

    let name = format!(
        "annotated_{}.png",
        timestamped(&request.filename, chrono::Utc::now().timestamp())
    );
    let url = state.storage.put(ANNOTATED_DIR, &name, &png).await.map_err(|e| {
        error!("Error saving annotated image {}: {}", name, e);
        ApiError::Internal("Failed to save image on server. Please check server logs.".to_string())
    })?;
    info!("Stored annotated image {} ({} bytes)", name, png.len());
    Ok(Json(ExportResponse { url }))
}
