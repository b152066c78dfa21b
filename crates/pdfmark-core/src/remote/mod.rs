//! Clients for the upload and export collaborators.
//!
//! The editor never stores files itself: PDFs go to an upload endpoint and
//! flattened PNGs to an export endpoint. The wire types here are shared with
//! the server crate.

mod http;
mod memory;

pub use http::HttpCollaborator;
pub use memory::{MemoryCollaborator, RecordedUpload};

use crate::error::NetworkError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Prefix of a base64 PNG data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Boxed future for collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Result type for collaborator calls.
pub type RemoteResult<T> = Result<T, NetworkError>;

/// Successful upload response.
///
/// Both fields are optional on the wire so a malformed success can be told
/// apart from a transport failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "pdfUrl", default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Stored filename without extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl UploadResponse {
    pub fn new(pdf_url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            pdf_url: Some(pdf_url.into()),
            filename: Some(filename.into()),
        }
    }

    /// The URL and filename, if both are present and non-empty.
    pub fn validated(&self) -> Option<(&str, &str)> {
        let url = self.pdf_url.as_deref().filter(|s| !s.is_empty())?;
        let filename = self.filename.as_deref().filter(|s| !s.is_empty())?;
        Some((url, filename))
    }
}

/// Export request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// `data:image/png;base64,...`
    pub image_data: String,
    pub filename: String,
}

impl ExportRequest {
    /// Package encoded PNG bytes as a data URL.
    pub fn from_png(png: &[u8], filename: impl Into<String>) -> Self {
        Self {
            image_data: format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)),
            filename: filename.into(),
        }
    }
}

/// Successful export response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub url: String,
}

/// Error body returned by either endpoint.
///
/// Plain failures carry `error`; validation failures carry `message` plus a
/// per-field list in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<std::collections::BTreeMap<String, Vec<String>>>,
}

impl ErrorBody {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// The most specific human-readable message in the body.
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

/// The upload and export endpoints.
pub trait Collaborator: Send + Sync {
    /// Upload a PDF.
    fn upload(&self, file_name: &str, bytes: &[u8]) -> BoxFuture<'_, RemoteResult<UploadResponse>>;

    /// Store a flattened PNG.
    fn export(&self, request: &ExportRequest) -> BoxFuture<'_, RemoteResult<ExportResponse>>;
}
