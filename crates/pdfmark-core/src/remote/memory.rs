//! In-memory collaborator.

use super::{BoxFuture, Collaborator, ExportRequest, ExportResponse, RemoteResult, UploadResponse};
use crate::error::NetworkError;
use std::sync::Mutex;

/// An upload the collaborator received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    uploads: Vec<RecordedUpload>,
    exports: Vec<ExportRequest>,
    upload_response: Option<UploadResponse>,
    failure: Option<NetworkError>,
}

/// Collaborator that keeps every request in memory, for testing and offline use.
#[derive(Debug, Default)]
pub struct MemoryCollaborator {
    inner: Mutex<Inner>,
}

impl MemoryCollaborator {
    /// Create a new collaborator that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every upload with `response` instead of a generated one.
    pub fn with_upload_response(self, response: UploadResponse) -> Self {
        self.update(|inner| inner.upload_response = Some(response));
        self
    }

    /// Fail every subsequent call with `error`.
    pub fn fail_with(&self, error: NetworkError) {
        self.update(|inner| inner.failure = Some(error));
    }

    /// Accept calls again after [`fail_with`](Self::fail_with).
    pub fn recover(&self) {
        self.update(|inner| inner.failure = None);
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.read(|inner| inner.uploads.clone())
    }

    pub fn exports(&self) -> Vec<ExportRequest> {
        self.read(|inner| inner.exports.clone())
    }

    /// Total number of calls that reached the collaborator.
    pub fn request_count(&self) -> usize {
        self.read(|inner| inner.uploads.len() + inner.exports.len())
    }

    fn update(&self, f: impl FnOnce(&mut Inner)) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut inner);
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&inner)
    }
}

fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

impl Collaborator for MemoryCollaborator {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> BoxFuture<'_, RemoteResult<UploadResponse>> {
        let upload = RecordedUpload {
            file_name: file_name.to_string(),
            bytes: bytes.to_vec(),
        };
        Box::pin(async move {
            let mut inner = self
                .inner
                .lock()
                .map_err(|e| NetworkError::transport(format!("Lock error: {}", e)))?;
            if let Some(error) = inner.failure.clone() {
                return Err(error);
            }
            let stem = file_stem(&upload.file_name).to_string();
            inner.uploads.push(upload);
            let response = inner.upload_response.clone().unwrap_or_else(|| {
                UploadResponse::new(format!("memory://pdfs/{}.pdf", stem), stem)
            });
            Ok(response)
        })
    }

    fn export(&self, request: &ExportRequest) -> BoxFuture<'_, RemoteResult<ExportResponse>> {
        let request = request.clone();
        Box::pin(async move {
            let mut inner = self
                .inner
                .lock()
                .map_err(|e| NetworkError::transport(format!("Lock error: {}", e)))?;
            if let Some(error) = inner.failure.clone() {
                return Err(error);
            }
            let url = format!("memory://annotated/annotated_{}.png", request.filename);
            inner.exports.push(request);
            Ok(ExportResponse { url })
        })
    }
}
