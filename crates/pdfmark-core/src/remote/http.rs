//! HTTP collaborator backed by `reqwest`.

use super::{
    BoxFuture, Collaborator, ErrorBody, ExportRequest, ExportResponse, RemoteResult, UploadResponse,
};
use crate::error::NetworkError;
use log::{debug, error, warn};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Multipart field the upload endpoint reads the PDF from.
pub const UPLOAD_FIELD: &str = "pdf_file";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Talks to a pdfmark server (or any server speaking the same JSON).
///
/// Requests run on the caller's tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCollaborator {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:3030`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("HTTP client setup failed ({}), using defaults without timeout", e);
                reqwest::Client::new()
            });
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn transport(error: reqwest::Error) -> NetworkError {
    NetworkError::transport(error.to_string())
}

/// Parse a success body, or turn an error status into a [`NetworkError`]
/// carrying the server's message when it sent one.
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> RemoteResult<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::into_message);
        return Err(NetworkError::from_status(status.as_u16(), message));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| NetworkError::invalid_response(format!("Invalid server response: {}", e)))
}

impl Collaborator for HttpCollaborator {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> BoxFuture<'_, RemoteResult<UploadResponse>> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf");
        let url = self.endpoint("upload");
        let size = bytes.len();
        Box::pin(async move {
            debug!("POST {} ({} bytes)", url, size);
            let result: RemoteResult<UploadResponse> = async {
                let form = Form::new().part(UPLOAD_FIELD, part.map_err(transport)?);
                let response = self
                    .client
                    .post(&url)
                    .header(ACCEPT, "application/json")
                    .multipart(form)
                    .send()
                    .await
                    .map_err(transport)?;
                read_response(response).await
            }
            .await;
            result.inspect_err(|e| error!("Upload failed: {}", e))
        })
    }

    fn export(&self, request: &ExportRequest) -> BoxFuture<'_, RemoteResult<ExportResponse>> {
        let request = request.clone();
        let url = self.endpoint("export");
        Box::pin(async move {
            debug!("POST {} ({})", url, request.filename);
            let result = match self
                .client
                .post(&url)
                .header(ACCEPT, "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(response) => read_response(response).await,
                Err(e) => Err(transport(e)),
            };
            result.inspect_err(|e| error!("Export failed: {}", e))
        })
    }
}
