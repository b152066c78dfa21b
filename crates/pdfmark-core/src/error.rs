//! Error taxonomy for the editor.
//!
//! Every variant is recoverable: the session reports it and stays usable.

use std::fmt;
use thiserror::Error;

/// Errors surfaced by editor operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// The PDF document could not be decoded or loaded.
    #[error("Error loading PDF: {0}")]
    Load(String),
    /// A user-supplied image file could not be decoded.
    #[error("Could not load image {name}: {reason}")]
    Decode { name: String, reason: String },
    /// An operation was attempted before the editor had what it needs.
    #[error("PDF not loaded or something went wrong: {0}")]
    NotReady(NotReadyReason),
    /// Page navigation outside `[1, page_count]`.
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    /// The overlay could not be flattened or encoded.
    #[error("Render failed: {0}")]
    Render(String),
    /// Upload or export request failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// What was missing when an operation reported [`EditorError::NotReady`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// No document has been loaded.
    NoDocument,
    /// No page has been rendered yet, so there is no stage to capture.
    NoStage,
    /// The document has no export filename.
    NoFilename,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::NoDocument => write!(f, "no document loaded"),
            NotReadyReason::NoStage => write!(f, "no page rendered"),
            NotReadyReason::NoFilename => write!(f, "missing filename"),
        }
    }
}

/// A failed round-trip to the upload or export collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NetworkError {
    /// HTTP status when the server answered at all.
    pub status: Option<u16>,
    /// Server-provided message when available, a generic one otherwise.
    pub message: String,
}

impl NetworkError {
    /// Error for a non-success HTTP status, preferring the server's message.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        Self {
            status: Some(status),
            message,
        }
    }

    /// Error for a request that never produced a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Error for a response that arrived but could not be used.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}
