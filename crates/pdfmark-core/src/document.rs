//! The loaded PDF document as seen by the editor.

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};

/// A successfully uploaded and decoded document.
///
/// Replaced wholesale on every new upload; only the current page moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Filename base (no extension) assigned by the upload endpoint.
    pub id: String,
    /// Public URL the document was stored at, when it came from an upload.
    pub pdf_url: Option<String>,
    page_count: u32,
    current_page: u32,
}

impl Document {
    /// Create a document positioned on its first page.
    pub fn new(id: impl Into<String>, page_count: u32) -> Self {
        Self {
            id: id.into(),
            pdf_url: None,
            page_count,
            current_page: 1,
        }
    }

    /// Attach the URL the document was stored at.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.pdf_url = Some(url.into());
        self
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Current page (1-based).
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Check a 1-based page index against the page count.
    pub fn check_page(&self, page: u32) -> EditorResult<()> {
        if page >= 1 && page <= self.page_count {
            Ok(())
        } else {
            Err(EditorError::PageOutOfRange {
                page,
                page_count: self.page_count,
            })
        }
    }

    /// Move to a page.
    pub fn set_current_page(&mut self, page: u32) -> EditorResult<()> {
        self.check_page(page)?;
        self.current_page = page;
        Ok(())
    }

    /// Whether there is a page after the current one.
    pub fn has_next(&self) -> bool {
        self.current_page < self.page_count
    }

    /// Whether there is a page before the current one.
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}
