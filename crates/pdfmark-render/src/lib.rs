//! pdfmark Render Library
//!
//! Everything that touches pixels: PDF backends, the page renderer and its
//! single-slot render queue, the CPU rasterizer for annotation nodes and
//! transform handles, and the compositor that flattens both layers.

mod compositor;
mod page;
pub mod pdf;
mod queue;
mod raster;
mod renderer;
mod surface;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

pub use compositor::composite;
pub use page::PageRenderer;
pub use pdf::{LopdfBackend, PageSize, PdfBackend, PdfDocument, PdfError};
pub use queue::{QueueOutcome, RenderQueue};
pub use raster::CpuRenderer;
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use surface::Surface;

#[cfg(feature = "pdfium")]
pub use pdf::PdfiumBackend;
