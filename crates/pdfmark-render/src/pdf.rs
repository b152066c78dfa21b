//! PDF backends.
//!
//! A backend turns uploaded bytes into a [`PdfDocument`] that knows its page
//! count, the intrinsic size of each page in points, and how to rasterize a
//! page at a given pixel size. Pages are 1-based throughout.

use image::{Rgba, RgbaImage};
use log::debug;
use lopdf::{Dictionary, Document, Object};
use pdfmark_core::EditorError;
use thiserror::Error;

/// US Letter, used when a page declares no MediaBox anywhere in its tree.
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width_pt: 612.0,
    height_pt: 792.0,
};

/// Largest page side, in pixels, a page is rasterized at.
pub const MAX_PAGE_DIMENSION: u32 = 16_384;

/// Largest page area, in pixels (128 MiB of RGBA).
pub const MAX_PAGE_PIXELS: u64 = 1 << 25;

const BORDER: Rgba<u8> = Rgba([220, 220, 220, 255]);
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Errors opening or rasterizing a document.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("encrypted PDFs are not supported")]
    Encrypted,
    #[error("document has no pages")]
    NoPages,
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("page {page} is too large to render ({width_pt}x{height_pt} pt at scale {scale})")]
    PageTooLarge {
        page: u32,
        width_pt: f32,
        height_pt: f32,
        scale: f64,
    },
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<PdfError> for EditorError {
    fn from(error: PdfError) -> Self {
        match error {
            PdfError::PageOutOfRange { page, page_count } => {
                EditorError::PageOutOfRange { page, page_count }
            }
            other => EditorError::Load(other.to_string()),
        }
    }
}

/// Intrinsic page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// Pixel dimensions at `scale`: rounded, never below 1.
    ///
    /// `None` when either side exceeds [`MAX_PAGE_DIMENSION`], the area
    /// exceeds [`MAX_PAGE_PIXELS`], or the product is not finite.
    pub fn pixel_size(&self, scale: f64) -> Option<(u32, u32)> {
        let width = scaled_side(self.width_pt, scale)?;
        let height = scaled_side(self.height_pt, scale)?;
        (u64::from(width) * u64::from(height) <= MAX_PAGE_PIXELS).then_some((width, height))
    }
}

fn scaled_side(pt: f32, scale: f64) -> Option<u32> {
    let px = (f64::from(pt) * scale).round().max(1.0);
    if !px.is_finite() || px > f64::from(MAX_PAGE_DIMENSION) {
        return None;
    }
    // Integral and within 1..=MAX_PAGE_DIMENSION, so the cast is exact.
    Some(px as u32)
}

/// An opened document.
pub trait PdfDocument {
    /// Number of pages (at least 1).
    fn page_count(&self) -> u32;

    /// Intrinsic size of a 1-based page.
    fn page_size(&self, page: u32) -> Result<PageSize, PdfError>;

    /// Rasterize a 1-based page to exactly `width` x `height` pixels.
    fn render_page(&self, page: u32, width: u32, height: u32) -> Result<RgbaImage, PdfError>;

    /// Check a 1-based page index.
    fn check_page(&self, page: u32) -> Result<(), PdfError> {
        let page_count = self.page_count();
        if page >= 1 && page <= page_count {
            Ok(())
        } else {
            Err(PdfError::PageOutOfRange { page, page_count })
        }
    }
}

/// Opens documents.
pub trait PdfBackend {
    fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn PdfDocument>, PdfError>;
}

fn rect_size(object: &Object) -> Option<PageSize> {
    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let x0 = array[0].as_float().ok()?;
    let y0 = array[1].as_float().ok()?;
    let x1 = array[2].as_float().ok()?;
    let y1 = array[3].as_float().ok()?;
    Some(PageSize {
        width_pt: (x1 - x0).abs(),
        height_pt: (y1 - y0).abs(),
    })
}

/// MediaBox of a page, inherited from its ancestors when absent.
fn media_box<'a>(doc: &'a Document, page: &'a Dictionary) -> Option<PageSize> {
    let mut dict = page;
    // Page trees are shallow; the bound guards against reference cycles.
    for _ in 0..32 {
        if let Some(size) = dict.get(b"MediaBox").ok().and_then(rect_size) {
            return Some(size);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Parses document structure with `lopdf` and draws blank paper.
///
/// Page sizes are exact, so the annotation overlay lines up with any real
/// rasterizer; content is not drawn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn parse_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, PdfError> {
        if bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt") {
            return Err(PdfError::Encrypted);
        }
        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());
        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            sizes.push(media_box(&doc, dict).unwrap_or(DEFAULT_PAGE_SIZE));
        }
        if sizes.is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok(sizes)
    }
}

impl PdfBackend for LopdfBackend {
    fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn PdfDocument>, PdfError> {
        let page_sizes = Self::parse_sizes(&bytes)?;
        debug!("opened PDF: {} page(s), {} bytes", page_sizes.len(), bytes.len());
        Ok(Box::new(LopdfDocument { page_sizes }))
    }
}

#[derive(Debug, Clone)]
struct LopdfDocument {
    page_sizes: Vec<PageSize>,
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<PageSize, PdfError> {
        self.check_page(page)?;
        Ok(self.page_sizes[page as usize - 1])
    }

    fn render_page(&self, page: u32, width: u32, height: u32) -> Result<RgbaImage, PdfError> {
        self.check_page(page)?;
        let mut image = RgbaImage::from_pixel(width, height, PAPER);
        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, BORDER);
                image.put_pixel(x, height - 1, BORDER);
            }
            for y in 0..height {
                image.put_pixel(0, y, BORDER);
                image.put_pixel(width - 1, y, BORDER);
            }
        }
        Ok(image)
    }
}

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use super::{PageSize, PdfBackend, PdfDocument, PdfError};
    use image::RgbaImage;
    use pdfium_render::prelude::{PdfPage, PdfRenderConfig, Pdfium};

    /// Rasterizes page content through PDFium.
    pub struct PdfiumBackend {
        pdfium: &'static Pdfium,
    }

    impl PdfiumBackend {
        /// Bind to PDFium next to the executable, in the working directory,
        /// or on the system library path, in that order.
        pub fn bind() -> Result<Self, PdfError> {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            let bindings = exe_dir
                .and_then(|dir| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)).ok()
                })
                .map(Ok)
                .unwrap_or_else(|| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                        .or_else(|_| Pdfium::bind_to_system_library())
                })
                .map_err(|e| PdfError::Backend(format!("failed to bind pdfium: {e}")))?;
            // One binding per process; documents borrow it for their lifetime.
            let pdfium: &'static Pdfium = Box::leak(Box::new(Pdfium::new(bindings)));
            Ok(Self { pdfium })
        }
    }

    impl PdfBackend for PdfiumBackend {
        fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn PdfDocument>, PdfError> {
            let document = self
                .pdfium
                .load_pdf_from_byte_vec(bytes, None)
                .map_err(|e| PdfError::Backend(e.to_string()))?;
            if document.pages().is_empty() {
                return Err(PdfError::NoPages);
            }
            Ok(Box::new(PdfiumDocument { document }))
        }
    }

    struct PdfiumDocument {
        document: pdfium_render::prelude::PdfDocument<'static>,
    }

    impl PdfiumDocument {
        fn page(&self, page: u32) -> Result<PdfPage<'_>, PdfError> {
            self.check_page(page)?;
            self.document
                .pages()
                .get((page - 1) as u16)
                .map_err(|e| PdfError::Backend(e.to_string()))
        }
    }

    impl PdfDocument for PdfiumDocument {
        fn page_count(&self) -> u32 {
            u32::from(self.document.pages().len())
        }

        fn page_size(&self, page: u32) -> Result<PageSize, PdfError> {
            let page = self.page(page)?;
            Ok(PageSize {
                width_pt: page.width().value,
                height_pt: page.height().value,
            })
        }

        fn render_page(&self, page: u32, width: u32, height: u32) -> Result<RgbaImage, PdfError> {
            let config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_target_height(height as i32);
            let bitmap = self
                .page(page)?
                .render_with_config(&config)
                .map_err(|e| PdfError::Backend(e.to_string()))?;
            RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
                .ok_or_else(|| PdfError::Backend("unexpected bitmap size".to_string()))
        }
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium_backend::PdfiumBackend;
