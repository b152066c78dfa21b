//! Page rasterization onto the shared page surface.

use crate::pdf::{PdfDocument, PdfError};
use crate::surface::Surface;
use log::info;

/// Default multiplier from PDF points to pixels.
pub const DEFAULT_SCALE: f64 = 1.5;

/// Renders one page at a time onto a surface it owns and reuses.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    surface: Surface,
    scale: f64,
    page: Option<u32>,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

impl PageRenderer {
    /// Create a renderer. Non-positive or non-finite scales fall back to 1.0.
    pub fn new(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self {
            surface: Surface::default(),
            scale,
            page: None,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pixel size a page will be rendered at.
    ///
    /// Fails with [`PdfError::PageTooLarge`] past the rasterization caps.
    pub fn page_pixel_size(&self, document: &dyn PdfDocument, page: u32) -> Result<(u32, u32), PdfError> {
        let size = document.page_size(page)?;
        size.pixel_size(self.scale).ok_or(PdfError::PageTooLarge {
            page,
            width_pt: size.width_pt,
            height_pt: size.height_pt,
            scale: self.scale,
        })
    }

    /// Rasterize `page` (1-based).
    ///
    /// The surface is resized to the page's scaled dimensions before drawing,
    /// which drops the previous page. On error the surface is left empty.
    pub fn render(&mut self, document: &dyn PdfDocument, page: u32) -> Result<&Surface, PdfError> {
        self.page = None;
        let (width, height) = match self.page_pixel_size(document, page) {
            Ok(size) => size,
            Err(e) => {
                self.surface.resize(0, 0);
                return Err(e);
            }
        };
        self.surface.resize(width, height);
        let raster = match document.render_page(page, width, height) {
            Ok(raster) => raster,
            Err(e) => {
                self.surface.resize(0, 0);
                return Err(e);
            }
        };
        if !self.surface.replace(raster) {
            self.surface.resize(0, 0);
            return Err(PdfError::Backend(format!(
                "backend returned wrong size for page {page} (expected {width}x{height})"
            )));
        }
        self.page = Some(page);
        info!("Rendered page {} at {}x{}", page, width, height);
        Ok(&self.surface)
    }

    /// The last rendered page, if the surface currently holds one.
    pub fn rendered_page(&self) -> Option<u32> {
        self.page
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Drop the current raster.
    pub fn clear(&mut self) {
        self.page = None;
        self.surface.resize(0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_pdf;
    use crate::pdf::{LopdfBackend, PdfBackend};

    fn document(pages: u32) -> Box<dyn PdfDocument> {
        LopdfBackend::new()
            .open(sample_pdf(pages, 612.0, 792.0).unwrap())
            .unwrap()
    }

    #[test]
    fn test_surface_matches_scaled_page() {
        let doc = document(2);
        for scale in [0.5, 1.0, 1.5, 2.25] {
            let mut renderer = PageRenderer::new(scale);
            let surface = renderer.render(doc.as_ref(), 2).unwrap();
            let expected = ((612.0 * scale).round() as u32, (792.0 * scale).round() as u32);
            assert_eq!(surface.size(), expected);
        }
    }

    #[test]
    fn test_out_of_range_page_leaves_empty_surface() {
        let doc = document(1);
        let mut renderer = PageRenderer::default();
        renderer.render(doc.as_ref(), 1).unwrap();
        assert_eq!(renderer.rendered_page(), Some(1));
        assert!(matches!(
            renderer.render(doc.as_ref(), 2),
            Err(PdfError::PageOutOfRange { page: 2, page_count: 1 })
        ));
        assert!(renderer.surface().is_empty());
        assert_eq!(renderer.rendered_page(), None);
    }

    #[test]
    fn test_oversized_page_is_rejected_before_allocating() {
        let huge = LopdfBackend::new()
            .open(sample_pdf(1, 1e9, 1e9).unwrap())
            .unwrap();
        let mut renderer = PageRenderer::default();
        renderer.render(document(1).as_ref(), 1).unwrap();

        assert!(matches!(
            renderer.render(huge.as_ref(), 1),
            Err(PdfError::PageTooLarge { page: 1, .. })
        ));
        assert!(renderer.surface().is_empty());
        assert_eq!(renderer.rendered_page(), None);
    }

    #[test]
    fn test_invalid_scale_falls_back() {
        assert!((PageRenderer::new(0.0).scale() - 1.0).abs() < f64::EPSILON);
        assert!((PageRenderer::new(f64::NAN).scale() - 1.0).abs() < f64::EPSILON);
        assert!((PageRenderer::default().scale() - 1.5).abs() < f64::EPSILON);
    }
}
