//! Flattening the page raster and the annotation overlay.

use crate::renderer::{RenderResult, RendererError};
use crate::surface::Surface;
use image::imageops;

/// Stack `scene` over `page` with alpha-over blending.
///
/// Both surfaces must have identical dimensions; the overlay is transparent
/// wherever there is no annotation, so the page shows through.
pub fn composite(page: &Surface, scene: &Surface) -> RenderResult<Surface> {
    if page.size() != scene.size() {
        return Err(RendererError::DimensionMismatch {
            page: page.size(),
            scene: scene.size(),
        });
    }
    let mut output = Surface::new(page.width(), page.height());
    imageops::overlay(output.image_mut(), page.image(), 0, 0);
    imageops::overlay(output.image_mut(), scene.image(), 0, 0);
    Ok(output)
}
