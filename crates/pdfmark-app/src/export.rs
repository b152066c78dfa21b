//! PNG encoding and export packaging.

use pdfmark_core::ExportRequest;
use pdfmark_render::{RenderResult, RendererError, Surface};

/// Encode a surface as an 8-bit RGBA PNG.
pub fn encode_png(surface: &Surface) -> RenderResult<Vec<u8>> {
    let (width, height) = surface.size();
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(surface.image().as_raw())
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG data: {}", e)))?;
    }
    Ok(png_data)
}

/// Encode a flattened surface and wrap it for the export endpoint.
pub fn export_request(surface: &Surface, filename: &str) -> RenderResult<ExportRequest> {
    let png = encode_png(surface)?;
    log::debug!("Encoded {}x{} export: {} bytes", surface.width(), surface.height(), png.len());
    Ok(ExportRequest::from_png(&png, filename))
}
