//! Renderer trait abstraction.

use crate::surface::Surface;
use pdfmark_core::{AnnotationScene, EditorError};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    #[error("surface size mismatch: page {page:?}, scene {scene:?}")]
    DimensionMismatch { page: (u32, u32), scene: (u32, u32) },
    #[error("Encode failed: {0}")]
    Encode(String),
}

impl From<RendererError> for EditorError {
    fn from(error: RendererError) -> Self {
        EditorError::Render(error.to_string())
    }
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for drawing the annotation overlay once.
pub struct RenderContext<'a> {
    /// The scene to draw.
    pub scene: &'a AnnotationScene,
    /// Overlay size in pixels; always the page raster's size.
    pub size: (u32, u32),
    /// Transform handle border and anchor stroke.
    pub handle_color: Color,
    /// Anchor square side.
    pub anchor_size: f64,
    /// Distance from the top edge to the rotate anchor.
    pub rotate_offset: f64,
    /// Whether to draw the transform handle at all.
    pub show_handles: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a context using the scene's handle configuration.
    pub fn new(scene: &'a AnnotationScene, size: (u32, u32)) -> Self {
        let config = scene.config();
        Self {
            scene,
            size,
            handle_color: config.handle_color.into(),
            anchor_size: config.anchor_size,
            rotate_offset: config.rotate_handle_offset,
            show_handles: true,
        }
    }

    /// Draw or suppress the transform handle.
    pub fn with_handles(mut self, show: bool) -> Self {
        self.show_handles = show;
        self
    }
}

/// Trait for overlay rendering backends.
pub trait Renderer {
    /// Redraw `target` from scratch for the given context.
    ///
    /// `target` is resized to `ctx.size` first if needed.
    fn render(&mut self, ctx: &RenderContext, target: &mut Surface);
}
