//! Image node for embedding raster images.

use super::{NodeId, NodeTrait};
use image::RgbaImage;
use kurbo::{Point, Rect, Size};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to a decoded RGBA bitmap.
#[derive(Clone)]
pub struct Bitmap(Arc<RgbaImage>);

impl Bitmap {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self::new(image::load_from_memory(bytes)?.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({}x{})", self.width(), self.height())
    }
}

/// Initial display size for an image of the given source size.
///
/// When either side exceeds `max`, both are scaled down so the longer side
/// equals `max`. Smaller images keep their native size; nothing is upscaled.
pub fn initial_size(source_width: f64, source_height: f64, max: f64) -> Size {
    if source_width <= max && source_height <= max {
        return Size::new(source_width, source_height);
    }
    let aspect = source_width / source_height;
    if source_width > source_height {
        Size::new(max, max / aspect)
    } else {
        Size::new(max * aspect, max)
    }
}

/// An image annotation.
#[derive(Debug, Clone)]
pub struct ImageNode {
    pub(crate) id: NodeId,
    /// Top-left corner of the unrotated box.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Rotation angle in radians (around center).
    pub rotation: f64,
    /// Decoded pixels.
    pub bitmap: Bitmap,
    /// Source width / source height.
    pub aspect_ratio: f64,
    /// Whether pointer drags move the node.
    pub draggable: bool,
}

impl ImageNode {
    /// Create an image node, capping its initial size at `max_initial_size`.
    pub fn new(position: Point, bitmap: Bitmap, max_initial_size: f64) -> Self {
        let source_width = f64::from(bitmap.width().max(1));
        let source_height = f64::from(bitmap.height().max(1));
        let size = initial_size(source_width, source_height, max_initial_size);
        Self {
            id: Uuid::new_v4(),
            position,
            width: size.width,
            height: size.height,
            rotation: 0.0,
            bitmap,
            aspect_ratio: source_width / source_height,
            draggable: true,
        }
    }
}

impl NodeTrait for ImageNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.position = bounds.origin();
        self.width = bounds.width();
        self.height = bounds.height();
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    fn is_draggable(&self) -> bool {
        self.draggable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::new(RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn test_oversized_wide_image_is_capped() {
        let node = ImageNode::new(Point::new(50.0, 50.0), bitmap(800, 400), 150.0);
        assert!((node.width - 150.0).abs() < 1e-9);
        assert!((node.height - 75.0).abs() < 1e-9);
        assert!((node.aspect_ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_tall_image_is_capped() {
        let size = initial_size(300.0, 900.0, 150.0);
        assert!((size.height - 150.0).abs() < 1e-9);
        assert!((size.width - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_oversized_image() {
        let size = initial_size(500.0, 500.0, 150.0);
        assert!((size.width - 150.0).abs() < 1e-9);
        assert!((size.height - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_side_over_threshold_preserves_aspect() {
        let size = initial_size(151.0, 10.0, 150.0);
        assert!((size.width - 150.0).abs() < 1e-9);
        assert!((size.width / size.height - 15.1).abs() < 1e-9);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let node = ImageNode::new(Point::ZERO, bitmap(100, 40), 150.0);
        assert!((node.width - 100.0).abs() < f64::EPSILON);
        assert!((node.height - 40.0).abs() < f64::EPSILON);

        let exact = initial_size(150.0, 150.0, 150.0);
        assert!((exact.width - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Bitmap::decode(b"not an image").is_err());
    }

    #[test]
    fn test_bitmap_debug_is_compact() {
        assert_eq!(format!("{:?}", bitmap(3, 2)), "Bitmap(3x2)");
    }
}
