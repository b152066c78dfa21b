//! Annotation node definitions.

mod image;
mod text;

pub use image::{Bitmap, ImageNode, initial_size};
pub use text::{TextNode, text_extent};

use kurbo::{Affine, Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for annotation nodes.
pub type NodeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Channels in RGBA order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Behaviour shared by every node variant.
pub trait NodeTrait {
    /// Get the unique identifier.
    fn id(&self) -> NodeId;

    /// Unrotated box in page-pixel space (top-left = position).
    fn bounds(&self) -> Rect;

    /// Replace position and size with the given box.
    fn set_bounds(&mut self, bounds: Rect);

    /// Rotation in radians around the box center.
    fn rotation(&self) -> f64;

    /// Set the rotation in radians.
    fn set_rotation(&mut self, rotation: f64);

    /// Whether the node follows pointer drags.
    fn is_draggable(&self) -> bool;
}

/// A node in the annotation scene.
#[derive(Debug, Clone)]
pub enum AnnotationNode {
    Text(TextNode),
    Image(ImageNode),
}

impl AnnotationNode {
    pub fn id(&self) -> NodeId {
        match self {
            AnnotationNode::Text(n) => n.id(),
            AnnotationNode::Image(n) => n.id(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            AnnotationNode::Text(n) => n.bounds(),
            AnnotationNode::Image(n) => n.bounds(),
        }
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        match self {
            AnnotationNode::Text(n) => n.set_bounds(bounds),
            AnnotationNode::Image(n) => n.set_bounds(bounds),
        }
    }

    pub fn rotation(&self) -> f64 {
        match self {
            AnnotationNode::Text(n) => n.rotation(),
            AnnotationNode::Image(n) => n.rotation(),
        }
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        match self {
            AnnotationNode::Text(n) => n.set_rotation(rotation),
            AnnotationNode::Image(n) => n.set_rotation(rotation),
        }
    }

    pub fn is_draggable(&self) -> bool {
        match self {
            AnnotationNode::Text(n) => n.is_draggable(),
            AnnotationNode::Image(n) => n.is_draggable(),
        }
    }

    /// Whether a single-node handle locks the aspect ratio (images only).
    pub fn keep_ratio(&self) -> bool {
        matches!(self, AnnotationNode::Image(_))
    }

    /// Top-left corner of the unrotated box.
    pub fn position(&self) -> Point {
        self.bounds().origin()
    }

    /// Width and height of the unrotated box.
    pub fn size(&self) -> Size {
        self.bounds().size()
    }

    /// Center of the box (the rotation pivot).
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Map from node-local coordinates (origin at the box's top-left,
    /// unrotated) to page space.
    pub fn page_transform(&self) -> Affine {
        Affine::rotate_about(self.rotation(), self.center())
            * Affine::translate(self.position().to_vec2())
    }

    /// Map a page-space point into node-local coordinates.
    pub fn to_local(&self, point: Point) -> Point {
        self.page_transform().inverse() * point
    }

    /// The four corners in page space: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let size = self.size();
        let transform = self.page_transform();
        [
            transform * Point::new(0.0, 0.0),
            transform * Point::new(size.width, 0.0),
            transform * Point::new(size.width, size.height),
            transform * Point::new(0.0, size.height),
        ]
    }

    /// Axis-aligned box enclosing the rotated node.
    pub fn aabb(&self) -> Rect {
        let corners = self.corners();
        corners[1..]
            .iter()
            .fold(Rect::from_points(corners[0], corners[0]), |rect, &p| {
                rect.union_pt(p)
            })
    }

    /// Check if a page-space point hits this node, honouring rotation.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.to_local(point);
        Rect::from_origin_size(Point::ZERO, self.size())
            .inflate(tolerance, tolerance)
            .contains(local)
    }

    /// Move the node by a page-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        let bounds = self.bounds();
        self.set_bounds(bounds + delta);
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            AnnotationNode::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageNode> {
        match self {
            AnnotationNode::Image(i) => Some(i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn text_node() -> AnnotationNode {
        AnnotationNode::Text(TextNode::new(
            Point::new(50.0, 50.0),
            "Hello".to_string(),
            20.0,
            SerializableColor::black(),
        ))
    }

    #[test]
    fn test_hit_test_unrotated() {
        let node = text_node();
        assert!(node.hit_test(Point::new(60.0, 60.0), 0.0));
        assert!(!node.hit_test(Point::new(40.0, 60.0), 0.0));
        assert!(node.hit_test(Point::new(48.0, 60.0), 3.0));
    }

    #[test]
    fn test_hit_test_rotated() {
        // 100x20 box centered at (100, 60); rotated a quarter turn it spans
        // x 90..110 and y 10..110.
        let mut node = text_node();
        node.set_rotation(FRAC_PI_2);
        assert!(node.hit_test(Point::new(100.0, 20.0), 0.0));
        assert!(!node.hit_test(Point::new(60.0, 60.0), 0.0));

        let aabb = node.aabb();
        assert!((aabb.x0 - 90.0).abs() < 1e-9);
        assert!((aabb.y1 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_keeps_size() {
        let mut node = text_node();
        let size = node.size();
        node.translate(Vec2::new(10.0, -5.0));
        assert_eq!(node.position(), Point::new(60.0, 45.0));
        assert_eq!(node.size(), size);
    }

    #[test]
    fn test_color_conversion() {
        let color = SerializableColor::new(255, 255, 0, 255);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
        assert_eq!(color.to_array(), [255, 255, 0, 255]);
    }
}
