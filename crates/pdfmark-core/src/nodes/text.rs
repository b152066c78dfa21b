//! Text node.

use super::{NodeId, NodeTrait, SerializableColor};
use kurbo::{Point, Rect, Size};
use uuid::Uuid;

/// A text annotation.
///
/// Glyphs come from a square 8x8 bitmap font, so every character advances by
/// exactly one font size and every line is one font size tall. The box may be
/// resized away from that natural extent, in which case the text stretches.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub(crate) id: NodeId,
    /// Top-left corner of the unrotated box.
    pub position: Point,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// Rotation angle in radians (around center).
    pub rotation: f64,
    content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Glyph fill color.
    pub fill: SerializableColor,
    /// Whether pointer drags move the node.
    pub draggable: bool,
}

impl TextNode {
    /// Side of a glyph cell in the embedded bitmap font.
    pub const GLYPH_CELL: u32 = 8;

    /// Create a text node sized to its natural extent.
    pub fn new(position: Point, content: String, font_size: f64, fill: SerializableColor) -> Self {
        let extent = text_extent(&content, font_size);
        Self {
            id: Uuid::new_v4(),
            position,
            width: extent.width,
            height: extent.height,
            rotation: 0.0,
            content,
            font_size,
            fill,
            draggable: true,
        }
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content, keeping the current horizontal and vertical stretch.
    pub fn set_content(&mut self, content: String) {
        let old = self.natural_size();
        let (sx, sy) = stretch(Size::new(self.width, self.height), old);
        self.content = content;
        let new = self.natural_size();
        self.width = new.width * sx;
        self.height = new.height * sy;
    }

    /// Lines of text, split on `\n`.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    /// Extent of the text at its font size, before any stretching.
    pub fn natural_size(&self) -> Size {
        text_extent(&self.content, self.font_size)
    }
}

/// Width/height ratio of `actual` against `natural`, 1.0 on degenerate axes.
fn stretch(actual: Size, natural: Size) -> (f64, f64) {
    let sx = if natural.width > 0.0 { actual.width / natural.width } else { 1.0 };
    let sy = if natural.height > 0.0 { actual.height / natural.height } else { 1.0 };
    (sx, sy)
}

/// Natural extent of `content` rendered at `font_size`.
pub fn text_extent(content: &str, font_size: f64) -> Size {
    let lines = content.split('\n');
    let (count, widest) = lines.fold((0usize, 0usize), |(count, widest), line| {
        (count + 1, widest.max(line.chars().count()))
    });
    Size::new(widest as f64 * font_size, count as f64 * font_size)
}

impl NodeTrait for TextNode {
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

    #[test]
    fn test_text_creation() {
        let text = TextNode::new(
            Point::new(50.0, 50.0),
            "Hello".to_string(),
            20.0,
            SerializableColor::black(),
        );
        assert_eq!(text.content(), "Hello");
        assert!((text.width - 100.0).abs() < f64::EPSILON);
        assert!((text.height - 20.0).abs() < f64::EPSILON);
        assert!(text.draggable);
    }

    #[test]
    fn test_multiline_extent() {
        let extent = text_extent("ab\nlonger\n", 10.0);
        assert!((extent.width - 60.0).abs() < f64::EPSILON);
        assert!((extent.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_content_keeps_stretch() {
        let mut text = TextNode::new(Point::ZERO, "ab".to_string(), 10.0, SerializableColor::black());
        text.width *= 2.0;
        text.set_content("abcd".to_string());
        assert!((text.width - 80.0).abs() < 1e-9);
        assert!((text.height - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds() {
        let text = TextNode::new(Point::new(10.0, 20.0), "Hi".to_string(), 20.0, SerializableColor::black());
        let bounds = text.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 40.0).abs() < f64::EPSILON);
    }
}
