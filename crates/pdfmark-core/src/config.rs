//! Editor configuration.

use crate::nodes::SerializableColor;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Tunables for the annotation editor.
///
/// Defaults reproduce the baseline editor: pages rendered at 1.5x, new nodes
/// placed at (50, 50), images capped at 150 units on their longer side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Multiplier applied to a page's intrinsic point size.
    pub render_scale: f64,
    /// Longest side allowed for a newly added image.
    pub max_initial_image_size: f64,
    /// Where new nodes are placed, in page-pixel space.
    pub default_position: Point,
    /// Font size for new text nodes.
    pub text_font_size: f64,
    /// Fill color for new text nodes.
    pub text_fill: SerializableColor,
    /// Side length of a transform-handle anchor square.
    pub anchor_size: f64,
    /// Stroke color of the transform-handle border and anchors.
    pub handle_color: SerializableColor,
    /// Distance from the top edge to the rotate anchor.
    pub rotate_handle_offset: f64,
    /// Pointer travel below which a press/release counts as a click.
    pub click_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            max_initial_image_size: 150.0,
            default_position: Point::new(50.0, 50.0),
            text_font_size: 20.0,
            text_fill: SerializableColor::black(),
            anchor_size: 8.0,
            handle_color: SerializableColor::new(255, 255, 0, 255),
            rotate_handle_offset: 25.0,
            click_tolerance: 3.0,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
