//! CPU rasterizer for the annotation overlay.
//!
//! Nodes are drawn by inverse mapping: every pixel inside a node's rotated
//! bounding box is mapped back into the node's local frame and sampled there.
//! Text uses the embedded 8x8 bitmap font, one glyph cell per font size.

use crate::renderer::{RenderContext, Renderer};
use crate::surface::Surface;
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Pixel, Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect, Vec2};
use log::trace;
use pdfmark_core::nodes::{ImageNode, TextNode};
use pdfmark_core::{AnnotationNode, HandleFrame, HandleKind, TransformHandle};
use peniko::Color;

const ANCHOR_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn to_rgba(color: Color) -> Rgba<u8> {
    let c = color.to_rgba8();
    Rgba([c.r, c.g, c.b, c.a])
}

/// Draws the annotation scene onto a transparent surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuRenderer;

impl CpuRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for CpuRenderer {
    fn render(&mut self, ctx: &RenderContext, target: &mut Surface) {
        if target.size() == ctx.size {
            target.clear();
        } else {
            target.resize(ctx.size.0, ctx.size.1);
        }
        let image = target.image_mut();
        for node in ctx.scene.nodes() {
            draw_node(image, node);
        }

        if !ctx.show_handles {
            return;
        }
        let selection = ctx.scene.selection();
        if let (Some(handle), Some(frame)) = (selection.handle(), ctx.scene.handle_frame()) {
            if handle.is_visible() {
                draw_handle(image, &frame, handle, ctx);
            }
        }
        trace!("overlay drawn: {} node(s)", ctx.scene.len());
    }
}

/// Pixel range `[x0, x1) x [y0, y1)` covering `rect`, clipped to the image.
fn pixel_span(rect: Rect, (width, height): (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let x0 = rect.x0.floor().max(0.0) as u32;
    let y0 = rect.y0.floor().max(0.0) as u32;
    let x1 = rect.x1.ceil().clamp(0.0, f64::from(width)) as u32;
    let y1 = rect.y1.ceil().clamp(0.0, f64::from(height)) as u32;
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Blend `sample(local)` over every pixel whose center maps inside the node.
fn fill_node(image: &mut RgbaImage, node: &AnnotationNode, sample: impl Fn(Point) -> Option<Rgba<u8>>) {
    let size = node.size();
    if size.width <= 0.0 || size.height <= 0.0 {
        return;
    }
    let Some((x0, y0, x1, y1)) = pixel_span(node.aabb(), image.dimensions()) else {
        return;
    };
    let inverse = node.page_transform().inverse();
    for y in y0..y1 {
        for x in x0..x1 {
            let local = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if local.x < 0.0 || local.y < 0.0 || local.x >= size.width || local.y >= size.height {
                continue;
            }
            if let Some(color) = sample(local) {
                image.get_pixel_mut(x, y).blend(&color);
            }
        }
    }
}

fn draw_node(image: &mut RgbaImage, node: &AnnotationNode) {
    match node {
        AnnotationNode::Text(text) => {
            let sampler = TextSampler::new(text);
            fill_node(image, node, |p| sampler.sample(p));
        }
        AnnotationNode::Image(img) => {
            let sampler = ImageSampler::new(img);
            fill_node(image, node, |p| sampler.sample(p));
        }
    }
}

fn glyph(c: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
}

struct TextSampler {
    lines: Vec<Vec<char>>,
    cell_width: f64,
    cell_height: f64,
    color: Rgba<u8>,
}

impl TextSampler {
    fn new(text: &TextNode) -> Self {
        let natural = text.natural_size();
        let sx = if natural.width > 0.0 { text.width / natural.width } else { 1.0 };
        let sy = if natural.height > 0.0 { text.height / natural.height } else { 1.0 };
        Self {
            lines: text.lines().map(|l| l.chars().collect()).collect(),
            cell_width: text.font_size * sx,
            cell_height: text.font_size * sy,
            color: Rgba(text.fill.to_array()),
        }
    }

    fn sample(&self, local: Point) -> Option<Rgba<u8>> {
        if self.cell_width <= 0.0 || self.cell_height <= 0.0 {
            return None;
        }
        let row = (local.y / self.cell_height) as usize;
        let col = (local.x / self.cell_width) as usize;
        let c = *self.lines.get(row)?.get(col)?;
        let bits = glyph(c)?;
        let cell = TextNode::GLYPH_CELL as f64;
        let gx = (((local.x - col as f64 * self.cell_width) / self.cell_width) * cell) as usize;
        let gy = (((local.y - row as f64 * self.cell_height) / self.cell_height) * cell) as usize;
        let bit = (bits[gy.min(7)] >> gx.min(7)) & 1;
        (bit == 1).then_some(self.color)
    }
}

struct ImageSampler<'a> {
    source: &'a RgbaImage,
    sx: f64,
    sy: f64,
}

impl<'a> ImageSampler<'a> {
    fn new(node: &'a ImageNode) -> Self {
        let source = node.bitmap.image();
        Self {
            source,
            sx: f64::from(source.width()) / node.width,
            sy: f64::from(source.height()) / node.height,
        }
    }

    fn sample(&self, local: Point) -> Option<Rgba<u8>> {
        let (w, h) = self.source.dimensions();
        if w == 0 || h == 0 {
            return None;
        }
        let x = ((local.x * self.sx) as u32).min(w - 1);
        let y = ((local.y * self.sy) as u32).min(h - 1);
        Some(*self.source.get_pixel(x, y))
    }
}

fn blend_at(image: &mut RgbaImage, p: Point, color: Rgba<u8>) {
    if p.x < 0.0 || p.y < 0.0 {
        return;
    }
    let (x, y) = (p.x as u32, p.y as u32);
    if x < image.width() && y < image.height() {
        image.get_pixel_mut(x, y).blend(&color);
    }
}

fn draw_line(image: &mut RgbaImage, a: Point, b: Point, color: Rgba<u8>) {
    let d = b - a;
    let steps = d.x.abs().max(d.y.abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        blend_at(image, a + d * t, color);
    }
}

/// Filled square anchor with a 1px stroke, turned with the frame.
fn draw_anchor(image: &mut RgbaImage, center: Point, rotation: f64, side: f64, stroke: Rgba<u8>) {
    let half = side / 2.0;
    let reach = Vec2::new(side, side);
    let Some((x0, y0, x1, y1)) = pixel_span(Rect::from_points(center - reach, center + reach), image.dimensions()) else {
        return;
    };
    let to_local = Affine::rotate(-rotation);
    for y in y0..y1 {
        for x in x0..x1 {
            let offset = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5) - center;
            let local = to_local * offset.to_point();
            if local.x.abs() > half || local.y.abs() > half {
                continue;
            }
            let on_border = local.x.abs() > half - 1.0 || local.y.abs() > half - 1.0;
            let color = if on_border { stroke } else { ANCHOR_FILL };
            image.get_pixel_mut(x, y).blend(&color);
        }
    }
}

fn draw_handle(image: &mut RgbaImage, frame: &HandleFrame, handle: &TransformHandle, ctx: &RenderContext) {
    let stroke = to_rgba(ctx.handle_color);
    let corners = frame.corners();
    for i in 0..corners.len() {
        draw_line(image, corners[i], corners[(i + 1) % corners.len()], stroke);
    }
    for &kind in handle.anchors() {
        if kind == HandleKind::Rotate && !handle.rotate_enabled() {
            continue;
        }
        let center = frame.anchor(kind, ctx.rotate_offset);
        draw_anchor(image, center, frame.rotation, ctx.anchor_size, stroke);
    }
}
