//! Pointer gestures and the geometry of drag, resize and rotate.

use crate::nodes::{AnnotationNode, NodeId};
use crate::selection::{Corner, Edge, HandleFrame, HandleKind};
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Smallest width or height a resize may produce.
pub const MIN_SIZE: f64 = 1.0;

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressTarget {
    Background,
    Node(NodeId),
    Handle(HandleKind),
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Button is down but the pointer has not left the click tolerance.
    Pressed { target: PressTarget, start: Point },
    /// Moving one or more nodes.
    Dragging(DragState),
    /// Resizing or rotating through a handle anchor.
    Transforming(ManipulationState),
}

/// State for moving nodes by their position.
#[derive(Debug, Clone)]
pub struct DragState {
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Original top-left of each moved node.
    pub originals: Vec<(NodeId, Point)>,
}

impl DragState {
    pub fn new(start_point: Point, originals: Vec<(NodeId, Point)>) -> Self {
        Self {
            start_point,
            current_point: start_point,
            originals,
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// New top-left for every moved node.
    pub fn positions(&self) -> impl Iterator<Item = (NodeId, Point)> + '_ {
        let delta = self.delta();
        self.originals.iter().map(move |&(id, p)| (id, p + delta))
    }
}

/// Original geometry of a node under manipulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub id: NodeId,
    pub bounds: Rect,
    pub rotation: f64,
}

impl NodeGeometry {
    pub fn of(node: &AnnotationNode) -> Self {
        Self {
            id: node.id(),
            bounds: node.bounds(),
            rotation: node.rotation(),
        }
    }
}

/// State of an active handle manipulation.
#[derive(Debug, Clone)]
pub struct ManipulationState {
    /// The anchor being dragged.
    pub handle: HandleKind,
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Frame of the handle when the gesture began.
    pub frame: HandleFrame,
    /// Whether corner resizes lock the aspect ratio.
    pub keep_ratio: bool,
    /// Geometry of every bound node when the gesture began.
    pub originals: Vec<NodeGeometry>,
}

impl ManipulationState {
    pub fn new(
        handle: HandleKind,
        start_point: Point,
        frame: HandleFrame,
        keep_ratio: bool,
        originals: Vec<NodeGeometry>,
    ) -> Self {
        Self {
            handle,
            start_point,
            current_point: start_point,
            frame,
            keep_ratio,
            originals,
        }
    }

    /// Geometry of every bound node for the current pointer position.
    pub fn targets(&self) -> Vec<NodeGeometry> {
        if self.handle == HandleKind::Rotate {
            let angle = rotation_angle(self.frame.bounds.center(), self.current_point);
            return self
                .originals
                .iter()
                .map(|g| NodeGeometry {
                    rotation: angle,
                    ..*g
                })
                .collect();
        }

        let resized = resize_frame(
            self.frame.bounds,
            self.frame.rotation,
            self.handle,
            self.current_point,
            self.keep_ratio,
        );
        match self.originals.as_slice() {
            [single] => vec![NodeGeometry {
                bounds: resized,
                ..*single
            }],
            many => many
                .iter()
                .map(|g| NodeGeometry {
                    bounds: map_into(g.bounds, self.frame.bounds, resized),
                    ..*g
                })
                .collect(),
        }
    }
}

/// Resize a (possibly rotated) box by dragging one anchor to `pointer`.
///
/// Works in the box's unrotated frame: the pointer is mapped back through
/// the rotation, the anchor's edges follow it, and the new box is placed so
/// the opposite anchor stays fixed on the page. With `keep_ratio`, corner
/// drags scale both axes by the larger of the two factors.
pub fn resize_frame(bounds: Rect, rotation: f64, anchor: HandleKind, pointer: Point, keep_ratio: bool) -> Rect {
    let center = bounds.center();
    let local = Affine::rotate_about(-rotation, center) * pointer;
    let Rect { mut x0, mut y0, mut x1, mut y1 } = bounds;

    let (left, top, right, bottom) = match anchor {
        HandleKind::Corner(Corner::TopLeft) => (true, true, false, false),
        HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
        HandleKind::Corner(Corner::BottomRight) => (false, false, true, true),
        HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
        HandleKind::Edge(Edge::Top) => (false, true, false, false),
        HandleKind::Edge(Edge::Right) => (false, false, true, false),
        HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
        HandleKind::Edge(Edge::Left) => (true, false, false, false),
        HandleKind::Rotate => return bounds,
    };
    if left {
        x0 = local.x.min(x1 - MIN_SIZE);
    }
    if right {
        x1 = local.x.max(x0 + MIN_SIZE);
    }
    if top {
        y0 = local.y.min(y1 - MIN_SIZE);
    }
    if bottom {
        y1 = local.y.max(y0 + MIN_SIZE);
    }

    if keep_ratio && anchor.is_corner() && bounds.width() > 0.0 && bounds.height() > 0.0 {
        let scale = ((x1 - x0) / bounds.width()).max((y1 - y0) / bounds.height());
        let size = Size::new(bounds.width() * scale, bounds.height() * scale);
        if left {
            x0 = x1 - size.width;
        } else {
            x1 = x0 + size.width;
        }
        if top {
            y0 = y1 - size.height;
        } else {
            y1 = y0 + size.height;
        }
    }

    let local_box = Rect::new(x0, y0, x1, y1);
    let new_center = Affine::rotate_about(rotation, center) * local_box.center();
    Rect::from_center_size(new_center, local_box.size())
}

/// Place `rect` into `to` the way it sat in `from`, scaling its center
/// offset and its size independently per axis.
pub fn map_into(rect: Rect, from: Rect, to: Rect) -> Rect {
    let sx = if from.width() > 0.0 { to.width() / from.width() } else { 1.0 };
    let sy = if from.height() > 0.0 { to.height() / from.height() } else { 1.0 };
    let offset = rect.center() - from.origin();
    let center = to.origin() + Vec2::new(offset.x * sx, offset.y * sy);
    Rect::from_center_size(center, Size::new(rect.width() * sx, rect.height() * sy))
}

/// Rotation that points a box's top edge at `pointer`; 0 when the pointer is
/// straight above `center`, increasing clockwise on screen.
pub fn rotation_angle(center: Point, pointer: Point) -> f64 {
    let d = pointer - center;
    d.x.atan2(-d.y)
}
