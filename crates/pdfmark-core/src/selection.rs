//! Selection state machine and transform handles.
//!
//! The controller owns at most one [`TransformHandle`]. The handle lives
//! inside [`SelectionState`], so replacing the state always drops the previous
//! handle before the new one exists.

use crate::nodes::{AnnotationNode, NodeId};
use kurbo::{Affine, Point, Rect, Vec2};
use log::debug;
use serde::{Deserialize, Serialize};

/// Whether clicks select nodes (Edit) or only drag them (View).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    #[default]
    View,
    Edit,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// An anchor on a transform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner anchor (resizes both axes).
    Corner(Corner),
    /// Edge midpoint anchor (resizes one axis).
    Edge(Edge),
    /// Rotation anchor (positioned above the top edge).
    Rotate,
}

impl HandleKind {
    pub fn is_corner(self) -> bool {
        matches!(self, HandleKind::Corner(_))
    }
}

const CORNERS: [HandleKind; 4] = [
    HandleKind::Corner(Corner::TopLeft),
    HandleKind::Corner(Corner::TopRight),
    HandleKind::Corner(Corner::BottomRight),
    HandleKind::Corner(Corner::BottomLeft),
];

const EDGES: [HandleKind; 4] = [
    HandleKind::Edge(Edge::Top),
    HandleKind::Edge(Edge::Right),
    HandleKind::Edge(Edge::Bottom),
    HandleKind::Edge(Edge::Left),
];

/// The resize/rotate decoration bound to the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformHandle {
    anchors: Vec<HandleKind>,
    keep_ratio: bool,
    rotate_enabled: bool,
    visible: bool,
}

impl TransformHandle {
    /// Handle for one node: eight resize anchors plus rotation.
    pub fn single(keep_ratio: bool) -> Self {
        let mut anchors = Vec::with_capacity(9);
        anchors.extend(CORNERS);
        anchors.extend(EDGES);
        anchors.push(HandleKind::Rotate);
        Self {
            anchors,
            keep_ratio,
            rotate_enabled: true,
            visible: true,
        }
    }

    /// Shared handle for a bulk selection: corners only, free ratio, no rotation.
    pub fn bulk() -> Self {
        Self {
            anchors: CORNERS.to_vec(),
            keep_ratio: false,
            rotate_enabled: false,
            visible: true,
        }
    }

    pub fn anchors(&self) -> &[HandleKind] {
        &self.anchors
    }

    /// Whether corner resizes lock the aspect ratio.
    pub fn keep_ratio(&self) -> bool {
        self.keep_ratio
    }

    pub fn rotate_enabled(&self) -> bool {
        self.rotate_enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Find the anchor under `point`, if any. Hidden handles never hit.
    pub fn hit_test(
        &self,
        frame: &HandleFrame,
        point: Point,
        anchor_size: f64,
        rotate_offset: f64,
        tolerance: f64,
    ) -> Option<HandleKind> {
        if !self.visible {
            return None;
        }
        let local = frame.transform().inverse() * point;
        let reach = anchor_size / 2.0 + tolerance;
        self.anchors.iter().copied().find(|&kind| {
            let anchor = frame.local_anchor(kind, rotate_offset);
            (local.x - anchor.x).abs() <= reach && (local.y - anchor.y).abs() <= reach
        })
    }
}

/// Geometry a transform handle is drawn around: an unrotated box plus a
/// rotation about its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleFrame {
    pub bounds: Rect,
    pub rotation: f64,
}

impl HandleFrame {
    /// Frame hugging a single node, following its rotation.
    pub fn for_node(node: &AnnotationNode) -> Self {
        Self {
            bounds: node.bounds(),
            rotation: node.rotation(),
        }
    }

    /// Axis-aligned frame enclosing several nodes.
    pub fn for_nodes<'a>(nodes: impl IntoIterator<Item = &'a AnnotationNode>) -> Option<Self> {
        let bounds = nodes
            .into_iter()
            .map(AnnotationNode::aabb)
            .reduce(|acc, r| acc.union(r))?;
        Some(Self {
            bounds,
            rotation: 0.0,
        })
    }

    /// Map from the unrotated frame to page space.
    pub fn transform(&self) -> Affine {
        Affine::rotate_about(self.rotation, self.bounds.center())
    }

    /// Anchor position in the unrotated frame.
    pub fn local_anchor(&self, kind: HandleKind, rotate_offset: f64) -> Point {
        let b = self.bounds;
        let c = b.center();
        match kind {
            HandleKind::Corner(Corner::TopLeft) => Point::new(b.x0, b.y0),
            HandleKind::Corner(Corner::TopRight) => Point::new(b.x1, b.y0),
            HandleKind::Corner(Corner::BottomRight) => Point::new(b.x1, b.y1),
            HandleKind::Corner(Corner::BottomLeft) => Point::new(b.x0, b.y1),
            HandleKind::Edge(Edge::Top) => Point::new(c.x, b.y0),
            HandleKind::Edge(Edge::Right) => Point::new(b.x1, c.y),
            HandleKind::Edge(Edge::Bottom) => Point::new(c.x, b.y1),
            HandleKind::Edge(Edge::Left) => Point::new(b.x0, c.y),
            HandleKind::Rotate => Point::new(c.x, b.y0) - Vec2::new(0.0, rotate_offset),
        }
    }

    /// Anchor position in page space.
    pub fn anchor(&self, kind: HandleKind, rotate_offset: f64) -> Point {
        self.transform() * self.local_anchor(kind, rotate_offset)
    }

    /// Border corners in page space: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let t = self.transform();
        let b = self.bounds;
        [
            t * Point::new(b.x0, b.y0),
            t * Point::new(b.x1, b.y0),
            t * Point::new(b.x1, b.y1),
            t * Point::new(b.x0, b.y1),
        ]
    }
}

/// Current selection. Single and Bulk each carry the one live handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Empty,
    Single {
        node: NodeId,
        handle: TransformHandle,
    },
    Bulk {
        nodes: Vec<NodeId>,
        handle: TransformHandle,
    },
}

/// Events the selection state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    /// Click that landed on no node and no anchor.
    ClickBackground,
    /// Click that landed on a handle anchor.
    ClickHandle,
    /// Click on the topmost node under the pointer.
    ClickNode { node: NodeId, keep_ratio: bool },
    /// Edit-mode toggle, carrying every node currently in the scene.
    ToggleEditMode { scene_nodes: Vec<NodeId> },
    /// Delete or Backspace pressed.
    DeleteKey,
}

/// What the owner of the scene must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    Unchanged,
    Changed,
    /// Remove this node from the scene. The selection is already cleared.
    RemoveNode(NodeId),
}

/// Selection state machine.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    mode: EditMode,
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_edit_mode(&self) -> bool {
        self.mode == EditMode::Edit
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self.state, SelectionState::Bulk { .. })
    }

    /// Ids bound to the active handle, in selection order.
    pub fn selected(&self) -> Vec<NodeId> {
        match &self.state {
            SelectionState::Empty => Vec::new(),
            SelectionState::Single { node, .. } => vec![*node],
            SelectionState::Bulk { nodes, .. } => nodes.clone(),
        }
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        match &self.state {
            SelectionState::Empty => false,
            SelectionState::Single { node, .. } => *node == id,
            SelectionState::Bulk { nodes, .. } => nodes.contains(&id),
        }
    }

    pub fn handle(&self) -> Option<&TransformHandle> {
        match &self.state {
            SelectionState::Empty => None,
            SelectionState::Single { handle, .. } | SelectionState::Bulk { handle, .. } => {
                Some(handle)
            }
        }
    }

    fn handle_mut(&mut self) -> Option<&mut TransformHandle> {
        match &mut self.state {
            SelectionState::Empty => None,
            SelectionState::Single { handle, .. } | SelectionState::Bulk { handle, .. } => {
                Some(handle)
            }
        }
    }

    /// Number of live transform handles (0 or 1).
    pub fn handle_count(&self) -> usize {
        usize::from(self.handle().is_some())
    }

    /// Hide the handle for a capture. Returns whether one was visible.
    pub fn hide_handle(&mut self) -> bool {
        match self.handle_mut() {
            Some(handle) if handle.visible => {
                handle.visible = false;
                true
            }
            _ => false,
        }
    }

    /// Show the handle again after [`hide_handle`](Self::hide_handle).
    pub fn show_handle(&mut self) {
        if let Some(handle) = self.handle_mut() {
            handle.visible = true;
        }
    }

    /// Run one transition.
    pub fn apply(&mut self, event: SelectionEvent) -> SelectionEffect {
        let bulk = self.is_bulk();
        match event {
            SelectionEvent::ClickBackground | SelectionEvent::ClickHandle => {
                if self.state == SelectionState::Empty {
                    return SelectionEffect::Unchanged;
                }
                debug!("selection cleared by click (bulk: {})", bulk);
                self.state = SelectionState::Empty;
                SelectionEffect::Changed
            }
            SelectionEvent::ClickNode { node, keep_ratio } => {
                if self.mode == EditMode::View || bulk {
                    return SelectionEffect::Unchanged;
                }
                debug!("single selection: {}", node);
                self.state = SelectionState::Single {
                    node,
                    handle: TransformHandle::single(keep_ratio),
                };
                SelectionEffect::Changed
            }
            SelectionEvent::ToggleEditMode { scene_nodes } => {
                match self.mode {
                    EditMode::View => {
                        self.mode = EditMode::Edit;
                        self.state = if scene_nodes.is_empty() {
                            SelectionState::Empty
                        } else {
                            SelectionState::Bulk {
                                nodes: scene_nodes,
                                handle: TransformHandle::bulk(),
                            }
                        };
                    }
                    EditMode::Edit => {
                        self.mode = EditMode::View;
                        self.state = SelectionState::Empty;
                    }
                }
                debug!(
                    "edit mode {:?}, {} node(s) selected",
                    self.mode,
                    self.selected().len()
                );
                SelectionEffect::Changed
            }
            SelectionEvent::DeleteKey => match self.state {
                SelectionState::Single { node, .. } if self.mode == EditMode::Edit => {
                    debug!("delete selected node {}", node);
                    self.state = SelectionState::Empty;
                    SelectionEffect::RemoveNode(node)
                }
                _ => SelectionEffect::Unchanged,
            },
        }
    }

    /// Drop a node that left the scene from the selection.
    ///
    /// Returns whether the selection changed. A bulk selection that loses its
    /// last node becomes empty.
    pub fn forget(&mut self, id: NodeId) -> bool {
        match &mut self.state {
            SelectionState::Single { node, .. } if *node == id => {
                self.state = SelectionState::Empty;
                true
            }
            SelectionState::Bulk { nodes, .. } if nodes.contains(&id) => {
                nodes.retain(|n| *n != id);
                if nodes.is_empty() {
                    self.state = SelectionState::Empty;
                }
                true
            }
            _ => false,
        }
    }

    /// Destroy the selection and any handle; the edit mode is kept.
    pub fn reset(&mut self) {
        self.state = SelectionState::Empty;
    }
}
