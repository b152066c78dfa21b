//! The annotation scene: nodes overlaid on the current page.

use crate::config::EditorConfig;
use crate::input::{InputEvent, MouseButton, PointerEvent};
use crate::manipulation::{DragState, Gesture, ManipulationState, NodeGeometry, PressTarget};
use crate::nodes::{AnnotationNode, Bitmap, ImageNode, NodeId, TextNode};
use crate::selection::{
    EditMode, HandleFrame, HandleKind, SelectionController, SelectionEffect, SelectionEvent,
    SelectionState,
};
use kurbo::Point;
use log::debug;
use std::collections::HashMap;

/// Ordered collection of annotation nodes for one page.
///
/// Z-order is insertion order: later nodes draw on top and win hit tests.
/// Every mutation bumps [`revision`](Self::revision) so the owner knows the
/// overlay needs redrawing.
#[derive(Debug, Clone)]
pub struct AnnotationScene {
    nodes: HashMap<NodeId, AnnotationNode>,
    z_order: Vec<NodeId>,
    selection: SelectionController,
    gesture: Gesture,
    config: EditorConfig,
    revision: u64,
}

impl Default for AnnotationScene {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl AnnotationScene {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            nodes: HashMap::new(),
            z_order: Vec::new(),
            selection: SelectionController::new(),
            gesture: Gesture::Idle,
            config,
            revision: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Counter bumped on every visible change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Add a text node with the configured font size and fill.
    ///
    /// Blank or whitespace-only content is ignored and yields `None`.
    pub fn add_text(&mut self, content: &str, position: Point) -> Option<NodeId> {
        if content.trim().is_empty() {
            return None;
        }
        let node = TextNode::new(
            position,
            content.to_string(),
            self.config.text_font_size,
            self.config.text_fill,
        );
        Some(self.insert(AnnotationNode::Text(node)))
    }

    /// Add an image node, capped at the configured initial size.
    pub fn add_image(&mut self, bitmap: Bitmap, position: Point) -> NodeId {
        let node = ImageNode::new(position, bitmap, self.config.max_initial_image_size);
        self.insert(AnnotationNode::Image(node))
    }

    fn insert(&mut self, node: AnnotationNode) -> NodeId {
        let id = node.id();
        debug!("add node {} at {:?}", id, node.position());
        self.nodes.insert(id, node);
        self.z_order.push(id);
        self.touch();
        id
    }

    /// Remove a node, clearing it from the selection. No-op if absent.
    pub fn remove(&mut self, id: NodeId) -> Option<AnnotationNode> {
        let node = self.nodes.remove(&id)?;
        self.z_order.retain(|n| *n != id);
        self.selection.forget(id);
        self.gesture = Gesture::Idle;
        debug!("removed node {}", id);
        self.touch();
        Some(node)
    }

    /// Remove every node and destroy the selection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.z_order.clear();
        self.selection.reset();
        self.gesture = Gesture::Idle;
        self.touch();
    }

    pub fn get(&self, id: NodeId) -> Option<&AnnotationNode> {
        self.nodes.get(&id)
    }

    /// Mutable access to a node; counts as a change.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut AnnotationNode> {
        if self.nodes.contains_key(&id) {
            self.revision += 1;
        }
        self.nodes.get_mut(&id)
    }

    /// Nodes bottom to top.
    pub fn nodes(&self) -> impl Iterator<Item = &AnnotationNode> {
        self.z_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Node ids bottom to top.
    pub fn ids(&self) -> &[NodeId] {
        &self.z_order
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    /// Topmost node under `point`.
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.hit_test(point, 0.0)))
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Hide the transform handle for a capture. Returns whether one was visible.
    pub fn hide_handle(&mut self) -> bool {
        let hidden = self.selection.hide_handle();
        if hidden {
            self.touch();
        }
        hidden
    }

    /// Show the transform handle again after [`hide_handle`](Self::hide_handle).
    pub fn show_handle(&mut self) {
        self.selection.show_handle();
        self.touch();
    }

    pub fn mode(&self) -> EditMode {
        self.selection.mode()
    }

    /// Frame the active transform handle is drawn around.
    pub fn handle_frame(&self) -> Option<HandleFrame> {
        match self.selection.state() {
            SelectionState::Empty => None,
            SelectionState::Single { node, .. } => self.nodes.get(node).map(HandleFrame::for_node),
            SelectionState::Bulk { nodes, .. } => {
                HandleFrame::for_nodes(nodes.iter().filter_map(|id| self.nodes.get(id)))
            }
        }
    }

    /// Flip between View and Edit; switching on selects every node in bulk.
    pub fn toggle_edit_mode(&mut self) -> EditMode {
        self.gesture = Gesture::Idle;
        let scene_nodes = self.z_order.clone();
        self.selection
            .apply(SelectionEvent::ToggleEditMode { scene_nodes });
        self.touch();
        self.selection.mode()
    }

    /// Feed one input event. Returns whether the scene changed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let changed = match event {
            InputEvent::Pointer(pointer) => self.handle_pointer(pointer),
            InputEvent::Key(key) if key.is_delete() => {
                self.dispatch(SelectionEvent::DeleteKey)
            }
            InputEvent::Key(_) => false,
        };
        if changed {
            self.touch();
        }
        changed
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        match *event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                let target = self.press_target(position);
                self.gesture = Gesture::Pressed {
                    target,
                    start: position,
                };
                false
            }
            PointerEvent::Down { .. } => false,
            PointerEvent::Move { position } => self.pointer_moved(position),
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => {
                let moved = self.pointer_moved(position);
                match std::mem::take(&mut self.gesture) {
                    Gesture::Pressed { target, .. } => self.click(target),
                    Gesture::Idle => false,
                    Gesture::Dragging(_) | Gesture::Transforming(_) => moved,
                }
            }
            PointerEvent::Up { .. } => false,
        }
    }

    /// Handle anchors take precedence over nodes underneath them.
    fn press_target(&self, point: Point) -> PressTarget {
        let anchor = self.selection.handle().zip(self.handle_frame()).and_then(|(handle, frame)| {
            handle.hit_test(
                &frame,
                point,
                self.config.anchor_size,
                self.config.rotate_handle_offset,
                self.config.click_tolerance,
            )
        });
        if let Some(kind) = anchor {
            PressTarget::Handle(kind)
        } else if let Some(id) = self.node_at(point) {
            PressTarget::Node(id)
        } else {
            PressTarget::Background
        }
    }

    fn pointer_moved(&mut self, position: Point) -> bool {
        if let Gesture::Pressed { target, start } = self.gesture {
            if (position - start).hypot() <= self.config.click_tolerance {
                return false;
            }
            self.gesture = self.begin_gesture(target, start);
        }
        match &mut self.gesture {
            Gesture::Dragging(drag) => {
                drag.current_point = position;
                for (id, p) in drag.positions() {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.translate(p - node.position());
                    }
                }
                true
            }
            Gesture::Transforming(manipulation) => {
                manipulation.current_point = position;
                for target in manipulation.targets() {
                    if let Some(node) = self.nodes.get_mut(&target.id) {
                        node.set_bounds(target.bounds);
                        node.set_rotation(target.rotation);
                    }
                }
                true
            }
            Gesture::Idle | Gesture::Pressed { .. } => false,
        }
    }

    fn begin_gesture(&self, target: PressTarget, start: Point) -> Gesture {
        match target {
            PressTarget::Background => Gesture::Idle,
            PressTarget::Node(id) => {
                let Some(node) = self.nodes.get(&id) else {
                    return Gesture::Idle;
                };
                if !node.is_draggable() {
                    return Gesture::Idle;
                }
                let moved = if self.selection.is_bulk() && self.selection.is_selected(id) {
                    self.selection.selected()
                } else {
                    vec![id]
                };
                let originals = moved
                    .into_iter()
                    .filter_map(|id| self.nodes.get(&id).map(|n| (id, n.position())))
                    .collect();
                Gesture::Dragging(DragState::new(start, originals))
            }
            PressTarget::Handle(kind) => {
                let (Some(handle), Some(frame)) = (self.selection.handle(), self.handle_frame())
                else {
                    return Gesture::Idle;
                };
                if kind == HandleKind::Rotate && !handle.rotate_enabled() {
                    return Gesture::Idle;
                }
                let originals = self
                    .selection
                    .selected()
                    .into_iter()
                    .filter_map(|id| self.nodes.get(&id).map(NodeGeometry::of))
                    .collect();
                Gesture::Transforming(ManipulationState::new(
                    kind,
                    start,
                    frame,
                    handle.keep_ratio(),
                    originals,
                ))
            }
        }
    }

    fn click(&mut self, target: PressTarget) -> bool {
        let event = match target {
            PressTarget::Background => SelectionEvent::ClickBackground,
            PressTarget::Handle(_) => SelectionEvent::ClickHandle,
            PressTarget::Node(node) => SelectionEvent::ClickNode {
                node,
                keep_ratio: self.nodes.get(&node).is_some_and(AnnotationNode::keep_ratio),
            },
        };
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: SelectionEvent) -> bool {
        match self.selection.apply(event) {
            SelectionEffect::Unchanged => false,
            SelectionEffect::Changed => true,
            SelectionEffect::RemoveNode(id) => self.remove(id).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyEvent;
    use image::{Rgba, RgbaImage};
    use kurbo::Rect;

    fn press(scene: &mut AnnotationScene, at: Point) {
        scene.handle_event(&PointerEvent::press(at).into());
    }

    fn click(scene: &mut AnnotationScene, at: Point) -> bool {
        press(scene, at);
        scene.handle_event(&PointerEvent::release(at).into())
    }

    fn drag(scene: &mut AnnotationScene, from: Point, to: Point) {
        press(scene, from);
        scene.handle_event(&PointerEvent::Move { position: to }.into());
        scene.handle_event(&PointerEvent::release(to).into());
    }

    fn delete(scene: &mut AnnotationScene) -> bool {
        scene.handle_event(&KeyEvent::Pressed("Delete".to_string()).into())
    }

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::new(RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 255])))
    }

    fn hello_scene() -> (AnnotationScene, NodeId) {
        let mut scene = AnnotationScene::default();
        let id = scene.add_text("Hello", Point::new(50.0, 50.0)).unwrap();
        (scene, id)
    }

    #[test]
    fn test_add_text_uses_defaults() {
        let (scene, id) = hello_scene();
        let text = scene.get(id).and_then(AnnotationNode::as_text).unwrap();
        assert!((text.font_size - 20.0).abs() < f64::EPSILON);
        assert_eq!(text.fill, crate::SerializableColor::black());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let mut scene = AnnotationScene::default();
        let before = scene.revision();
        assert!(scene.add_text("", Point::ZERO).is_none());
        assert!(scene.add_text("  \n\t", Point::ZERO).is_none());
        assert!(scene.is_empty());
        assert_eq!(scene.revision(), before);
    }

    #[test]
    fn test_add_image_scaling() {
        let mut scene = AnnotationScene::default();
        let big = scene.add_image(bitmap(800, 400), Point::new(50.0, 50.0));
        let small = scene.add_image(bitmap(40, 30), Point::new(50.0, 50.0));
        let size = scene.get(big).unwrap().size();
        assert!((size.width - 150.0).abs() < 1e-9);
        assert!((size.height - 75.0).abs() < 1e-9);
        let size = scene.get(small).unwrap().size();
        assert!((size.width - 40.0).abs() < 1e-9);
        assert!((size.height - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_topmost_node_wins() {
        let mut scene = AnnotationScene::default();
        let bottom = scene.add_text("Hello", Point::new(50.0, 50.0)).unwrap();
        let top = scene.add_text("World", Point::new(60.0, 55.0)).unwrap();
        assert_eq!(scene.node_at(Point::new(70.0, 60.0)), Some(top));
        assert_eq!(scene.node_at(Point::new(52.0, 52.0)), Some(bottom));
        assert_eq!(scene.node_at(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_click_selects_only_in_edit_mode() {
        let (mut scene, id) = hello_scene();
        assert!(!click(&mut scene, Point::new(60.0, 60.0)));
        assert_eq!(scene.selection().handle_count(), 0);

        scene.toggle_edit_mode();
        assert!(scene.selection().is_bulk());
        // A node click keeps the bulk selection; the background leaves it.
        assert!(!click(&mut scene, Point::new(60.0, 60.0)));
        assert!(click(&mut scene, Point::new(400.0, 400.0)));
        assert_eq!(scene.selection().state(), &SelectionState::Empty);
        assert!(click(&mut scene, Point::new(60.0, 60.0)));
        assert_eq!(scene.selection().selected(), vec![id]);
        assert_eq!(scene.selection().handle_count(), 1);

        assert!(click(&mut scene, Point::new(400.0, 400.0)));
        assert_eq!(scene.selection().state(), &SelectionState::Empty);
    }

    #[test]
    fn test_toggle_edit_mode_bulk_and_off() {
        let (mut scene, id) = hello_scene();
        assert_eq!(scene.toggle_edit_mode(), EditMode::Edit);
        assert!(scene.selection().is_bulk());
        assert_eq!(scene.selection().selected(), vec![id]);
        assert_eq!(scene.toggle_edit_mode(), EditMode::View);
        assert_eq!(scene.selection().handle_count(), 0);
    }

    #[test]
    fn test_toggle_on_empty_scene_has_no_handle() {
        let mut scene = AnnotationScene::default();
        scene.toggle_edit_mode();
        assert_eq!(scene.selection().handle_count(), 0);
    }

    #[test]
    fn test_delete_selected_node() {
        let (mut scene, id) = hello_scene();
        let other = scene.add_text("Other", Point::new(300.0, 300.0)).unwrap();
        scene.toggle_edit_mode();
        click(&mut scene, Point::new(400.0, 400.0));
        click(&mut scene, Point::new(60.0, 60.0));

        assert!(delete(&mut scene));
        assert!(scene.get(id).is_none());
        assert!(scene.get(other).is_some());
        assert_eq!(scene.selection().state(), &SelectionState::Empty);
    }

    #[test]
    fn test_delete_ignored_in_view_mode_and_bulk() {
        let (mut scene, _) = hello_scene();
        assert!(!delete(&mut scene));
        scene.toggle_edit_mode();
        assert!(!delete(&mut scene));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_removing_unselected_node_keeps_selection() {
        let (mut scene, id) = hello_scene();
        let other = scene.add_text("Other", Point::new(300.0, 300.0)).unwrap();
        scene.toggle_edit_mode();
        click(&mut scene, Point::new(400.0, 400.0));
        click(&mut scene, Point::new(60.0, 60.0));

        scene.remove(other);
        assert_eq!(scene.selection().selected(), vec![id]);
        scene.remove(id);
        assert_eq!(scene.selection().state(), &SelectionState::Empty);
        assert!(scene.remove(id).is_none());
    }

    #[test]
    fn test_drag_in_view_mode() {
        let (mut scene, id) = hello_scene();
        drag(&mut scene, Point::new(60.0, 60.0), Point::new(110.0, 80.0));
        assert_eq!(scene.get(id).unwrap().position(), Point::new(100.0, 70.0));
        assert_eq!(scene.selection().handle_count(), 0);
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let (mut scene, id) = hello_scene();
        scene.toggle_edit_mode();
        click(&mut scene, Point::new(400.0, 400.0));
        press(&mut scene, Point::new(60.0, 60.0));
        scene.handle_event(&PointerEvent::Move { position: Point::new(61.0, 61.0) }.into());
        scene.handle_event(&PointerEvent::release(Point::new(61.0, 61.0)).into());
        assert_eq!(scene.get(id).unwrap().position(), Point::new(50.0, 50.0));
        assert_eq!(scene.selection().selected(), vec![id]);
    }

    #[test]
    fn test_bulk_drag_moves_all_selected() {
        let mut scene = AnnotationScene::default();
        let a = scene.add_text("Hello", Point::new(50.0, 50.0)).unwrap();
        let b = scene.add_text("World", Point::new(50.0, 200.0)).unwrap();
        scene.toggle_edit_mode();
        drag(&mut scene, Point::new(60.0, 60.0), Point::new(70.0, 80.0));
        assert_eq!(scene.get(a).unwrap().position(), Point::new(60.0, 70.0));
        assert_eq!(scene.get(b).unwrap().position(), Point::new(60.0, 220.0));
    }

    #[test]
    fn test_resize_through_handle() {
        let (mut scene, id) = hello_scene();
        scene.toggle_edit_mode();
        click(&mut scene, Point::new(400.0, 400.0));
        click(&mut scene, Point::new(60.0, 60.0));

        // Bottom-right anchor of the 100x20 box at (50, 50).
        drag(&mut scene, Point::new(150.0, 70.0), Point::new(250.0, 90.0));
        let bounds = scene.get(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(50.0, 50.0, 250.0, 90.0));
        assert_eq!(scene.selection().selected(), vec![id]);
    }

    #[test]
    fn test_rotate_through_handle() {
        let (mut scene, id) = hello_scene();
        scene.toggle_edit_mode();
        click(&mut scene, Point::new(400.0, 400.0));
        click(&mut scene, Point::new(60.0, 60.0));

        // Rotate anchor sits 25 above the top-center (100, 50).
        drag(&mut scene, Point::new(100.0, 25.0), Point::new(200.0, 60.0));
        let rotation = scene.get(id).unwrap().rotation();
        assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_clear_resets_selection_but_keeps_mode() {
        let (mut scene, _) = hello_scene();
        scene.toggle_edit_mode();
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.selection().handle_count(), 0);
        assert_eq!(scene.mode(), EditMode::Edit);
    }

    #[test]
    fn test_single_selection_and_delete_after_bulk() {
        let mut scene = AnnotationScene::default();
        let hello = scene.add_text("Hello", Point::new(50.0, 50.0)).unwrap();
        let world = scene.add_text("World", Point::new(50.0, 200.0)).unwrap();
        scene.toggle_edit_mode();
        assert_eq!(scene.selection().selected().len(), 2);

        assert!(click(&mut scene, Point::new(380.0, 580.0)));
        assert!(click(&mut scene, Point::new(60.0, 60.0)));
        assert!(!scene.selection().is_bulk());
        assert_eq!(scene.selection().selected(), vec![hello]);

        assert!(delete(&mut scene));
        assert_eq!(scene.ids(), &[world]);
        assert_eq!(scene.selection().handle_count(), 0);
    }

    #[test]
    fn test_hide_and_show_handle() {
        let (mut scene, _) = hello_scene();
        assert!(!scene.hide_handle());
        scene.toggle_edit_mode();
        let before = scene.revision();
        assert!(scene.hide_handle());
        assert!(!scene.selection().handle().unwrap().is_visible());
        assert!(scene.revision() > before);
        scene.show_handle();
        assert!(scene.selection().handle().unwrap().is_visible());
    }
}
