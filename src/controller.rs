use crossterm::event::{Event, KeyCode, MouseButton, MouseEventKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ratatui::prelude::Rect;

use crate::layout::{InsertPosition, LayoutTree, NodeId};

/// What happens to the dragged tile once it has been dropped somewhere.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DropBehavior {
    /// The dropped tile is a copy; the original stays where it was.
    #[default]
    Copy,
    /// The original is removed after a successful drop. Dropping a tile onto
    /// itself does nothing.
    Move,
}

#[derive(Debug, Clone)]
pub struct DragState {
    /// The leaf being dragged.
    pub leaf: NodeId,
    /// Where the dragged leaf sat when the drag started.
    pub origin: Rect,
    /// Pointer displacement accumulated since the drag started.
    pub offset: (i32, i32),
    pub target: Option<NodeId>,
    pub position: Option<InsertPosition>,
    last_pointer: Option<(u16, u16)>,
}

impl DragState {
    fn new(leaf: NodeId, origin: Rect) -> Self {
        Self {
            leaf,
            origin,
            offset: (0, 0),
            target: None,
            position: None,
            last_pointer: None,
        }
    }

    /// The cell under the pointer: the origin's center moved by the offset.
    /// Saturates instead of wrapping on extreme offsets.
    pub fn pointer(&self) -> (i32, i32) {
        let center_x = i32::from(self.origin.x) + i32::from(self.origin.width / 2);
        let center_y = i32::from(self.origin.y) + i32::from(self.origin.height / 2);
        (
            center_x.saturating_add(self.offset.0),
            center_y.saturating_add(self.offset.1),
        )
    }
}

/// Pick the drop position from how far the pointer moved away from the
/// center of the dragged tile. Leaving the tile through a side edge selects
/// that side; staying inside selects [`InsertPosition::Replace`].
pub fn drop_position(origin: Rect, dx: i32, dy: i32) -> InsertPosition {
    // Doubled to compare against the full extent instead of a halved one.
    let (dx2, dy2) = (i64::from(dx) * 2, i64::from(dy) * 2);
    let width = i64::from(origin.width);
    let height = i64::from(origin.height);
    if dx2 < -width {
        InsertPosition::Left
    } else if dx2 > width {
        InsertPosition::Right
    } else if dy2 < -height {
        InsertPosition::Top
    } else if dy2 > height {
        InsertPosition::Bottom
    } else {
        InsertPosition::Replace
    }
}

/// Owns the current layout and turns button clicks and drag gestures into
/// tree rewrites.
///
/// States: idle (no [`DragState`]) and dragging. Every completed action
/// replaces the root in one assignment and compacts the arena so discarded
/// layouts do not pile up.
#[derive(Debug)]
pub struct TileController<R: Rng = SmallRng> {
    tree: LayoutTree,
    root: NodeId,
    area: Rect,
    drag: Option<DragState>,
    drop_behavior: DropBehavior,
    rng: R,
}

impl TileController<SmallRng> {
    pub fn new(area: Rect) -> Self {
        Self::with_rng(area, SmallRng::from_os_rng())
    }

    /// Deterministic tile colors, for replays and tests.
    pub fn seeded(area: Rect, seed: u64) -> Self {
        Self::with_rng(area, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TileController<R> {
    pub fn with_rng(area: Rect, mut rng: R) -> Self {
        let (tree, root) = LayoutTree::with_root(&mut rng);
        Self {
            tree,
            root,
            area,
            drag: None,
            drop_behavior: DropBehavior::default(),
            rng,
        }
    }

    pub fn with_drop_behavior(mut self, drop_behavior: DropBehavior) -> Self {
        self.drop_behavior = drop_behavior;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn drop_behavior(&self) -> DropBehavior {
        self.drop_behavior
    }

    pub fn regions(&self) -> Vec<(NodeId, Rect)> {
        self.tree.walk(self.root, self.area)
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.tree.leaves(self.root)
    }

    pub fn leaf_at(&self, column: u16, row: u16) -> Option<(NodeId, Rect)> {
        self.tree.leaf_at(self.root, self.area, column, row)
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The hovered leaf and drop position recorded by the last movement.
    pub fn hovered(&self) -> Option<(NodeId, InsertPosition)> {
        let drag = self.drag.as_ref()?;
        Some((drag.target?, drag.position?))
    }

    pub fn split_leaf(&mut self, leaf: NodeId, is_vertical: bool) -> bool {
        let next = self.tree.split(self.root, leaf, is_vertical, &mut self.rng);
        self.commit(next)
    }

    pub fn remove_leaf(&mut self, leaf: NodeId) -> bool {
        let next = self.tree.remove_node(self.root, leaf);
        self.commit(next)
    }

    /// Drop `dragging` onto `target` without going through a gesture. Honors
    /// the configured [`DropBehavior`].
    pub fn insert_relative(
        &mut self,
        target: NodeId,
        dragging: NodeId,
        position: InsertPosition,
    ) -> bool {
        if self.drop_behavior == DropBehavior::Move && target == dragging {
            return false;
        }
        let mut next = self
            .tree
            .insert_relative(self.root, target, dragging, position);
        if next != self.root && self.drop_behavior == DropBehavior::Move {
            next = self.tree.remove_node(next, dragging);
        }
        self.commit(next)
    }

    pub fn on_drag_start(&mut self, leaf: NodeId) -> bool {
        let Some((_, origin)) = self.regions().into_iter().find(|(id, _)| *id == leaf) else {
            return false;
        };
        tracing::debug!(leaf = ?leaf, ?origin, "drag started");
        self.drag = Some(DragState::new(leaf, origin));
        true
    }

    /// Move the pointer by `(dx, dy)` cells and re-resolve the hovered leaf
    /// and drop position. Ignored while idle.
    pub fn on_drag(&mut self, dx: i32, dy: i32) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.offset.0 = drag.offset.0.saturating_add(dx);
        drag.offset.1 = drag.offset.1.saturating_add(dy);
        let (column, row) = drag.pointer();
        let hovered = match (u16::try_from(column), u16::try_from(row)) {
            (Ok(column), Ok(row)) => self.tree.leaf_at(self.root, self.area, column, row),
            _ => None,
        };
        drag.target = hovered.map(|(id, _)| id);
        drag.position = hovered.map(|_| drop_position(drag.origin, drag.offset.0, drag.offset.1));
    }

    /// Finish the gesture. Inserts the dragged tile at the recorded target
    /// when there is one; the controller is idle afterwards either way.
    pub fn on_drag_end(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let (Some(target), Some(position)) = (drag.target, drag.position) else {
            tracing::debug!(leaf = ?drag.leaf, "drag ended without a drop target");
            return false;
        };
        tracing::debug!(leaf = ?drag.leaf, target_node = ?target, %position, "dropping tile");
        self.insert_relative(target, drag.leaf, position)
    }

    pub fn on_drag_cancel(&mut self) {
        if let Some(drag) = self.drag.as_mut() {
            drag.target = None;
            drag.position = None;
        }
    }

    /// Feed a terminal event through the drag state machine. Returns `true`
    /// when the event was consumed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.code == KeyCode::Esc && self.drag.is_some() => {
                self.on_drag_cancel();
                true
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    let Some((leaf, _)) = self.leaf_at(mouse.column, mouse.row) else {
                        return false;
                    };
                    if !self.on_drag_start(leaf) {
                        return false;
                    }
                    if let Some(drag) = self.drag.as_mut() {
                        drag.last_pointer = Some((mouse.column, mouse.row));
                    }
                    true
                }
                MouseEventKind::Drag(MouseButton::Left) => {
                    let Some(drag) = self.drag.as_mut() else {
                        return false;
                    };
                    let (last_col, last_row) =
                        drag.last_pointer.unwrap_or((mouse.column, mouse.row));
                    drag.last_pointer = Some((mouse.column, mouse.row));
                    let dx = mouse.column as i32 - last_col as i32;
                    let dy = mouse.row as i32 - last_row as i32;
                    self.on_drag(dx, dy);
                    true
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    if self.drag.is_none() {
                        return false;
                    }
                    self.on_drag_end();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn commit(&mut self, next: NodeId) -> bool {
        if next == self.root {
            return false;
        }
        self.root = next;
        self.tree.retain_reachable(&[self.root]);
        tracing::debug!(
            leaves = self.tree.leaf_count(self.root),
            nodes = self.tree.len(),
            "layout committed"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn area() -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: 40,
            height: 20,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    /// Two side-by-side tiles: `[left | right]`.
    fn two_tiles() -> (TileController, NodeId, NodeId) {
        let mut controller = TileController::seeded(area(), 11);
        let root = controller.root();
        assert!(controller.split_leaf(root, true));
        let leaves = controller.leaves();
        (controller, leaves[0], leaves[1])
    }

    #[test]
    fn drop_position_edges() {
        let origin = Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 6,
        };
        assert_eq!(drop_position(origin, 0, 0), InsertPosition::Replace);
        assert_eq!(drop_position(origin, 5, 0), InsertPosition::Replace);
        assert_eq!(drop_position(origin, 6, 0), InsertPosition::Right);
        assert_eq!(drop_position(origin, -6, 0), InsertPosition::Left);
        assert_eq!(drop_position(origin, 0, -4), InsertPosition::Top);
        assert_eq!(drop_position(origin, 0, 4), InsertPosition::Bottom);
        // Horizontal displacement wins over vertical.
        assert_eq!(drop_position(origin, -6, 4), InsertPosition::Left);
    }

    #[test]
    fn extreme_offsets_saturate() {
        let (mut controller, left, _) = two_tiles();
        let root = controller.root();
        assert!(controller.on_drag_start(left));
        controller.on_drag(i32::MAX, 0);
        controller.on_drag(i32::MAX, 0);
        assert_eq!(controller.drag().map(|d| d.offset), Some((i32::MAX, 0)));
        assert_eq!(controller.hovered(), None);

        controller.on_drag(i32::MIN, i32::MIN);
        controller.on_drag(i32::MIN, i32::MIN);
        assert_eq!(controller.hovered(), None);
        assert!(!controller.on_drag_end());
        assert_eq!(controller.root(), root);

        let origin = area();
        assert_eq!(drop_position(origin, i32::MAX, 0), InsertPosition::Right);
        assert_eq!(drop_position(origin, i32::MIN, 0), InsertPosition::Left);
        assert_eq!(drop_position(origin, 0, i32::MIN), InsertPosition::Top);
    }

    #[test]
    fn drag_onto_neighbor_inserts_to_its_right() {
        let (mut controller, left, right) = two_tiles();
        let left_color = controller.tree().color(left);

        assert!(controller.on_drag_start(left));
        // Left tile spans columns 0..20; its center is column 10.
        controller.on_drag(20, 0);
        assert_eq!(controller.hovered(), Some((right, InsertPosition::Right)));
        assert!(controller.on_drag_end());
        assert!(!controller.is_dragging());

        let leaves = controller.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0], left);
        assert_eq!(leaves[1], right);
        assert_eq!(controller.tree().color(leaves[2]), left_color);
    }

    #[test]
    fn drag_end_without_target_is_noop() {
        let (mut controller, left, _) = two_tiles();
        let root = controller.root();
        assert!(controller.on_drag_start(left));
        controller.on_drag(-100, 0);
        assert_eq!(controller.hovered(), None);
        assert!(!controller.on_drag_end());
        assert_eq!(controller.root(), root);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn cancel_then_end_is_noop() {
        let (mut controller, left, _) = two_tiles();
        let root = controller.root();
        assert!(controller.on_drag_start(left));
        controller.on_drag(20, 0);
        controller.on_drag_cancel();
        assert!(controller.is_dragging());
        assert_eq!(controller.hovered(), None);
        assert!(!controller.on_drag_end());
        assert_eq!(controller.root(), root);
    }

    #[test]
    fn drag_start_on_stale_leaf_is_rejected() {
        let (mut controller, left, right) = two_tiles();
        assert!(controller.remove_leaf(right));
        assert!(!controller.on_drag_start(right));
        assert!(controller.on_drag_start(left));
    }

    #[test]
    fn move_drop_removes_origin() {
        let (controller, left, right) = two_tiles();
        let mut controller = controller.with_drop_behavior(DropBehavior::Move);
        let left_color = controller.tree().color(left);

        assert!(controller.on_drag_start(left));
        controller.on_drag(20, 0);
        assert!(controller.on_drag_end());

        let leaves = controller.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0], right);
        assert_eq!(controller.tree().color(leaves[1]), left_color);
    }

    #[test]
    fn move_drop_onto_itself_changes_nothing() {
        let (controller, left, _) = two_tiles();
        let mut controller = controller.with_drop_behavior(DropBehavior::Move);
        let root = controller.root();
        assert!(controller.on_drag_start(left));
        controller.on_drag(1, 1);
        assert_eq!(controller.hovered(), Some((left, InsertPosition::Replace)));
        assert!(!controller.on_drag_end());
        assert_eq!(controller.root(), root);
    }

    #[test]
    fn terminal_events_drive_a_drag() {
        let (mut controller, left, right) = two_tiles();
        assert!(controller.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), 3, 5)));
        assert_eq!(controller.drag().map(|d| d.leaf), Some(left));
        assert!(controller.handle_event(&mouse(MouseEventKind::Drag(MouseButton::Left), 23, 5)));
        assert_eq!(controller.hovered(), Some((right, InsertPosition::Right)));
        assert!(controller.handle_event(&mouse(MouseEventKind::Up(MouseButton::Left), 23, 5)));
        assert_eq!(controller.leaves().len(), 3);
        assert!(!controller.handle_event(&mouse(MouseEventKind::Up(MouseButton::Left), 23, 5)));
    }

    #[test]
    fn escape_cancels_drop_target() {
        let (mut controller, left, _) = two_tiles();
        assert!(controller.on_drag_start(left));
        controller.on_drag(20, 0);
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(controller.handle_event(&esc));
        assert_eq!(controller.hovered(), None);
    }

    #[test]
    fn commit_compacts_discarded_nodes() {
        let (mut controller, left, _) = two_tiles();
        assert!(controller.split_leaf(left, false));
        assert!(controller.remove_leaf(controller.leaves()[0]));
        let root = controller.root();
        let reachable = 2 * controller.tree().leaf_count(root) - 1;
        assert_eq!(controller.tree().len(), reachable);
    }
}
