use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use slotmap::SlotMap;

use crate::color::TileColor;

slotmap::new_key_type! {
    /// Handle to one node of a [`LayoutTree`].
    ///
    /// Rewrite operations target nodes by handle, never by value: two leaves
    /// with the same color are still two different targets.
    pub struct NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenNode {
    /// One occupied tile.
    Leaf { color: TileColor },
    /// A partition of the parent region. `is_vertical` cuts along the width
    /// (left/right panes), otherwise along the height (top/bottom panes).
    Internal {
        left: NodeId,
        right: NodeId,
        is_vertical: bool,
    },
}

/// Owned snapshot of a subtree, used to compare layouts by value and to
/// print them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Leaf(TileColor),
    Split {
        left: Box<Shape>,
        right: Box<Shape>,
        is_vertical: bool,
    },
}

impl Shape {
    pub fn leaf(color: TileColor) -> Self {
        Shape::Leaf(color)
    }

    pub fn split(left: Shape, right: Shape, is_vertical: bool) -> Self {
        Shape::Split {
            left: Box::new(left),
            right: Box::new(right),
            is_vertical,
        }
    }

    pub fn leaf_colors(&self) -> Vec<TileColor> {
        match self {
            Shape::Leaf(color) => vec![*color],
            Shape::Split { left, right, .. } => {
                let mut colors = left.leaf_colors();
                colors.extend(right.leaf_colors());
                colors
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Leaf(color) => write!(f, "{color}"),
            Shape::Split {
                left,
                right,
                is_vertical,
            } => {
                let axis = if *is_vertical { 'v' } else { 'h' };
                write!(f, "({axis} {left} {right})")
            }
        }
    }
}

/// Arena holding the nodes of one or more layout trees.
///
/// A tree is just a root [`NodeId`]. Nodes are never modified once inserted;
/// the rewrite operations allocate the rebuilt path and hand back a new root,
/// so older roots stay valid until [`LayoutTree::retain_reachable`] drops
/// them.
#[derive(Debug, Default, Clone)]
pub struct LayoutTree {
    nodes: SlotMap<NodeId, ScreenNode>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh arena holding a single randomly colored leaf.
    pub fn with_root<R: Rng + ?Sized>(rng: &mut R) -> (Self, NodeId) {
        let mut tree = Self::new();
        let root = tree.initial_root(rng);
        (tree, root)
    }

    /// Allocate the starting single-leaf tree.
    pub fn initial_root<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NodeId {
        self.leaf(TileColor::random(rng))
    }

    pub fn leaf(&mut self, color: TileColor) -> NodeId {
        self.nodes.insert(ScreenNode::Leaf { color })
    }

    /// Allocate a partition over two existing subtrees. Each subtree must
    /// belong to exactly one parent.
    pub fn internal(&mut self, left: NodeId, right: NodeId, is_vertical: bool) -> NodeId {
        debug_assert_ne!(left, right, "a subtree cannot be both children");
        self.nodes.insert(ScreenNode::Internal {
            left,
            right,
            is_vertical,
        })
    }

    pub fn node(&self, id: NodeId) -> Option<&ScreenNode> {
        self.nodes.get(id)
    }

    pub fn color(&self, id: NodeId) -> Option<TileColor> {
        match self.nodes.get(id)? {
            ScreenNode::Leaf { color } => Some(*color),
            ScreenNode::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(ScreenNode::Leaf { .. }))
    }

    pub fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.nodes.get(id)? {
            ScreenNode::Internal { left, right, .. } => Some((*left, *right)),
            ScreenNode::Leaf { .. } => None,
        }
    }

    /// Number of nodes in the arena, across every tree it holds.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, root: NodeId, id: NodeId) -> bool {
        self.path_to(root, id).is_some()
    }

    /// Leaves reachable from `root`, left to right.
    pub fn leaves(&self, root: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match self.nodes.get(id) {
                Some(ScreenNode::Leaf { .. }) => leaves.push(id),
                Some(ScreenNode::Internal { left, right, .. }) => {
                    stack.push(*right);
                    stack.push(*left);
                }
                None => {}
            }
        }
        leaves
    }

    pub fn leaf_count(&self, root: NodeId) -> usize {
        self.leaves(root).len()
    }

    /// Edges on the longest root-to-leaf path; a lone leaf has depth 0.
    pub fn depth(&self, root: NodeId) -> usize {
        match self.nodes.get(root) {
            Some(ScreenNode::Internal { left, right, .. }) => {
                1 + self.depth(*left).max(self.depth(*right))
            }
            _ => 0,
        }
    }

    pub fn shape(&self, root: NodeId) -> Option<Shape> {
        match self.nodes.get(root)? {
            ScreenNode::Leaf { color } => Some(Shape::Leaf(*color)),
            ScreenNode::Internal {
                left,
                right,
                is_vertical,
            } => Some(Shape::split(
                self.shape(*left)?,
                self.shape(*right)?,
                *is_vertical,
            )),
        }
    }

    /// Drop every node that no root in `roots` can reach. Handles to dropped
    /// nodes go stale and rewrites treat them as missing targets.
    pub fn retain_reachable(&mut self, roots: &[NodeId]) {
        let mut reachable = HashSet::new();
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some((left, right)) = self.children(id) {
                stack.push(left);
                stack.push(right);
            }
        }
        self.nodes.retain(|id, _| reachable.contains(&id));
    }

    /// Nodes from `root` down to `target`, both included.
    pub(crate) fn path_to(&self, root: NodeId, target: NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        self.collect_path(root, target, &mut path).then_some(path)
    }

    fn collect_path(&self, node: NodeId, target: NodeId, path: &mut Vec<NodeId>) -> bool {
        let Some(entry) = self.nodes.get(node) else {
            return false;
        };
        path.push(node);
        if node == target {
            return true;
        }
        if let ScreenNode::Internal { left, right, .. } = entry
            && (self.collect_path(*left, target, path) || self.collect_path(*right, target, path))
        {
            return true;
        }
        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> TileColor {
        TileColor::new(255, 0, 0)
    }

    fn blue() -> TileColor {
        TileColor::new(0, 0, 255)
    }

    #[test]
    fn leaves_are_listed_left_to_right() {
        let mut tree = LayoutTree::new();
        let a = tree.leaf(red());
        let b = tree.leaf(blue());
        let c = tree.leaf(red());
        let inner = tree.internal(b, c, false);
        let root = tree.internal(a, inner, true);

        assert_eq!(tree.leaves(root), vec![a, b, c]);
        assert_eq!(tree.leaf_count(root), 3);
        assert_eq!(tree.depth(root), 2);
        assert_eq!(tree.depth(a), 0);
    }

    #[test]
    fn equal_colors_are_distinct_nodes() {
        let mut tree = LayoutTree::new();
        let a = tree.leaf(red());
        let b = tree.leaf(red());
        let root = tree.internal(a, b, true);
        assert_ne!(a, b);
        assert_eq!(tree.node(a), tree.node(b));
        assert_eq!(tree.path_to(root, b), Some(vec![root, b]));
    }

    #[test]
    fn shape_display_nests_splits() {
        let mut tree = LayoutTree::new();
        let a = tree.leaf(red());
        let b = tree.leaf(blue());
        let root = tree.internal(a, b, true);
        let shape = tree.shape(root).expect("root exists");
        assert_eq!(shape.to_string(), "(v #ff0000 #0000ff)");
        assert_eq!(shape.leaf_colors(), vec![red(), blue()]);
    }

    #[test]
    fn retain_reachable_drops_detached_nodes() {
        let mut tree = LayoutTree::new();
        let a = tree.leaf(red());
        let b = tree.leaf(blue());
        let root = tree.internal(a, b, true);
        let orphan = tree.leaf(blue());
        assert_eq!(tree.len(), 4);

        tree.retain_reachable(&[root]);
        assert_eq!(tree.len(), 3);
        assert!(tree.node(orphan).is_none());
        assert!(tree.contains(root, b));
        assert!(!tree.contains(root, orphan));
    }
}
