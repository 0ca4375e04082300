use std::fmt;
use std::str::FromStr;

use rand::Rng;
use ratatui::prelude::Rect;
use thiserror::Error;

use super::tree::{LayoutTree, NodeId, ScreenNode};
use super::{halve, rect_contains};
use crate::color::TileColor;

/// Where a dropped tile lands relative to the tile it was dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertPosition {
    Left,
    Right,
    Top,
    Bottom,
    Replace,
}

impl InsertPosition {
    pub const ALL: [InsertPosition; 5] = [
        InsertPosition::Left,
        InsertPosition::Right,
        InsertPosition::Top,
        InsertPosition::Bottom,
        InsertPosition::Replace,
    ];
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InsertPosition::Left => "left",
            InsertPosition::Right => "right",
            InsertPosition::Top => "top",
            InsertPosition::Bottom => "bottom",
            InsertPosition::Replace => "replace",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown insert position `{0}` (expected left, right, top, bottom or replace)")]
pub struct ParsePositionError(pub String);

impl FromStr for InsertPosition {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(InsertPosition::Left),
            "right" => Ok(InsertPosition::Right),
            "top" => Ok(InsertPosition::Top),
            "bottom" => Ok(InsertPosition::Bottom),
            "replace" => Ok(InsertPosition::Replace),
            _ => Err(ParsePositionError(s.to_string())),
        }
    }
}

impl LayoutTree {
    /// Rectangle of every leaf under `root` when the tree is laid out over
    /// `area`, left to right. Nothing is cached; each call walks the tree.
    pub fn walk(&self, root: NodeId, area: Rect) -> Vec<(NodeId, Rect)> {
        let mut regions = Vec::new();
        self.walk_recursive(root, area, &mut regions);
        regions
    }

    fn walk_recursive(&self, node: NodeId, area: Rect, regions: &mut Vec<(NodeId, Rect)>) {
        match self.node(node) {
            Some(ScreenNode::Leaf { .. }) => regions.push((node, area)),
            Some(ScreenNode::Internal {
                left,
                right,
                is_vertical,
            }) => {
                let (first, second) = halve(area, *is_vertical);
                self.walk_recursive(*left, first, regions);
                self.walk_recursive(*right, second, regions);
            }
            None => {}
        }
    }

    /// The leaf whose rectangle contains the given cell.
    pub fn leaf_at(
        &self,
        root: NodeId,
        area: Rect,
        column: u16,
        row: u16,
    ) -> Option<(NodeId, Rect)> {
        self.walk(root, area)
            .into_iter()
            .find(|(_, rect)| rect_contains(*rect, column, row))
    }

    /// Replace the `target` leaf with a partition of two freshly colored
    /// leaves. Returns `root` itself when `target` is not a leaf of it.
    pub fn split<R: Rng + ?Sized>(
        &mut self,
        root: NodeId,
        target: NodeId,
        is_vertical: bool,
        rng: &mut R,
    ) -> NodeId {
        let Some(path) = self.leaf_path(root, target) else {
            tracing::trace!(target_node = ?target, "split target not in tree");
            return root;
        };
        let first = self.leaf(TileColor::random(rng));
        let second = self.leaf(TileColor::random(rng));
        let replacement = self.internal(first, second, is_vertical);
        self.rebuild_path(&path[..path.len() - 1], target, replacement)
            .unwrap_or(root)
    }

    /// Remove the `target` leaf. Its sibling takes the parent's place; a lone
    /// root leaf becomes the empty sentinel tile. Returns `root` itself when
    /// `target` is not a leaf of it.
    pub fn remove_node(&mut self, root: NodeId, target: NodeId) -> NodeId {
        let Some(path) = self.leaf_path(root, target) else {
            tracing::trace!(target_node = ?target, "remove target not in tree");
            return root;
        };
        let [ancestors @ .., parent, _] = path.as_slice() else {
            return self.leaf(TileColor::EMPTY);
        };
        let Some((left, right)) = self.children(*parent) else {
            return root;
        };
        let sibling = if left == target { right } else { left };
        self.rebuild_path(ancestors, *parent, sibling)
            .unwrap_or(root)
    }

    /// Drop a tile carrying `dragging`'s color onto the `target` leaf.
    ///
    /// The dragged leaf is only read for its color; removing it from where it
    /// came from is up to the caller. Returns `root` itself when `target` is
    /// not a leaf of it or `dragging` is not a leaf.
    pub fn insert_relative(
        &mut self,
        root: NodeId,
        target: NodeId,
        dragging: NodeId,
        position: InsertPosition,
    ) -> NodeId {
        let Some(color) = self.color(dragging) else {
            tracing::trace!(dragging = ?dragging, "dragged node is not a leaf");
            return root;
        };
        let Some(path) = self.leaf_path(root, target) else {
            tracing::trace!(target_node = ?target, "insert target not in tree");
            return root;
        };
        let inserted = self.leaf(color);
        let replacement = match position {
            InsertPosition::Left => self.internal(inserted, target, true),
            InsertPosition::Right => self.internal(target, inserted, true),
            InsertPosition::Top => self.internal(inserted, target, false),
            InsertPosition::Bottom => self.internal(target, inserted, false),
            InsertPosition::Replace => inserted,
        };
        self.rebuild_path(&path[..path.len() - 1], target, replacement)
            .unwrap_or(root)
    }

    fn leaf_path(&self, root: NodeId, target: NodeId) -> Option<Vec<NodeId>> {
        if !self.is_leaf(target) {
            return None;
        }
        self.path_to(root, target)
    }

    /// Copy every node in `ancestors` (root first) with the child on the path
    /// swapped for its replacement. Subtrees off the path are reused as-is.
    /// `None` when an ancestor is not a partition.
    fn rebuild_path(
        &mut self,
        ancestors: &[NodeId],
        old: NodeId,
        replacement: NodeId,
    ) -> Option<NodeId> {
        let mut child = old;
        let mut rebuilt = replacement;
        for &ancestor in ancestors.iter().rev() {
            let Some(ScreenNode::Internal {
                left,
                right,
                is_vertical,
            }) = self.node(ancestor).copied()
            else {
                tracing::warn!(
                    ancestor = ?ancestor,
                    "rewrite path runs through a non-partition node"
                );
                return None;
            };
            rebuilt = if left == child {
                self.internal(rebuilt, right, is_vertical)
            } else {
                self.internal(left, rebuilt, is_vertical)
            };
            child = ancestor;
        }
        Some(rebuilt)
    }
}
