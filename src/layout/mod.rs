pub mod tiling;
pub mod tree;

pub use tiling::*;
pub use tree::{LayoutTree, NodeId, ScreenNode, Shape};

use ratatui::layout::Position;
use ratatui::prelude::Rect;

/// Bisect `area` along one axis. The first half gets the floor of the
/// halved length and the second the remainder, so the two always add up to
/// the original.
pub fn halve(area: Rect, is_vertical: bool) -> (Rect, Rect) {
    if is_vertical {
        let first = area.width / 2;
        (
            Rect {
                width: first,
                ..area
            },
            Rect {
                x: area.x.saturating_add(first),
                width: area.width - first,
                ..area
            },
        )
    } else {
        let first = area.height / 2;
        (
            Rect {
                height: first,
                ..area
            },
            Rect {
                y: area.y.saturating_add(first),
                height: area.height - first,
                ..area
            },
        )
    }
}

/// Whether the cell at `(column, row)` lies inside `rect`. Empty rectangles
/// contain nothing.
pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    rect.contains(Position::new(column, row))
}
