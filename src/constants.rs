//! Shared crate-wide constants.

use crate::color::TileColor;

/// Color of the placeholder tile left behind when the last tile is removed.
pub const EMPTY_TILE_COLOR: TileColor = TileColor::new(255, 255, 255);

/// Canvas width used by the command-line driver when none is given.
///
/// Units: terminal columns.
pub const DEFAULT_CANVAS_WIDTH: u16 = 120;

/// Canvas height used by the command-line driver when none is given.
///
/// Units: terminal rows.
pub const DEFAULT_CANVAS_HEIGHT: u16 = 40;
