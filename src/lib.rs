pub mod color;
pub mod constants;
pub mod controller;
pub mod layout;
pub mod script;
pub mod tracing_sub;

pub use color::TileColor;
pub use controller::{DropBehavior, TileController};
pub use layout::{InsertPosition, LayoutTree, NodeId, ScreenNode};
