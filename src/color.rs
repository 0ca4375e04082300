use std::fmt;

use rand::Rng;
use ratatui::style::Color;

use crate::constants::EMPTY_TILE_COLOR;

/// Display color of a tile. The layout engine never interprets it; it only
/// carries it from node to node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TileColor {
    /// Reserved color of the sentinel tile.
    pub const EMPTY: TileColor = EMPTY_TILE_COLOR;

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Draw each channel independently and uniformly from `0..=255`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            r: rng.random(),
            g: rng.random(),
            b: rng.random(),
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for TileColor {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<TileColor> for Color {
    fn from(color: TileColor) -> Self {
        Color::Rgb(color.r, color.g, color.b)
    }
}

impl fmt::Display for TileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(TileColor::new(255, 0, 16).to_string(), "#ff0010");
        assert_eq!(TileColor::EMPTY.to_string(), "#ffffff");
    }

    #[test]
    fn random_is_deterministic_for_a_seed() {
        let mut a = SmallRng::seed_from_u64(7);
        let mut b = SmallRng::seed_from_u64(7);
        assert_eq!(TileColor::random(&mut a), TileColor::random(&mut b));
    }

    #[test]
    fn converts_to_terminal_rgb() {
        let color: Color = TileColor::new(1, 2, 3).into();
        assert_eq!(color, Color::Rgb(1, 2, 3));
    }
}
