/// Board colors. Tile color is looked up by exponent: 2 → first entry,
/// 4 → second, and so on; values past the table reuse the last entry.

use crossterm::style::Color;

use slide2048::domain::tile::Tile;

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

const TILE_COLORS: [Color; 9] = [
    rgb(237, 229, 218),
    rgb(238, 225, 201),
    rgb(243, 178, 122),
    rgb(246, 150, 101),
    rgb(247, 124, 95),
    rgb(247, 95, 59),
    rgb(237, 208, 115),
    rgb(237, 204, 99),
    rgb(236, 202, 80),
];

/// Empty-slot fill.
pub const BACKGROUND: Color = rgb(205, 192, 180);
/// Grid lines between slots.
pub const OUTLINE: Color = rgb(187, 173, 160);
/// Tile digits.
pub const FONT: Color = rgb(119, 110, 101);
pub const OVERLAY: Color = rgb(20, 20, 20);
pub const OVERLAY_TEXT: Color = rgb(255, 255, 255);
pub const HUD: Color = rgb(200, 200, 200);
pub const HINT: Color = rgb(110, 110, 120);

pub fn tile_color(tile: &Tile) -> Color {
    let index = (tile.exponent() as usize).saturating_sub(1);
    TILE_COLORS[index.min(TILE_COLORS.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide2048::domain::geometry::{Cell, Geometry};
    use slide2048::domain::tile::TileId;

    fn color_of(value: u32) -> Color {
        tile_color(&Tile::new(TileId(0), value, Cell::new(0, 0), &Geometry::classic()))
    }

    #[test]
    fn colors_follow_exponent() {
        assert_eq!(color_of(2), rgb(237, 229, 218));
        assert_eq!(color_of(4), rgb(238, 225, 201));
        assert_eq!(color_of(512), rgb(236, 202, 80));
    }

    #[test]
    fn large_values_reuse_last_color() {
        assert_eq!(color_of(1024), color_of(512));
        assert_eq!(color_of(1 << 20), color_of(512));
    }
}
