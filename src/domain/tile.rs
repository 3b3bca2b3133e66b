/// Numbered tiles.
/// A tile carries both its discrete cell and its continuous position;
/// while a move is in progress the position is primary and the cell is
/// derived from it, at rest the position is exactly the cell origin.

use std::fmt;

use super::geometry::{Cell, Geometry, Position};

/// Identity of a tile within one grid. Survives slides and merges
/// (the survivor keeps its id, the donor's id disappears).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TileId(pub u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub cell: Cell,
    pub pos: Position,
}

impl Tile {
    /// A settled tile at `cell`.
    pub fn new(id: TileId, value: u32, cell: Cell, geometry: &Geometry) -> Self {
        Tile { id, value, cell, pos: geometry.origin_of(cell) }
    }

    /// Valid tile values are powers of two, at least 2.
    #[inline]
    pub fn is_valid_value(value: u32) -> bool {
        value >= 2 && value.is_power_of_two()
    }

    /// log2 of the value: 1 for a 2, 2 for a 4, ...
    #[inline]
    pub fn exponent(&self) -> u32 {
        self.value.trailing_zeros()
    }

    /// Is the continuous position exactly on the cell origin?
    pub fn is_settled(&self, geometry: &Geometry) -> bool {
        let origin = geometry.origin_of(self.cell);
        (self.pos.x - origin.x).abs() <= geometry.epsilon
            && (self.pos.y - origin.y).abs() <= geometry.epsilon
    }

    #[inline]
    pub fn advance(&mut self, dx: f64, dy: f64) {
        self.pos.x += dx;
        self.pos.y += dy;
    }

    /// Snap the continuous position back onto the cell origin.
    pub fn settle(&mut self, geometry: &Geometry) {
        self.pos = geometry.origin_of(self.cell);
    }
}
