/// Move directions and the per-direction policy bundle the step loop runs on.
///
/// A `Direction` is resolved once per move into a `MoveStrategy`; the
/// step loop never branches on the direction itself.
///
/// ## Policy table
/// ┌───────┬──────┬──────┬────────────┬──────────┬──────────┐
/// │ Dir   │ Axis │ Sign │ Sort       │ Boundary │ Rounding │
/// ├───────┼──────┼──────┼────────────┼──────────┼──────────┤
/// │ Left  │ col  │  -1  │ ascending  │ col == 0 │ ceil     │
/// │ Right │ col  │  +1  │ descending │ col == n │ floor    │
/// │ Up    │ row  │  -1  │ ascending  │ row == 0 │ ceil     │
/// │ Down  │ row  │  +1  │ descending │ row == n │ floor    │
/// └───────┴──────┴──────┴────────────┴──────────┴──────────┘
///
/// Both rounding modes keep a moving tile in the cell it is leaving until
/// it fully arrives in the next one.

use std::cmp::Ordering;
use std::fmt;

use super::geometry::{Cell, Geometry, Position};
use super::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Col,
            Direction::Up | Direction::Down => Axis::Row,
        }
    }

    /// -1 toward decreasing index, +1 toward increasing index.
    pub fn sign(self) -> i8 {
        match self {
            Direction::Left | Direction::Up => -1,
            Direction::Right | Direction::Down => 1,
        }
    }

    pub fn rounding(self) -> Rounding {
        if self.sign() < 0 { Rounding::Ceil } else { Rounding::Floor }
    }

    /// Resolve the full policy bundle for this direction on `geometry`.
    pub fn strategy(self, geometry: &Geometry) -> MoveStrategy {
        let axis = self.axis();
        let (extent, len) = match axis {
            Axis::Col => (geometry.cell_width, geometry.cols),
            Axis::Row => (geometry.cell_height, geometry.rows),
        };
        let sign = self.sign();
        MoveStrategy {
            direction: self,
            axis,
            sign,
            descending: sign > 0,
            rounding: self.rounding(),
            step: geometry.step,
            extent,
            epsilon: geometry.epsilon,
            edge: if sign < 0 { 0 } else { len.saturating_sub(1) },
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// Primary axis of a move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Row,
    Col,
}

/// How a continuous coordinate is converted back to a cell index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Ceil,
    Floor,
}

/// Everything the step loop needs to know about one direction, with the
/// geometry constants folded in.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MoveStrategy {
    pub direction: Direction,
    pub axis: Axis,
    pub sign: i8,
    /// Process tiles from the highest primary index down (right/down).
    pub descending: bool,
    pub rounding: Rounding,
    pub step: f64,
    /// Cell size along the primary axis.
    pub extent: f64,
    pub epsilon: f64,
    /// Primary-axis index of the wall tiles travel toward.
    pub edge: usize,
}

impl MoveStrategy {
    /// Primary-axis cell index.
    #[inline]
    pub fn index_of(&self, cell: Cell) -> usize {
        match self.axis {
            Axis::Col => cell.col,
            Axis::Row => cell.row,
        }
    }

    /// Primary-axis continuous coordinate.
    #[inline]
    pub fn coord_of(&self, pos: Position) -> f64 {
        match self.axis {
            Axis::Col => pos.x,
            Axis::Row => pos.y,
        }
    }

    /// Processing order: tiles nearest the wall first, so they anchor the
    /// ones trailing behind. Ties within a cell (mid-animation only) go
    /// to the tile further along the direction of travel.
    pub fn settle_order(&self, a: &Tile, b: &Tile) -> Ordering {
        let ord = self
            .index_of(a.cell)
            .cmp(&self.index_of(b.cell))
            .then_with(|| self.coord_of(a.pos).total_cmp(&self.coord_of(b.pos)));
        if self.descending { ord.reverse() } else { ord }
    }

    /// Is the tile already in the extreme cell in the direction of travel?
    #[inline]
    pub fn at_boundary(&self, cell: Cell) -> bool {
        self.index_of(cell) == self.edge
    }

    /// The adjacent cell one step closer to the wall.
    pub fn ahead(&self, cell: Cell) -> Option<Cell> {
        if self.at_boundary(cell) {
            return None;
        }
        let next = if self.sign < 0 { self.index_of(cell) - 1 } else { self.index_of(cell) + 1 };
        Some(match self.axis {
            Axis::Col => Cell::new(cell.row, next),
            Axis::Row => Cell::new(next, cell.col),
        })
    }

    /// Distance from `tile` to `next` measured along the direction of
    /// travel. Positive when `next` is ahead.
    #[inline]
    pub fn gap(&self, tile: Position, next: Position) -> f64 {
        (self.coord_of(next) - self.coord_of(tile)) * f64::from(self.sign)
    }

    /// Merge-eligibility: the pair is not adjacent yet, keep closing.
    #[inline]
    pub fn still_closing(&self, gap: f64) -> bool {
        gap > self.step + self.epsilon
    }

    /// Free-slide: there is open space before the tile would touch `next`.
    #[inline]
    pub fn has_room(&self, gap: f64) -> bool {
        gap > self.extent + self.step + self.epsilon
    }

    /// Per-iteration displacement as `(dx, dy)`.
    pub fn displacement(&self) -> (f64, f64) {
        let d = self.step * f64::from(self.sign);
        match self.axis {
            Axis::Col => (d, 0.0),
            Axis::Row => (0.0, d),
        }
    }

    /// Recompute the cell a tile belongs to after it moved, using the
    /// direction's rounding mode. Only the primary axis changes.
    pub fn snap(&self, cell: Cell, pos: Position) -> Cell {
        let q = self.coord_of(pos) / self.extent;
        let index = match self.rounding {
            Rounding::Ceil => (q - self.epsilon).ceil(),
            Rounding::Floor => (q + self.epsilon).floor(),
        };
        let index = index.max(0.0) as usize;
        match self.axis {
            Axis::Col => Cell::new(cell.row, index),
            Axis::Row => Cell::new(index, cell.col),
        }
    }
}
