/// Board geometry: discrete cells and the continuous space tiles move in.
///
/// Two coordinate systems, linked by the cell size:
///   - `Cell`:     (row, col) grid index, the key of the grid mapping
///   - `Position`: (x, y) continuous coordinate used during a move
///
/// `x` grows with the column, `y` with the row, so a settled tile at
/// `(row, col)` sits at `(col * cell_width, row * cell_height)`.

use std::fmt;

/// Grid index. Ordered row-major so maps keyed by `Cell` iterate
/// top-left to bottom-right.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Continuous coordinate of a tile's top-left corner.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// Dimensions of the board in both coordinate systems, plus the motion
/// constants the step loop advances by.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Geometry {
    pub rows: usize,
    pub cols: usize,
    /// Width of one cell in continuous units.
    pub cell_width: f64,
    /// Height of one cell in continuous units.
    pub cell_height: f64,
    /// Displacement of a moving tile per step-loop iteration.
    pub step: f64,
    /// Tolerance for gap comparisons and cell rounding.
    pub epsilon: f64,
}

impl Geometry {
    /// The classic board: 4×4 cells of 200×200 on an 800×800 surface,
    /// advancing 20 units per iteration.
    pub const fn classic() -> Self {
        Geometry {
            rows: 4,
            cols: 4,
            cell_width: 200.0,
            cell_height: 200.0,
            step: 20.0,
            epsilon: 1e-6,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Settled position of a tile occupying `cell`.
    #[inline]
    pub fn origin_of(&self, cell: Cell) -> Position {
        Position::new(
            cell.col as f64 * self.cell_width,
            cell.row as f64 * self.cell_height,
        )
    }

    /// Iterations a tile needs to cross one cell horizontally / vertically.
    pub fn steps_per_cell(&self) -> (usize, usize) {
        (
            (self.cell_width / self.step).round() as usize,
            (self.cell_height / self.step).round() as usize,
        )
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Cell::new(row, col)))
    }

    /// Upper bound on step-loop iterations for one move.
    ///
    /// Every tile travels at most `max(rows, cols)` cells and merges at
    /// most once, and a pass only counts if some tile moved or merged.
    pub fn iteration_limit(&self) -> usize {
        let (sx, sy) = self.steps_per_cell();
        let span = self.rows.max(self.cols);
        self.cell_count() * (span * sx.max(sy).max(1) + 1) + 1
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::classic()
    }
}
