/// GridState: the set of tiles on the board, keyed by cell.
///
/// ## Invariants (checked on every construction path)
///   - every key equals the stored tile's `cell`
///   - at most `rows * cols` tiles, all inside the board
///   - every value is a power of two ≥ 2
///   - at rest, every position equals its cell origin
///
/// The mapping is a `BTreeMap<Cell, Tile>`: iteration is row-major and
/// therefore deterministic, which keeps spawn selection reproducible
/// under a seeded source.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::geometry::{Cell, Geometry};
use crate::domain::tile::{Tile, TileId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("cell {0} is outside the board")]
    OutOfBounds(Cell),
    #[error("cell {0} is already occupied")]
    Occupied(Cell),
    #[error("invalid tile value {0}: must be a power of two >= 2")]
    InvalidValue(u32),
    #[error("cannot spawn: every cell is occupied")]
    BoardFull,
    #[error("move did not settle within {0} iterations")]
    Unsettled(usize),
    #[error("tiles {first} and {second} both settled on cell {cell}")]
    CellCollision { cell: Cell, first: TileId, second: TileId },
}

#[derive(Clone, Debug)]
pub struct GridState {
    geometry: Geometry,
    tiles: BTreeMap<Cell, Tile>,
    next_id: u32,
}

// ── Construction ──

impl GridState {
    /// An empty board.
    pub fn new(geometry: Geometry) -> Self {
        GridState { geometry, tiles: BTreeMap::new(), next_id: 0 }
    }

    /// Build a settled board from `(row, col, value)` triples.
    pub fn from_layout(geometry: Geometry, layout: &[(usize, usize, u32)]) -> Result<Self, GridError> {
        let mut grid = GridState::new(geometry);
        for &(row, col, value) in layout {
            grid.insert(Cell::new(row, col), value)?;
        }
        Ok(grid)
    }

    /// Place a new settled tile. Fails on a bad cell or value.
    pub fn insert(&mut self, cell: Cell, value: u32) -> Result<TileId, GridError> {
        if !self.geometry.contains(cell) {
            return Err(GridError::OutOfBounds(cell));
        }
        if !Tile::is_valid_value(value) {
            return Err(GridError::InvalidValue(value));
        }
        if self.tiles.contains_key(&cell) {
            return Err(GridError::Occupied(cell));
        }
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.insert(cell, Tile::new(id, value, cell, &self.geometry));
        Ok(id)
    }

    /// Replace the mapping with the survivors of a settled move.
    ///
    /// Positions are snapped onto their cells; two survivors on one cell
    /// is an engine bug and is reported rather than silently dropped.
    pub fn rebuild(&mut self, tiles: Vec<Tile>) -> Result<(), GridError> {
        let mut map = BTreeMap::new();
        for mut tile in tiles {
            if !self.geometry.contains(tile.cell) {
                return Err(GridError::OutOfBounds(tile.cell));
            }
            tile.settle(&self.geometry);
            if let Some(prev) = map.insert(tile.cell, tile) {
                return Err(GridError::CellCollision { cell: tile.cell, first: prev.id, second: tile.id });
            }
        }
        self.tiles = map;
        Ok(())
    }
}

// ── Queries ──

impl GridState {
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&Tile> {
        self.tiles.get(&cell)
    }

    #[inline]
    pub fn value_at(&self, row: usize, col: usize) -> Option<u32> {
        self.get(Cell::new(row, col)).map(|t| t.value)
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Owned copy of the tiles, the working set a move starts from.
    pub fn snapshot(&self) -> Vec<Tile> {
        self.tiles.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tiles.len() >= self.geometry.cell_count()
    }

    /// Unoccupied cells, row-major.
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.geometry.cells().filter(|c| !self.tiles.contains_key(c)).collect()
    }

    pub fn total_value(&self) -> u64 {
        self.tiles.values().map(|t| u64::from(t.value)).sum()
    }

    pub fn max_value(&self) -> Option<u32> {
        self.tiles.values().map(|t| t.value).max()
    }

    /// Can any direction change this board? True if a cell is empty or
    /// two orthogonally adjacent tiles hold the same value.
    pub fn has_moves(&self) -> bool {
        if !self.is_full() {
            return true;
        }
        self.tiles.values().any(|t| {
            let right = self.value_at(t.cell.row, t.cell.col + 1);
            let below = self.value_at(t.cell.row + 1, t.cell.col);
            right == Some(t.value) || below == Some(t.value)
        })
    }

    /// Is every tile resting exactly on its cell?
    pub fn is_settled(&self) -> bool {
        self.tiles.iter().all(|(cell, t)| *cell == t.cell && t.is_settled(&self.geometry))
    }

    /// Row-by-row view of the values, `None` for empty cells.
    pub fn rows(&self) -> Vec<Vec<Option<u32>>> {
        (0..self.geometry.rows)
            .map(|row| (0..self.geometry.cols).map(|col| self.value_at(row, col)).collect())
            .collect()
    }

    /// `(row, col, value)` triples in row-major order, the inverse of
    /// `from_layout`.
    pub fn layout(&self) -> Vec<(usize, usize, u32)> {
        self.tiles.values().map(|t| (t.cell.row, t.cell.col, t.value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic(layout: &[(usize, usize, u32)]) -> GridState {
        GridState::from_layout(Geometry::classic(), layout).unwrap()
    }

    #[test]
    fn layout_roundtrips_through_mapping() {
        let g = classic(&[(0, 0, 2), (3, 3, 8), (1, 2, 4)]);
        assert_eq!(g.len(), 3);
        assert_eq!(g.value_at(1, 2), Some(4));
        assert_eq!(g.layout(), vec![(0, 0, 2), (1, 2, 4), (3, 3, 8)]);
        assert!(g.is_settled());
    }

    #[test]
    fn insert_rejects_bad_input() {
        let mut g = classic(&[(0, 0, 2)]);
        assert_eq!(g.insert(Cell::new(0, 0), 2), Err(GridError::Occupied(Cell::new(0, 0))));
        assert_eq!(g.insert(Cell::new(4, 0), 2), Err(GridError::OutOfBounds(Cell::new(4, 0))));
        assert_eq!(g.insert(Cell::new(1, 1), 3), Err(GridError::InvalidValue(3)));
        assert_eq!(g.insert(Cell::new(1, 1), 1), Err(GridError::InvalidValue(1)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let g = classic(&[(0, 0, 2), (0, 1, 2), (0, 2, 2)]);
        let mut ids: Vec<TileId> = g.tiles().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn empty_cells_are_row_major_complement() {
        let g = classic(&[(0, 0, 2), (0, 1, 2)]);
        let empty = g.empty_cells();
        assert_eq!(empty.len(), 14);
        assert_eq!(empty[0], Cell::new(0, 2));
        assert_eq!(*empty.last().unwrap(), Cell::new(3, 3));
    }

    #[test]
    fn full_board_queries() {
        let values = [2, 4, 8, 16];
        let layout: Vec<_> = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c, values[(r + c) % 4])))
            .collect();
        let g = classic(&layout);
        assert!(g.is_full());
        assert!(!g.has_moves());
        assert!(g.empty_cells().is_empty());
        assert_eq!(g.max_value(), Some(16));
    }

    #[test]
    fn full_board_with_pair_still_has_moves() {
        let mut layout: Vec<_> = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c, [2, 4, 8, 16][(r + c) % 4])))
            .collect();
        // make (3,2) equal to its left neighbour (3,1)
        layout[14].2 = layout[13].2;
        let g = classic(&layout);
        assert!(g.is_full());
        assert!(g.has_moves());
    }

    #[test]
    fn rebuild_detects_collisions() {
        let g = classic(&[(0, 0, 2), (0, 1, 4)]);
        let mut tiles = g.snapshot();
        tiles[1].cell = Cell::new(0, 0);
        let mut target = g.clone();
        let err = target.rebuild(tiles).unwrap_err();
        assert!(matches!(err, GridError::CellCollision { cell, .. } if cell == Cell::new(0, 0)));
        // failed rebuild leaves the grid untouched
        assert_eq!(target.layout(), g.layout());
    }

    #[test]
    fn rebuild_snaps_positions() {
        let mut g = classic(&[(0, 1, 2)]);
        let mut tiles = g.snapshot();
        tiles[0].pos.x = 190.0;
        g.rebuild(tiles).unwrap();
        assert!(g.is_settled());
    }

    #[test]
    fn totals_and_rows() {
        let g = classic(&[(0, 0, 2), (2, 1, 8)]);
        assert_eq!(g.total_value(), 10);
        let rows = g.rows();
        assert_eq!(rows[0], vec![Some(2), None, None, None]);
        assert_eq!(rows[2][1], Some(8));
    }
}
