/// Events emitted while resolving a move.
/// The presentation layer consumes these for animation and status text;
/// tests use them to check merge conservation.

use crate::domain::geometry::Cell;
use crate::domain::tile::TileId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveEvent {
    /// A surviving tile ended the move on a different cell.
    Slid { id: TileId, from: Cell, to: Cell },
    /// `donor` was absorbed into `survivor`, which now holds `value`.
    Merged { survivor: TileId, donor: TileId, cell: Cell, value: u32 },
    Spawned { id: TileId, cell: Cell, value: u32 },
    /// The settled board has no free cell: the game is lost.
    BoardFull,
}

/// Terminal signal of a move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Continue,
    Lost,
}
