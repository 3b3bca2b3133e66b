/// Pure game vocabulary: geometry, tiles, directions. No state, no I/O.

pub mod direction;
pub mod geometry;
pub mod tile;
