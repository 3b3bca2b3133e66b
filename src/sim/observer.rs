/// Render hook for the step loop.
///
/// The step loop calls `on_step` once after every iteration in which
/// something moved, with the live tile set (continuous positions). The
/// engine never depends on what the observer does with it; a terminal
/// observer draws and sleeps a frame, tests record or ignore.

use crate::domain::tile::Tile;

pub trait StepObserver {
    fn on_step(&mut self, iteration: usize, tiles: &[Tile]);
}

/// Observer that ignores every step.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn on_step(&mut self, _iteration: usize, _tiles: &[Tile]) {}
}

impl<F> StepObserver for F
where
    F: FnMut(usize, &[Tile]),
{
    fn on_step(&mut self, iteration: usize, tiles: &[Tile]) {
        self(iteration, tiles)
    }
}
