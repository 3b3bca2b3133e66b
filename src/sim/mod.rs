/// Board state and the move engine built on top of it.

pub mod event;
pub mod game;
pub mod grid;
pub mod observer;
pub mod spawn;
pub mod step;
