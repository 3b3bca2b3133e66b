/// slide2048: a 2048 merge engine whose tiles slide through continuous
/// space in fixed increments until the board settles.
///
/// - `domain`: geometry, tiles, directions
/// - `sim`: grid state, step loop, spawning, the game state machine
/// - `config`: `config.toml` loading

pub mod config;
pub mod domain;
pub mod sim;
