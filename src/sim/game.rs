/// Game: the move state machine wrapped around a `GridState`.
///
/// ## Phases
///   Idle ──apply──▶ Resolving ──settled──▶ Spawning ──▶ Idle
///                                              │
///                                              └──Lost──▶ GameOver ──reset──▶ Idle
///
/// `apply` runs one move to completion. `Resolving` and `Spawning` are
/// never stored: they exist inside `apply` and only show up in the debug
/// log, so `phase()` reports `Idle` or `GameOver`. A game that is over
/// rejects moves until `reset`.

use log::{debug, info};

use crate::domain::direction::Direction;
use crate::domain::geometry::Geometry;
use super::event::Outcome;
use super::grid::{GridError, GridState};
use super::observer::StepObserver;
use super::spawn::{self, SpawnSource};
use super::step::{self, MoveReport, MoveRules};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Resolving,
    Spawning,
    GameOver,
}

pub struct Game<S: SpawnSource> {
    geometry: Geometry,
    rules: MoveRules,
    source: S,
    grid: GridState,
    phase: Phase,
    /// Moves that changed the board since the last reset.
    moves: u32,
}

impl<S: SpawnSource> Game<S> {
    /// Start a game on a freshly initialised board.
    pub fn new(geometry: Geometry, rules: MoveRules, mut source: S) -> Result<Self, GridError> {
        let grid = spawn::initialize_grid(geometry, &rules.spawn, &mut source)?;
        info!("new game: {}x{} board, {} tiles", geometry.rows, geometry.cols, grid.len());
        Ok(Game { geometry, rules, source, grid, phase: Phase::Idle, moves: 0 })
    }

    /// Resume from an existing board.
    pub fn with_grid(grid: GridState, rules: MoveRules, source: S) -> Self {
        Game { geometry: *grid.geometry(), rules, source, grid, phase: Phase::Idle, moves: 0 }
    }

    /// Play one move. Rejected (unchanged board, `Lost`) once the game is over.
    pub fn apply(&mut self, direction: Direction, observer: &mut impl StepObserver) -> Result<MoveReport, GridError> {
        if self.phase == Phase::GameOver {
            return Ok(MoveReport::rejected(direction));
        }

        transition(Phase::Idle, Phase::Resolving);
        let report = step::apply_move(&mut self.grid, direction, &self.rules, &mut self.source, observer)?;
        transition(Phase::Resolving, Phase::Spawning);

        if report.changed {
            self.moves += 1;
        }
        let next = match report.outcome {
            Outcome::Continue => Phase::Idle,
            Outcome::Lost => {
                info!(
                    "game over after {} moves, best tile {}",
                    self.moves,
                    self.grid.max_value().unwrap_or(0),
                );
                Phase::GameOver
            }
        };
        transition(Phase::Spawning, next);
        self.phase = next;
        Ok(report)
    }

    /// Discard the board and start over. Valid from any phase.
    pub fn reset(&mut self) -> Result<(), GridError> {
        self.grid = spawn::initialize_grid(self.geometry, &self.rules.spawn, &mut self.source)?;
        self.phase = Phase::Idle;
        self.moves = 0;
        info!("game reset");
        Ok(())
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    #[inline]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

fn transition(from: Phase, to: Phase) {
    debug!("phase {from:?} -> {to:?}");
}
