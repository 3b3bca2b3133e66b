/// The move engine: a fixed-increment step loop that slides and merges
/// tiles in continuous space until nothing can move.
///
/// One call to `apply_move` per player input:
///   1. Resolve the direction's `MoveStrategy` once
///   2. Iterate `step` until a pass changes nothing (fixed point)
///      - each pass: sort, index cells, advance / merge / hold each tile
///      - the observer sees every pass that changed something
///   3. Snap survivors to their cells and rebuild the grid mapping
///   4. Terminal check, then spawn
///
/// Each pass is one `step`-sized advance of every free tile, so the loop
/// is both the settling algorithm and the animation clock. Outcome never
/// depends on how fast the observer consumes passes.
///
/// Neighbor lookup uses the cell index taken at the start of the pass;
/// positions and values read through it are live. A donor leaves the
/// index the moment it merges.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::domain::direction::{Direction, MoveStrategy};
use crate::domain::geometry::Cell;
use crate::domain::tile::{Tile, TileId};
use super::event::{MoveEvent, Outcome};
use super::grid::{GridError, GridState};
use super::observer::StepObserver;
use super::spawn::{self, SpawnPolicy, SpawnSource, Spawned};

// ══════════════════════════════════════════════════════════════
// Rules
// ══════════════════════════════════════════════════════════════

/// When a settled board counts as lost.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LossRule {
    /// Every cell occupied after the move, regardless of merges still
    /// available in other directions.
    #[default]
    BoardFull,
    /// Every cell occupied and no two adjacent tiles share a value.
    NoMoves,
}

impl LossRule {
    pub fn is_lost(self, grid: &GridState) -> bool {
        match self {
            LossRule::BoardFull => grid.is_full(),
            LossRule::NoMoves => grid.is_full() && !grid.has_moves(),
        }
    }
}

/// Rules applied after the step loop settles.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct MoveRules {
    pub spawn: SpawnPolicy,
    /// Spawn even when the direction moved nothing.
    pub spawn_on_noop: bool,
    pub loss_rule: LossRule,
}

// ══════════════════════════════════════════════════════════════
// Reports
// ══════════════════════════════════════════════════════════════

/// Result of the step loop alone.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    /// At least one tile slid or merged.
    pub changed: bool,
    /// Passes that changed something (animation frames).
    pub iterations: usize,
    pub merges: usize,
    pub events: Vec<MoveEvent>,
}

/// Result of a full move: step loop, terminal check and spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveReport {
    pub direction: Direction,
    pub outcome: Outcome,
    pub changed: bool,
    pub iterations: usize,
    pub merges: usize,
    pub spawned: Option<Spawned>,
    pub events: Vec<MoveEvent>,
}

impl MoveReport {
    /// A move that was not attempted (game already over).
    pub fn rejected(direction: Direction) -> Self {
        MoveReport {
            direction,
            outcome: Outcome::Lost,
            changed: false,
            iterations: 0,
            merges: 0,
            spawned: None,
            events: vec![],
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Entry points
// ══════════════════════════════════════════════════════════════

/// Resolve one player move: slide, merge, settle, then spawn or signal loss.
///
/// A direction that moves nothing leaves the grid untouched and returns
/// `Continue` unless `rules.spawn_on_noop` is set. A board that is lost
/// per `rules.loss_rule` gets no spawn.
pub fn apply_move(
    grid: &mut GridState,
    direction: Direction,
    rules: &MoveRules,
    source: &mut impl SpawnSource,
    observer: &mut impl StepObserver,
) -> Result<MoveReport, GridError> {
    let settlement = settle(grid, direction, observer)?;
    let mut events = settlement.events;
    let mut spawned = None;

    let outcome = if rules.loss_rule.is_lost(grid) {
        events.push(MoveEvent::BoardFull);
        Outcome::Lost
    } else if grid.is_full() || (!settlement.changed && !rules.spawn_on_noop) {
        Outcome::Continue
    } else {
        let s = spawn::spawn_tile(grid, &rules.spawn, source)?;
        events.push(MoveEvent::Spawned { id: s.id, cell: s.cell, value: s.value });
        spawned = Some(s);
        Outcome::Continue
    };

    debug!(
        "move {direction}: {} iterations, {} merges, {} tiles, {outcome:?}",
        settlement.iterations, settlement.merges, grid.len(),
    );

    Ok(MoveReport {
        direction,
        outcome,
        changed: settlement.changed,
        iterations: settlement.iterations,
        merges: settlement.merges,
        spawned,
        events,
    })
}

/// Run the step loop to its fixed point and rebuild the grid from the
/// survivors. Does not spawn.
///
/// On error the grid is left as it was before the call.
pub fn settle(
    grid: &mut GridState,
    direction: Direction,
    observer: &mut impl StepObserver,
) -> Result<Settlement, GridError> {
    let geometry = *grid.geometry();
    let strategy = direction.strategy(&geometry);
    let limit = geometry.iteration_limit();

    let start: HashMap<TileId, Cell> = grid.tiles().map(|t| (t.id, t.cell)).collect();
    let mut active = grid.snapshot();
    let mut consumed: HashSet<TileId> = HashSet::new();
    let mut merges: Vec<(TileId, TileId)> = Vec::new();
    let mut iterations = 0;

    while step(&mut active, &strategy, &mut consumed, &mut merges) {
        iterations += 1;
        if iterations > limit {
            return Err(GridError::Unsettled(limit));
        }
        observer.on_step(iterations, &active);
    }

    let mut events = Vec::with_capacity(active.len() + merges.len());
    for t in &active {
        if let Some(&from) = start.get(&t.id) {
            if from != t.cell {
                events.push(MoveEvent::Slid { id: t.id, from, to: t.cell });
            }
        }
    }
    for &(survivor, donor) in &merges {
        if let Some(t) = active.iter().find(|t| t.id == survivor) {
            events.push(MoveEvent::Merged { survivor, donor, cell: t.cell, value: t.value });
        }
    }

    grid.rebuild(active)?;

    Ok(Settlement { changed: iterations > 0, iterations, merges: merges.len(), events })
}

// ══════════════════════════════════════════════════════════════
// One pass
// ══════════════════════════════════════════════════════════════

/// Advance the active set by one iteration. Returns true if any tile
/// moved or merged.
///
/// Per tile, in settle order:
///   - at the wall                       → hold
///   - nothing ahead                     → advance
///   - equal value, neither consumed     → advance while closing, else merge
///   - room before the neighbor          → advance
///   - otherwise                         → hold
fn step(
    active: &mut Vec<Tile>,
    strategy: &MoveStrategy,
    consumed: &mut HashSet<TileId>,
    merges: &mut Vec<(TileId, TileId)>,
) -> bool {
    active.sort_by(|a, b| strategy.settle_order(a, b));

    let mut index: HashMap<Cell, Vec<usize>> = HashMap::with_capacity(active.len());
    for (i, t) in active.iter().enumerate() {
        index.entry(t.cell).or_default().push(i);
    }

    let (dx, dy) = strategy.displacement();
    let mut removed = vec![false; active.len()];
    let mut changed = false;

    for i in 0..active.len() {
        let tile = active[i];
        if strategy.at_boundary(tile.cell) {
            continue;
        }

        let advance = match neighbor(active, &index, &removed, strategy, i) {
            None => true,
            Some(j) => {
                let next = active[j];
                let gap = strategy.gap(tile.pos, next.pos);
                if next.value == tile.value && !consumed.contains(&tile.id) && !consumed.contains(&next.id) {
                    if strategy.still_closing(gap) {
                        true
                    } else {
                        active[j].value *= 2;
                        consumed.insert(next.id);
                        merges.push((next.id, tile.id));
                        removed[i] = true;
                        changed = true;
                        continue;
                    }
                } else {
                    strategy.has_room(gap)
                }
            }
        };

        if advance {
            let t = &mut active[i];
            t.advance(dx, dy);
            t.cell = strategy.snap(t.cell, t.pos);
            changed = true;
        }
    }

    if removed.iter().any(|&r| r) {
        let mut flags = removed.into_iter();
        active.retain(|_| !flags.next().unwrap_or(false));
    }

    changed
}

/// The nearest tile ahead of `active[i]`: indexed under the adjacent cell
/// toward the wall, or under its own cell but strictly ahead in
/// continuous space (two tiles can share a derived cell mid-animation).
fn neighbor(
    active: &[Tile],
    index: &HashMap<Cell, Vec<usize>>,
    removed: &[bool],
    strategy: &MoveStrategy,
    i: usize,
) -> Option<usize> {
    let tile = &active[i];
    let own = index.get(&tile.cell).into_iter().flatten();
    let ahead = strategy.ahead(tile.cell).and_then(|c| index.get(&c)).into_iter().flatten();

    own.chain(ahead)
        .copied()
        .filter(|&j| j != i && !removed[j])
        .map(|j| (j, strategy.gap(tile.pos, active[j].pos)))
        .filter(|&(_, gap)| gap > 0.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(j, _)| j)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
