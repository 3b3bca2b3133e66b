/// Input state tracker.
///
/// Moves are edge-triggered: a held arrow key produces one move, not a
/// stream of them. A held key arrives as repeated presses; those are
/// folded into one hold until no press has arrived for `HOLD_TIMEOUT`.
/// Release events are ignored.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use slide2048::domain::direction::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Restart,
    Quit,
}

/// Key binding: arrows / WASD move, R restarts, Q / Esc / Ctrl+C quit.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::Move(Direction::Left)),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Command::Move(Direction::Right)),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Command::Move(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::Move(Direction::Down)),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()` call.
    fresh_presses: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.observe(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// The command for this frame. Quit wins over restart, restart over a
    /// move; of several moves the first pressed wins.
    pub fn command(&self) -> Option<Command> {
        let commands: Vec<Command> = self.fresh_presses.iter().filter_map(command_for).collect();
        commands
            .iter()
            .copied()
            .find(|c| *c == Command::Quit)
            .or_else(|| commands.iter().copied().find(|c| *c == Command::Restart))
            .or_else(|| commands.first().copied())
    }

    // ── Internal ──

    fn observe(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let was_held = self.is_held(key.code, now);
        self.last_active.insert(key.code, now);
        if !was_held {
            self.fresh_presses.push(key);
        }
    }

    fn is_held(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code).is_some_and(|t| now.duration_since(*t) < HOLD_TIMEOUT)
    }
}
