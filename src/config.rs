/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unreadable or invalid;
/// missing keys take their individual defaults.

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::geometry::Geometry;
use crate::domain::tile::Tile;
use crate::sim::spawn::SpawnPolicy;
use crate::sim::step::{LossRule, MoveRules};

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub geometry: Geometry,
    pub rules: MoveRules,
    /// Animation frames per second while a move resolves.
    pub fps: u32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig { geometry: Geometry::classic(), rules: MoveRules::default(), fps: 60, seed: None }
    }
}

impl GameConfig {
    /// Delay between two animation frames.
    pub fn frame_time(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { key, reason: reason.into() }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    motion: TomlMotion,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cols")]
    cols: usize,
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
}

#[derive(Deserialize, Debug)]
struct TomlMotion {
    #[serde(default = "default_move_vel")]
    move_vel: f64,
    #[serde(default = "default_epsilon")]
    epsilon: f64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default)]
    spawn_on_noop: bool,
    #[serde(default = "default_loss_rule")]
    loss_rule: String,
    #[serde(default = "default_four_probability")]
    four_probability: f64,
    #[serde(default = "default_initial_tiles")]
    initial_tiles: usize,
    #[serde(default = "default_initial_value")]
    initial_value: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_fps")]
    fps: u32,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_rows() -> usize { 4 }
fn default_cols() -> usize { 4 }
fn default_width() -> f64 { 800.0 }
fn default_height() -> f64 { 800.0 }
fn default_move_vel() -> f64 { 20.0 }
fn default_epsilon() -> f64 { 1e-6 }
fn default_loss_rule() -> String { "board_full".into() }
fn default_four_probability() -> f64 { 0.5 }
fn default_initial_tiles() -> usize { 2 }
fn default_initial_value() -> u32 { 2 }
fn default_fps() -> u32 { 60 }

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard {
            rows: default_rows(),
            cols: default_cols(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for TomlMotion {
    fn default() -> Self {
        TomlMotion { move_vel: default_move_vel(), epsilon: default_epsilon() }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            spawn_on_noop: false,
            loss_rule: default_loss_rule(),
            four_probability: default_four_probability(),
            initial_tiles: default_initial_tiles(),
            initial_value: default_initial_value(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { fps: default_fps() }
    }
}

// ── Validation ──

/// Largest side a terminal board is laid out for.
pub const MAX_BOARD_SIDE: usize = 16;

impl TomlConfig {
    fn into_config(self) -> Result<GameConfig, ConfigError> {
        let TomlConfig { board, motion, rules, timing, general } = self;

        if board.rows < 2 {
            return Err(invalid("board.rows", format!("{} is below the minimum of 2", board.rows)));
        }
        if board.cols < 2 {
            return Err(invalid("board.cols", format!("{} is below the minimum of 2", board.cols)));
        }
        if board.rows > MAX_BOARD_SIDE {
            return Err(invalid("board.rows", format!("{} is above the maximum of {MAX_BOARD_SIDE}", board.rows)));
        }
        if board.cols > MAX_BOARD_SIDE {
            return Err(invalid("board.cols", format!("{} is above the maximum of {MAX_BOARD_SIDE}", board.cols)));
        }
        if !(board.width > 0.0) {
            return Err(invalid("board.width", "must be positive"));
        }
        if !(board.height > 0.0) {
            return Err(invalid("board.height", "must be positive"));
        }
        if !(motion.move_vel > 0.0) {
            return Err(invalid("motion.move_vel", "must be positive"));
        }
        if !(motion.epsilon > 0.0 && motion.epsilon < motion.move_vel) {
            return Err(invalid("motion.epsilon", "must lie between 0 and move_vel"));
        }

        let geometry = Geometry {
            rows: board.rows,
            cols: board.cols,
            cell_width: board.width / board.cols as f64,
            cell_height: board.height / board.rows as f64,
            step: motion.move_vel,
            epsilon: motion.epsilon,
        };
        check_step_divides("board.width", geometry.cell_width, &geometry)?;
        check_step_divides("board.height", geometry.cell_height, &geometry)?;

        let loss_rule = match rules.loss_rule.as_str() {
            "board_full" => LossRule::BoardFull,
            "no_moves" => LossRule::NoMoves,
            other => {
                return Err(invalid("rules.loss_rule", format!("unknown rule {other:?}, expected \"board_full\" or \"no_moves\"")));
            }
        };
        if !(0.0..=1.0).contains(&rules.four_probability) {
            return Err(invalid("rules.four_probability", "must lie in [0, 1]"));
        }
        if rules.initial_tiles > geometry.cell_count() {
            return Err(invalid(
                "rules.initial_tiles",
                format!("{} tiles do not fit on {} cells", rules.initial_tiles, geometry.cell_count()),
            ));
        }
        if !Tile::is_valid_value(rules.initial_value) {
            return Err(invalid("rules.initial_value", format!("{} is not a power of two >= 2", rules.initial_value)));
        }
        if timing.fps == 0 {
            return Err(invalid("timing.fps", "must be at least 1"));
        }

        Ok(GameConfig {
            geometry,
            rules: MoveRules {
                spawn: SpawnPolicy {
                    four_probability: rules.four_probability,
                    initial_tiles: rules.initial_tiles,
                    initial_value: rules.initial_value,
                },
                spawn_on_noop: rules.spawn_on_noop,
                loss_rule,
            },
            fps: timing.fps,
            seed: general.seed,
        })
    }
}

/// Settled tiles only land on cell origins if a cell is a whole number
/// of steps.
fn check_step_divides(key: &'static str, extent: f64, geometry: &Geometry) -> Result<(), ConfigError> {
    let steps = (extent / geometry.step).round();
    if steps < 1.0 || (steps * geometry.step - extent).abs() > geometry.epsilon {
        return Err(invalid(
            key,
            format!("cell extent {extent} is not a whole multiple of move_vel {}", geometry.step),
        ));
    }
    Ok(())
}

// ── Loading ──

impl GameConfig {
    /// Parse and validate a config document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str::<TomlConfig>(text)?.into_config()
    }

    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    return match GameConfig::from_toml_str(&text) {
                        Ok(cfg) => {
                            info!("loaded {}", path.display());
                            cfg
                        }
                        Err(e) => {
                            warn!("{}: {e}; using default settings", path.display());
                            GameConfig::default()
                        }
                    };
                }
                Err(e) => warn!("could not read {}: {e}", path.display()),
            }
        }
        GameConfig::default()
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its config.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_classic_game() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.geometry, Geometry::classic());
        assert_eq!(cfg.frame_time(), Duration::from_millis(16));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [board]
            rows = 5
            width = 1200

            [rules]
            loss_rule = "no_moves"
            spawn_on_noop = true

            [general]
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(cfg.geometry.rows, 5);
        assert_eq!(cfg.geometry.cols, 4);
        assert_eq!(cfg.geometry.cell_width, 300.0);
        assert_eq!(cfg.geometry.cell_height, 160.0);
        assert_eq!(cfg.rules.loss_rule, LossRule::NoMoves);
        assert!(cfg.rules.spawn_on_noop);
        assert_eq!(cfg.rules.spawn.four_probability, 0.5);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.fps, 60);
    }

    #[test]
    fn float_and_integer_extents_both_parse() {
        let cfg = GameConfig::from_toml_str("[board]\nwidth = 400.0\nheight = 400").unwrap();
        assert_eq!(cfg.geometry.cell_width, 100.0);
        assert_eq!(cfg.geometry.cell_height, 100.0);
    }

    #[test]
    fn step_must_divide_cells() {
        let err = GameConfig::from_toml_str("[motion]\nmove_vel = 30").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "board.width", .. }));
        let err = GameConfig::from_toml_str("[motion]\nmove_vel = 300").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "board.width", .. }));
    }

    #[test]
    fn largest_board_is_accepted() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [board]
            rows = 16
            cols = 16
            width = 1600
            height = 1600
            "#,
        )
        .unwrap();
        assert_eq!(cfg.geometry.cell_count(), MAX_BOARD_SIDE * MAX_BOARD_SIDE);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            ("[board]\nrows = 1", "board.rows"),
            ("[board]\ncols = 0", "board.cols"),
            ("[board]\nrows = 17", "board.rows"),
            ("[board]\ncols = 1000000", "board.cols"),
            ("[board]\nwidth = -800", "board.width"),
            ("[motion]\nmove_vel = 0", "motion.move_vel"),
            ("[motion]\nepsilon = 0", "motion.epsilon"),
            ("[rules]\nloss_rule = \"never\"", "rules.loss_rule"),
            ("[rules]\nfour_probability = 1.5", "rules.four_probability"),
            ("[rules]\ninitial_tiles = 17", "rules.initial_tiles"),
            ("[rules]\ninitial_value = 6", "rules.initial_value"),
            ("[timing]\nfps = 0", "timing.fps"),
        ];
        for (text, expected) in cases {
            match GameConfig::from_toml_str(text) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected, "{text}"),
                other => panic!("{text}: expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(GameConfig::from_toml_str("[board\nrows = 4"), Err(ConfigError::Parse(_))));
        assert!(matches!(GameConfig::from_toml_str("[board]\nrows = \"four\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn whole_board_may_start_full() {
        let cfg = GameConfig::from_toml_str("[rules]\ninitial_tiles = 16\ninitial_value = 4").unwrap();
        assert_eq!(cfg.rules.spawn.initial_tiles, 16);
        assert_eq!(cfg.rules.spawn.initial_value, 4);
    }
}
