/// Entry point and game loop.

mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use env_logger::{Env, Target};
use log::{error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use slide2048::config::GameConfig;
use slide2048::sim::game::Game;
use slide2048::sim::spawn::SpawnSource;
use ui::input::{Command, InputState};
use ui::renderer::{Hud, Renderer, TerminalObserver};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    init_logging();
    let config = GameConfig::load();
    info!("starting: {}x{} board, seed {:?}", config.geometry.rows, config.geometry.cols, config.seed);

    let rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut game = match Game::new(config.geometry, config.rules, rng) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Could not start game: {e}");
            return;
        }
    };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut game, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing slide2048!");
    println!("Best tile: {}   Moves: {}", game.grid().max_value().unwrap_or(0), game.moves());
}

/// Log to a file: the terminal belongs to the alternate screen.
/// `SLIDE2048_LOG` overrides the path, `RUST_LOG` the filter.
fn init_logging() {
    let path = std::env::var_os("SLIDE2048_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("slide2048.log"));
    match File::create(&path) {
        Ok(file) => {
            env_logger::Builder::from_env(Env::default().default_filter_or("info"))
                .target(Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("Warning: could not open log file {}: {e}", path.display()),
    }
}

fn game_loop(
    game: &mut Game<ChaCha8Rng>,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();

    loop {
        input.drain_events();

        match input.command() {
            Some(Command::Quit) => break,
            Some(Command::Restart) => game.reset()?,
            Some(Command::Move(direction)) => {
                let mut observer = TerminalObserver::new(renderer, config.geometry, hud(game), config.frame_time());
                game.apply(direction, &mut observer)?;
                observer.finish()?;
            }
            None => {}
        }

        renderer.render(&config.geometry, &game.grid().snapshot(), &hud(game))?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn hud<S: SpawnSource>(game: &Game<S>) -> Hud {
    Hud {
        best: game.grid().max_value().unwrap_or(0),
        moves: game.moves(),
        game_over: game.is_over(),
    }
}
