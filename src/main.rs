//! # Emberfall Main Entry Point
//!
//! Parses the command line, sets up logging, builds the game state and runs
//! the fixed-timestep macroquad loop.

use clap::{Parser, ValueEnum};
use emberfall::{
    EmberfallResult, FixedTimestep, GameConfig, GameState, InputHandler, MacroquadDisplay,
    SpriteAtlas,
};
use macroquad::prelude::*;
use std::path::{Path, PathBuf};

/// Built-in configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Default,
    Testing,
    Detailed,
}

/// Command line arguments for Emberfall.
#[derive(Parser, Debug)]
#[command(name = "emberfall")]
#[command(about = "A real-time action-RPG with procedural chunked worlds and boss fights")]
#[command(version)]
struct Args {
    /// World seed; overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset used when no config file is given
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    preset: Preset,

    /// Save file loaded at startup (if present) and written on quit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Directory holding sprite sheets named after sprite keys
    #[arg(long, default_value = "assets/sprites")]
    sprites: PathBuf,

    /// Enable development mode with debug tools
    #[arg(long)]
    dev_mode: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Emberfall".to_string(),
        window_width: 1280,
        window_height: 800,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() -> EmberfallResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    log::info!("Starting Emberfall v{}", emberfall::VERSION);

    let config = build_config(&args)?;
    run_game(&args, config).await
}

/// Initializes the logging system based on the specified log level.
///
/// `RUST_LOG` still wins when it is set.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_timestamp_millis()
            .init();
    }
}

fn build_config(args: &Args) -> EmberfallResult<GameConfig> {
    let seed = args.seed.unwrap_or(12345);
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            GameConfig::load(path)?
        }
        None => match args.preset {
            Preset::Default => GameConfig::new(seed),
            Preset::Testing => GameConfig::for_testing(seed),
            Preset::Detailed => GameConfig::for_detailed_generation(seed),
        },
    };
    if let Some(seed) = args.seed {
        config.generation.seed = seed;
    }
    Ok(config)
}

/// Runs the main game loop with macroquad graphics.
async fn run_game(args: &Args, config: GameConfig) -> EmberfallResult<()> {
    #[cfg(feature = "dev-tools")]
    let _span = tracing::info_span!("run_game", seed = config.generation.seed).entered();

    log::info!("Generating world with seed {}", config.generation.seed);
    let mut game_state = GameState::new(config)?;

    if let Some(path) = &args.save {
        load_save(&mut game_state, path);
    }

    let atlas = SpriteAtlas::load_dir(&args.sprites, &game_state.catalog.sprite_manifest()).await;
    let mut display = MacroquadDisplay::new(Box::new(atlas)).await?;
    display.show_debug = args.dev_mode;
    display.add_message("Welcome to Emberfall!".to_string());
    display.add_message("WASD/arrows to move, SPACE to attack, F3 for debug, ESC to quit".to_string());

    let input_handler = InputHandler::new();
    let mut clock = FixedTimestep::new(&game_state.config.timestep);

    loop {
        let input = input_handler.poll();
        if input.quit {
            log::info!("Player quit the game");
            break;
        }
        if input.debug_toggle {
            display.toggle_debug();
        }

        let ticks = clock.advance(get_frame_time());
        let tick_input = input.to_tick_input();
        for _ in 0..ticks {
            let events = game_state.tick(clock.dt(), &tick_input);
            display.push_events(&events);
        }

        display.render_game(&game_state)?;

        next_frame().await;
    }

    if let Some(path) = &args.save {
        std::fs::write(path, game_state.save_to_json()?)?;
        log::info!("Saved game to {}", path.display());
    }

    log::info!(
        "Game loop ended after {} ticks ({:?} of backlog dropped)",
        clock.total_ticks(),
        clock.dropped_total()
    );
    Ok(())
}

/// Restores a save if one exists. A bad save is logged and ignored.
fn load_save(game_state: &mut GameState, path: &Path) {
    if !path.exists() {
        return;
    }
    let restored = std::fs::read_to_string(path)
        .map_err(emberfall::EmberfallError::from)
        .and_then(|json| GameState::records_from_json(&json))
        .and_then(|snapshot| game_state.apply_snapshot(&snapshot));
    match restored {
        Ok(()) => log::info!("Restored save from {}", path.display()),
        Err(e) => log::warn!("Could not restore save {}: {}", path.display(), e),
    }
}
