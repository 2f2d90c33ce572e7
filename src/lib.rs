//! # Emberfall
//!
//! A real-time 2D action-RPG runtime with procedural chunked worlds,
//! fog-of-war and phase-driven boss AI.
//!
//! ## Architecture Overview
//!
//! Emberfall is split into a handful of cooperating systems:
//!
//! - **Generation**: seeded noise fields, region-smoothed terrain, water/river/lava
//!   overlays and per-chunk encounter placement
//! - **Game**: chunk storage, visibility, the fixed-timestep clock and the
//!   `GameState` orchestrator that owns every combatant
//! - **Combat**: the combatant state machine, enemy AI and boss AI built on a
//!   data-driven catalog of kind profiles
//! - **Rendering / Input**: thin macroquad adapters around the simulation
//!
//! The simulation is single-threaded. `GameState::tick` is the only place that
//! mutates the world, so nothing here needs locking.

pub mod combat;
pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;

// Core module re-exports
pub use combat::*;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;

/// Core error type for the Emberfall runtime.
#[derive(thiserror::Error, Debug)]
pub enum EmberfallError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Configuration could not be used even after clamping
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A chunk could not be produced by the active map source
    #[error("Chunk ({x}, {y}) is unavailable")]
    ChunkUnavailable { x: i32, y: i32 },

    /// A catalog lookup named a kind that has no profile
    #[error("Unknown combatant kind: {0}")]
    UnknownKind(String),
}

/// Result type used throughout the Emberfall codebase.
pub type EmberfallResult<T> = Result<T, EmberfallError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime constants.
pub mod config {
    /// Width of one tile in world units
    pub const TILE_SIZE: f32 = 32.0;

    /// Default chunk edge length in tiles
    pub const DEFAULT_CHUNK_SIZE: u32 = 32;

    /// Smallest chunk edge a config may request
    pub const MIN_CHUNK_SIZE: u32 = 4;

    /// Largest chunk edge a config may request
    pub const MAX_CHUNK_SIZE: u32 = 256;

    /// Default world edge length in chunks
    pub const DEFAULT_WORLD_CHUNKS: u32 = 16;

    /// Simulation ticks per second
    pub const TARGET_TPS: u32 = 60;

    /// Longest real frame the clock will accept, in seconds
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Most simulation ticks a single frame may run
    pub const MAX_TICKS_PER_FRAME: u32 = 8;

    /// Default fog-of-war radius in tiles
    pub const VISIBILITY_RADIUS: i32 = 10;

    /// Tiles within this radius are always visible
    pub const NEAR_VISIBILITY_RADIUS: i32 = 3;

    /// Horizontal delta below which combatants keep their facing
    pub const FACING_DEADZONE: f32 = 4.0;

    /// Chunks generated around the player in each direction
    pub const CHUNK_LOAD_RADIUS: i32 = 1;

    /// Player starting health
    pub const DEFAULT_PLAYER_HEALTH: i32 = 100;

    /// Player move speed in world units per second
    pub const PLAYER_MOVE_SPEED: f32 = 140.0;

    /// Maximum enemies alive in the world at once
    pub const MAX_ENEMIES: usize = 256;
}
