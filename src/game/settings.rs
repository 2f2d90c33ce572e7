//! # Game Configuration
//!
//! Everything tunable about a session that is not terrain generation:
//! visibility, the timestep, chunk streaming and encounter limits. Terrain
//! settings are nested as a [`GenerationConfig`].

use super::TimestepConfig;
use crate::{config, EmberfallResult, GenerationConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub generation: GenerationConfig,
    pub timestep: TimestepConfig,
    /// Sight radius in tiles
    pub visibility_radius: i32,
    /// Cells this close are visible without a line-of-sight check
    pub near_visibility_radius: i32,
    /// Chunks loaded around the player in each direction
    pub chunk_load_radius: i32,
    /// Hard cap on live enemies and bosses
    pub max_enemies: usize,
    /// No encounter spawns within this many world units of the player
    pub spawn_safe_radius: f32,
    /// Optional catalog file replacing the built-in kind table
    pub catalog_path: Option<PathBuf>,
    /// Optional prebuilt map replacing procedural terrain
    pub map_path: Option<PathBuf>,
}

impl GameConfig {
    /// Default session settings for a seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::GameConfig;
    ///
    /// let config = GameConfig::new(7);
    /// assert_eq!(config.generation.seed, 7);
    /// assert!(config.near_visibility_radius <= config.visibility_radius);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            generation: GenerationConfig::new(seed),
            timestep: TimestepConfig::default(),
            visibility_radius: config::VISIBILITY_RADIUS,
            near_visibility_radius: config::NEAR_VISIBILITY_RADIUS,
            chunk_load_radius: config::CHUNK_LOAD_RADIUS,
            max_enemies: config::MAX_ENEMIES,
            spawn_safe_radius: config::TILE_SIZE * 8.0,
            catalog_path: None,
            map_path: None,
        }
    }

    /// Small world with quiet encounters for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            generation: GenerationConfig::for_testing(seed),
            max_enemies: 32,
            ..Self::new(seed)
        }
    }

    /// Large chunks, Perlin noise and a wider sight radius.
    pub fn for_detailed_generation(seed: u64) -> Self {
        Self {
            generation: GenerationConfig::for_detailed_generation(seed),
            visibility_radius: 14,
            chunk_load_radius: 2,
            ..Self::new(seed)
        }
    }

    /// Returns a copy with out-of-range values repaired and logged.
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        c.generation = c.generation.sanitized();
        if c.visibility_radius < 0 {
            log::warn!("visibility_radius {} below zero, using 0", c.visibility_radius);
            c.visibility_radius = 0;
        }
        if c.near_visibility_radius < 0 || c.near_visibility_radius > c.visibility_radius {
            let near = c.near_visibility_radius.clamp(0, c.visibility_radius);
            log::warn!("near_visibility_radius {} clamped to {}", c.near_visibility_radius, near);
            c.near_visibility_radius = near;
        }
        if !(0..=8).contains(&c.chunk_load_radius) {
            let radius = c.chunk_load_radius.clamp(0, 8);
            log::warn!("chunk_load_radius {} clamped to {}", c.chunk_load_radius, radius);
            c.chunk_load_radius = radius;
        }
        if c.timestep.target_tps == 0 {
            log::warn!("target_tps of 0, using {}", config::TARGET_TPS);
            c.timestep.target_tps = config::TARGET_TPS;
        }
        if !(c.timestep.max_frame_delta > 0.0) {
            log::warn!("max_frame_delta {} invalid, using default", c.timestep.max_frame_delta);
            c.timestep.max_frame_delta = config::MAX_FRAME_DELTA;
        }
        if c.timestep.max_ticks_per_frame == 0 {
            log::warn!("max_ticks_per_frame of 0, using 1");
            c.timestep.max_ticks_per_frame = 1;
        }
        if !c.spawn_safe_radius.is_finite() || c.spawn_safe_radius < 0.0 {
            log::warn!("spawn_safe_radius {} invalid, using 0", c.spawn_safe_radius);
            c.spawn_safe_radius = 0.0;
        }
        c
    }

    pub fn from_json(json: &str) -> EmberfallResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> EmberfallResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads and sanitizes a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> EmberfallResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> EmberfallResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
