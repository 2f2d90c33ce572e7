//! # Generation Module
//!
//! Procedural content generation for the chunked overworld and its encounters.
//!
//! Chunks are produced one at a time from a [`GenerationConfig`] snapshot and a
//! chunk coordinate. Everything is sampled in world space, so a chunk comes out
//! the same no matter when or in which order it is requested.

pub mod encounters;
pub mod noise_field;
pub mod overlays;
pub mod terrain;

pub use encounters::*;
pub use noise_field::*;
pub use terrain::*;

use crate::game::{Chunk, ChunkCoord, Material, Position, Tile};
use crate::{config, EmberfallError, EmberfallResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative share of the region-noise range given to each group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionWeights {
    pub desert: f32,
    pub grassland: f32,
    pub earth: f32,
    pub rock: f32,
    pub frost: f32,
}

impl RegionWeights {
    /// Weights with grassland dominating everything else.
    pub fn grass_dominant() -> Self {
        Self {
            desert: 0.0,
            grassland: 1.0,
            earth: 0.0,
            rock: 0.0,
            frost: 0.0,
        }
    }

    pub fn total(&self) -> f32 {
        self.desert + self.grassland + self.earth + self.rock + self.frost
    }
}

impl Default for RegionWeights {
    fn default() -> Self {
        Self {
            desert: 0.15,
            grassland: 0.35,
            earth: 0.2,
            rock: 0.2,
            frost: 0.1,
        }
    }
}

/// Configuration for procedural generation.
///
/// An immutable snapshot of every tunable generation parameter. Values that
/// make no sense are repaired by [`GenerationConfig::sanitized`] rather than
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// World edge length in chunks
    pub world_chunks: i32,
    /// Chunk edge length in tiles
    pub chunk_size: i32,
    /// Tile edge length in world units
    pub tile_size: f32,
    /// Feature size of the region noise, in tiles
    pub region_scale: f32,
    /// Feature size of the detail noise, in tiles
    pub detail_scale: f32,
    /// Octaves summed by every noise field
    pub noise_octaves: u32,
    /// Algorithm behind the noise fields
    pub noise_backend: NoiseBackend,
    /// Majority-filter passes over the region groups
    pub smoothing_iterations: u32,
    /// Whether region smoothing runs at all
    pub enable_clustering: bool,
    /// When false every cell is grassland
    pub enable_biomes: bool,
    /// Band widths for region groups
    pub region_weights: RegionWeights,
    /// Ridge noise level above which rock becomes cliff
    pub cliff_threshold: f32,
    /// Probability of an accent material (0.0 to 1.0)
    pub accent_chance: f32,
    pub enable_water: bool,
    pub water_scale: f32,
    pub water_threshold: f32,
    pub deep_water_threshold: f32,
    /// Water bodies smaller than this are dried out
    pub min_lake_size: usize,
    pub enable_rivers: bool,
    /// Probability that a chunk with a lake gets a river
    pub river_chance: f32,
    pub river_max_steps: u32,
    pub enable_lava: bool,
    pub lava_scale: f32,
    pub lava_threshold: f32,
    /// Whether transition materials are inserted between distant groups
    pub enable_transitions: bool,
    /// Enemies per 100 walkable tiles
    pub enemy_density: f32,
    /// Chance that a chunk hosts a boss (0.0 to 1.0)
    pub boss_chance: f32,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(42);
    /// assert_eq!(config.seed, 42);
    /// assert!(config.chunk_size >= 4);
    /// assert!(config.deep_water_threshold > config.water_threshold);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            world_chunks: config::DEFAULT_WORLD_CHUNKS as i32,
            chunk_size: config::DEFAULT_CHUNK_SIZE as i32,
            tile_size: config::TILE_SIZE,
            region_scale: 48.0,
            detail_scale: 6.0,
            noise_octaves: 4,
            noise_backend: NoiseBackend::Harmonic,
            smoothing_iterations: 3,
            enable_clustering: true,
            enable_biomes: true,
            region_weights: RegionWeights::default(),
            cliff_threshold: 0.7,
            accent_chance: 0.06,
            enable_water: true,
            water_scale: 36.0,
            water_threshold: 0.76,
            deep_water_threshold: 0.9,
            min_lake_size: 6,
            enable_rivers: true,
            river_chance: 0.4,
            river_max_steps: 96,
            enable_lava: true,
            lava_scale: 14.0,
            lava_threshold: 0.5,
            enable_transitions: true,
            enemy_density: 0.8,
            boss_chance: 0.08,
        }
    }

    /// Creates a configuration for testing with small chunks and no extras.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            world_chunks: 4,
            chunk_size: 16,
            smoothing_iterations: 2,
            enable_rivers: false,
            enable_lava: false,
            enemy_density: 0.5,
            boss_chance: 0.0,
            ..Self::new(seed)
        }
    }

    /// Creates a configuration with large chunks, Perlin noise and every overlay.
    pub fn for_detailed_generation(seed: u64) -> Self {
        Self {
            chunk_size: 64,
            world_chunks: 32,
            noise_octaves: 6,
            noise_backend: NoiseBackend::Perlin,
            smoothing_iterations: 4,
            river_chance: 0.6,
            enemy_density: 1.2,
            boss_chance: 0.12,
            ..Self::new(seed)
        }
    }

    /// Returns a copy with every out-of-range value clamped into range.
    ///
    /// Each repaired field is logged once per call.
    pub fn sanitized(&self) -> Self {
        let mut c = self.clone();
        c.world_chunks = clamp_logged("world_chunks", c.world_chunks, 1, 1024);
        c.chunk_size = clamp_logged(
            "chunk_size",
            c.chunk_size,
            config::MIN_CHUNK_SIZE as i32,
            config::MAX_CHUNK_SIZE as i32,
        );
        c.tile_size = clamp_logged_f32("tile_size", c.tile_size, 1.0, 512.0);
        c.region_scale = clamp_logged_f32("region_scale", c.region_scale, 1.0, 4096.0);
        c.detail_scale = clamp_logged_f32("detail_scale", c.detail_scale, 1.0, 4096.0);
        c.noise_octaves = clamp_logged("noise_octaves", c.noise_octaves, 1, 8);
        c.smoothing_iterations = clamp_logged("smoothing_iterations", c.smoothing_iterations, 0, 8);
        c.cliff_threshold = clamp_logged_f32("cliff_threshold", c.cliff_threshold, 0.0, 1.0);
        c.accent_chance = clamp_logged_f32("accent_chance", c.accent_chance, 0.0, 1.0);
        c.water_scale = clamp_logged_f32("water_scale", c.water_scale, 1.0, 4096.0);
        c.water_threshold = clamp_logged_f32("water_threshold", c.water_threshold, -1.0, 1.0);
        c.deep_water_threshold = clamp_logged_f32(
            "deep_water_threshold",
            c.deep_water_threshold,
            c.water_threshold,
            1.0,
        );
        c.min_lake_size = clamp_logged("min_lake_size", c.min_lake_size, 1, 32);
        c.river_chance = clamp_logged_f32("river_chance", c.river_chance, 0.0, 1.0);
        c.river_max_steps = clamp_logged("river_max_steps", c.river_max_steps, 1, 4096);
        c.lava_scale = clamp_logged_f32("lava_scale", c.lava_scale, 1.0, 4096.0);
        c.lava_threshold = clamp_logged_f32("lava_threshold", c.lava_threshold, -1.0, 1.0);
        c.enemy_density = clamp_logged_f32("enemy_density", c.enemy_density, 0.0, 50.0);
        c.boss_chance = clamp_logged_f32("boss_chance", c.boss_chance, 0.0, 1.0);

        let w = &mut c.region_weights;
        for (name, weight) in [
            ("desert", &mut w.desert),
            ("grassland", &mut w.grassland),
            ("earth", &mut w.earth),
            ("rock", &mut w.rock),
            ("frost", &mut w.frost),
        ] {
            *weight = clamp_logged_f32(name, *weight, 0.0, 1000.0);
        }
        if w.total() <= 0.0 {
            log::warn!("All region weights are zero, falling back to grassland only");
            *w = RegionWeights::grass_dominant();
        }
        c
    }

    /// Chunk edge length after clamping.
    pub fn chunk_side(&self) -> u32 {
        self.chunk_size
            .clamp(config::MIN_CHUNK_SIZE as i32, config::MAX_CHUNK_SIZE as i32) as u32
    }

    /// Loads a configuration from a JSON file and sanitizes it.
    pub fn load(path: impl AsRef<Path>) -> EmberfallResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config.sanitized())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

fn clamp_logged<T: PartialOrd + Copy + std::fmt::Debug>(name: &str, value: T, min: T, max: T) -> T {
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        log::warn!("Config value {} = {:?} clamped to {:?}", name, value, clamped);
    }
    clamped
}

fn clamp_logged_f32(name: &str, value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        log::warn!("Config value {} = {} is not finite, using {}", name, value, min);
        return min;
    }
    clamp_logged(name, value, min, max)
}

/// Trait for chunk generators.
///
/// Every map source in Emberfall implements this trait, so the world can
/// lazily request chunks without caring where they come from.
pub trait Generator<T> {
    /// Generates content for one chunk coordinate.
    fn generate(&self, coord: ChunkCoord, config: &GenerationConfig) -> EmberfallResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> EmberfallResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// On-disk layout of a prebuilt map.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrebuiltMapFile {
    width: u32,
    height: u32,
    #[serde(default)]
    origin: Option<Position>,
    tiles: Vec<u8>,
}

/// A pre-authored map used instead of procedural terrain.
///
/// Chunks are cut out of the map. Cells that fall outside it are cliff wall.
#[derive(Debug, Clone, PartialEq)]
pub struct PrebuiltMap {
    pub width: u32,
    pub height: u32,
    /// World tile of the map's top-left cell
    pub origin: Position,
    tiles: Vec<Tile>,
}

impl PrebuiltMap {
    /// Builds a map from row-major materials anchored at the world origin.
    pub fn from_materials(width: u32, height: u32, materials: &[Material]) -> EmberfallResult<Self> {
        check_dimensions(width, height, materials.len())?;
        Ok(Self {
            width,
            height,
            origin: Position::origin(),
            tiles: materials.iter().map(|m| Tile::new(*m)).collect(),
        })
    }

    /// Parses a map from JSON. Unknown material ids become grass.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{Material, PrebuiltMap, Position};
    ///
    /// let map = PrebuiltMap::from_json(r#"{"width":2,"height":1,"tiles":[13,250]}"#).unwrap();
    /// assert_eq!(map.material_at(Position::new(0, 0)), Material::CliffWall);
    /// assert_eq!(map.material_at(Position::new(1, 0)), Material::Grass);
    /// ```
    pub fn from_json(json: &str) -> EmberfallResult<Self> {
        let file: PrebuiltMapFile = serde_json::from_str(json)?;
        check_dimensions(file.width, file.height, file.tiles.len())?;
        Ok(Self {
            width: file.width,
            height: file.height,
            origin: file.origin.unwrap_or_else(Position::origin),
            tiles: file.tiles.iter().map(|id| Tile::from_raw(*id)).collect(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> EmberfallResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> EmberfallResult<String> {
        let file = PrebuiltMapFile {
            width: self.width,
            height: self.height,
            origin: Some(self.origin),
            tiles: self.tiles.iter().map(|t| t.material.id()).collect(),
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Material at a world tile, cliff wall outside the map.
    pub fn material_at(&self, world: Position) -> Material {
        let local = world - self.origin;
        if local.x < 0 || local.y < 0 || local.x as u32 >= self.width || local.y as u32 >= self.height {
            return Material::CliffWall;
        }
        let index = local.y as usize * self.width as usize + local.x as usize;
        self.tiles
            .get(index)
            .map_or(Material::CliffWall, |tile| tile.material)
    }

    /// Range of chunk coordinates that overlap the map, as `(min, max)` inclusive.
    pub fn chunk_bounds(&self, chunk_size: u32) -> (ChunkCoord, ChunkCoord) {
        let far = Position::new(
            self.origin.x.saturating_add(self.width as i32 - 1),
            self.origin.y.saturating_add(self.height as i32 - 1),
        );
        (
            ChunkCoord::from_tile(self.origin, chunk_size),
            ChunkCoord::from_tile(far, chunk_size),
        )
    }
}

/// Rejects empty maps, maps whose sides do not fit tile coordinates, and
/// cell counts that disagree with the sides.
fn check_dimensions(width: u32, height: u32, cells: usize) -> EmberfallResult<()> {
    let max_side = i32::MAX as u32;
    let expected = (width as u64).checked_mul(height as u64);
    if width == 0 || height == 0 || width > max_side || height > max_side || expected != Some(cells as u64) {
        return Err(EmberfallError::InvalidConfig(format!(
            "prebuilt map is {}x{} but has {} cells",
            width, height, cells
        )));
    }
    Ok(())
}

impl Generator<Chunk> for PrebuiltMap {
    fn generate(&self, coord: ChunkCoord, config: &GenerationConfig) -> EmberfallResult<Chunk> {
        let size = config.chunk_side();
        let (min, max) = self.chunk_bounds(size);
        if coord.x < min.x || coord.y < min.y || coord.x > max.x || coord.y > max.y {
            return Err(EmberfallError::ChunkUnavailable {
                x: coord.x,
                y: coord.y,
            });
        }

        let origin = coord.origin(size);
        let mut tiles = Vec::with_capacity((size * size) as usize);
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                tiles.push(Tile::new(self.material_at(origin + Position::new(x, y))));
            }
        }
        let chunk = Chunk::from_tiles(coord, size, tiles)
            .ok_or_else(|| EmberfallError::GenerationFailed("chunk buffer size".to_string()))?;
        self.validate(&chunk, config)?;
        Ok(chunk)
    }

    fn validate(&self, content: &Chunk, config: &GenerationConfig) -> EmberfallResult<()> {
        utils::validate_chunk(content, config)
    }

    fn generator_type(&self) -> &'static str {
        "PrebuiltMap"
    }
}

/// Where the world gets its chunks from.
#[derive(Debug, Clone)]
pub enum MapSource {
    Procedural(TerrainGenerator),
    Prebuilt(PrebuiltMap),
}

impl MapSource {
    pub fn procedural() -> Self {
        MapSource::Procedural(TerrainGenerator::new())
    }

    pub fn generate_chunk(&self, coord: ChunkCoord, config: &GenerationConfig) -> EmberfallResult<Chunk> {
        match self {
            MapSource::Procedural(generator) => generator.generate(coord, config),
            MapSource::Prebuilt(map) => map.generate(coord, config),
        }
    }

    pub fn generator_type(&self) -> &'static str {
        match self {
            MapSource::Procedural(generator) => generator.generator_type(),
            MapSource::Prebuilt(map) => map.generator_type(),
        }
    }
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Creates a random number generator unique to a seed and chunk.
    pub fn chunk_rng(seed: u64, coord: ChunkCoord) -> StdRng {
        let mixed = derive_seed(
            derive_seed(seed, coord.x as u32 as u64),
            (coord.y as u32 as u64) | (1 << 40),
        );
        StdRng::seed_from_u64(mixed)
    }

    /// Validates that a chunk meets basic requirements.
    pub fn validate_chunk(chunk: &Chunk, config: &GenerationConfig) -> EmberfallResult<()> {
        let size = config.chunk_side();
        if chunk.size != size || chunk.tiles().len() != (size * size) as usize {
            return Err(EmberfallError::GenerationFailed(format!(
                "chunk ({}, {}) has wrong dimensions",
                chunk.coord.x, chunk.coord.y
            )));
        }

        if let Some(tile) = chunk
            .tiles()
            .iter()
            .find(|tile| *tile != &Tile::new(tile.material))
        {
            return Err(EmberfallError::GenerationFailed(format!(
                "tile flags disagree with material {:?}",
                tile.material
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.accent_chance, 0.06);
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn test_sanitize_clamps_bad_values() {
        let config = GenerationConfig {
            chunk_size: -5,
            accent_chance: 3.0,
            region_scale: f32::NAN,
            deep_water_threshold: -1.0,
            region_weights: RegionWeights {
                desert: 0.0,
                grassland: 0.0,
                earth: 0.0,
                rock: -1.0,
                frost: 0.0,
            },
            ..GenerationConfig::new(1)
        };
        let fixed = config.sanitized();
        assert_eq!(fixed.chunk_size, config::MIN_CHUNK_SIZE as i32);
        assert_eq!(fixed.accent_chance, 1.0);
        assert_eq!(fixed.region_scale, 1.0);
        assert!(fixed.deep_water_threshold >= fixed.water_threshold);
        assert_eq!(fixed.region_weights, RegionWeights::grass_dominant());
    }

    #[test]
    fn test_config_json_defaults_missing_fields() {
        let config: GenerationConfig = serde_json::from_str(r#"{"seed": 9}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.chunk_size, GenerationConfig::default().chunk_size);
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.json");
        let mut config = GenerationConfig::for_testing(77);
        config.chunk_size = 9999;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = GenerationConfig::load(&path).unwrap();
        assert_eq!(loaded.seed, 77);
        assert_eq!(loaded.chunk_size, config::MAX_CHUNK_SIZE as i32);
    }

    #[test]
    fn test_prebuilt_map_slices_chunks() {
        let mut materials = vec![Material::Sand; 6 * 6];
        materials[7] = Material::Lava;
        let map = PrebuiltMap::from_materials(6, 6, &materials).unwrap();
        let config = GenerationConfig {
            chunk_size: 4,
            ..GenerationConfig::for_testing(1)
        };

        let chunk = map.generate(ChunkCoord::new(0, 0), &config).unwrap();
        assert_eq!(chunk.tile(1, 1).map(|t| t.material), Some(Material::Lava));
        assert_eq!(chunk.tile(0, 0).map(|t| t.material), Some(Material::Sand));

        let edge = map.generate(ChunkCoord::new(1, 1), &config).unwrap();
        assert_eq!(edge.tile(1, 1).map(|t| t.material), Some(Material::Sand));
        assert_eq!(edge.tile(2, 2).map(|t| t.material), Some(Material::CliffWall));

        assert!(matches!(
            map.generate(ChunkCoord::new(5, 0), &config),
            Err(EmberfallError::ChunkUnavailable { x: 5, y: 0 })
        ));
    }

    #[test]
    fn test_prebuilt_map_rejects_bad_dimensions() {
        assert!(PrebuiltMap::from_json(r#"{"width":3,"height":3,"tiles":[0,1]}"#).is_err());
        assert!(PrebuiltMap::from_materials(2, 2, &[Material::Grass]).is_err());
        assert!(PrebuiltMap::from_json(r#"{"width":4,"height":0,"tiles":[]}"#).is_err());
    }

    #[test]
    fn test_prebuilt_map_rejects_overflowing_dimensions() {
        for json in [
            r#"{"width":65536,"height":65536,"tiles":[]}"#,
            r#"{"width":70000,"height":70000,"tiles":[1]}"#,
            r#"{"width":4294967295,"height":1,"tiles":[]}"#,
        ] {
            assert!(
                matches!(PrebuiltMap::from_json(json), Err(EmberfallError::InvalidConfig(_))),
                "accepted {}",
                json
            );
        }
        assert!(PrebuiltMap::from_materials(u32::MAX, 2, &[]).is_err());
    }

    #[test]
    fn test_chunk_rng_differs_per_chunk() {
        use rand::Rng;
        let a: u64 = utils::chunk_rng(5, ChunkCoord::new(0, 1)).gen();
        let b: u64 = utils::chunk_rng(5, ChunkCoord::new(1, 0)).gen();
        let c: u64 = utils::chunk_rng(5, ChunkCoord::new(0, 1)).gen();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
