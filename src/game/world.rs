//! # World
//!
//! Lazily generated chunk store. Chunks are created on approach, cached by
//! coordinate and kept for the rest of the session.

use super::{update_visibility, Chunk, ChunkCoord, Position, Tile, WorldPos};
use crate::combat::WorldBounds;
use crate::{EmberfallError, EmberfallResult, GenerationConfig, MapSource};
use std::collections::HashMap;

/// The tile grid, split into chunks.
#[derive(Debug, Clone)]
pub struct World {
    config: GenerationConfig,
    source: MapSource,
    chunks: HashMap<ChunkCoord, Chunk>,
    /// Inclusive chunk coordinate range the world may contain
    chunk_min: ChunkCoord,
    chunk_max: ChunkCoord,
    newly_loaded: Vec<ChunkCoord>,
}

impl World {
    /// Procedural world centred on chunk (0, 0).
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{ChunkCoord, GenerationConfig, World};
    ///
    /// let mut world = World::new(GenerationConfig::for_testing(1));
    /// assert!(world.ensure_chunk(ChunkCoord::new(0, 0)).is_some());
    /// assert!(world.ensure_chunk(ChunkCoord::new(100, 0)).is_none());
    /// ```
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_source(config, MapSource::procedural())
    }

    /// World backed by any map source. Prebuilt maps define their own bounds.
    pub fn with_source(config: GenerationConfig, source: MapSource) -> Self {
        let config = config.sanitized();
        let (chunk_min, chunk_max) = match &source {
            MapSource::Prebuilt(map) => map.chunk_bounds(config.chunk_side()),
            MapSource::Procedural(_) => {
                let n = config.world_chunks;
                let min = -(n / 2);
                (ChunkCoord::new(min, min), ChunkCoord::new(min + n - 1, min + n - 1))
            }
        };
        log::info!(
            "World using {} over chunks ({}, {})..=({}, {})",
            source.generator_type(),
            chunk_min.x,
            chunk_min.y,
            chunk_max.x,
            chunk_max.y
        );
        Self {
            config,
            source,
            chunks: HashMap::new(),
            chunk_min,
            chunk_max,
            newly_loaded: Vec::new(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn chunk_size(&self) -> u32 {
        self.config.chunk_side()
    }

    pub fn tile_size(&self) -> f32 {
        self.config.tile_size
    }

    pub fn chunk_range(&self) -> (ChunkCoord, ChunkCoord) {
        (self.chunk_min, self.chunk_max)
    }

    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        coord.x >= self.chunk_min.x
            && coord.y >= self.chunk_min.y
            && coord.x <= self.chunk_max.x
            && coord.y <= self.chunk_max.y
    }

    /// Inclusive tile range covered by the world.
    pub fn tile_range(&self) -> (Position, Position) {
        let size = self.chunk_size();
        let min = self.chunk_min.origin(size);
        let max = self.chunk_max.origin(size) + Position::new(size as i32 - 1, size as i32 - 1);
        (min, max)
    }

    /// World-unit rectangle covered by the world.
    pub fn bounds(&self) -> WorldBounds {
        let (min, max) = self.tile_range();
        let tile = self.tile_size();
        WorldBounds::new(
            WorldPos::new(min.x as f32 * tile, min.y as f32 * tile),
            WorldPos::new((max.x + 1) as f32 * tile, (max.y + 1) as f32 * tile),
        )
    }

    /// Clamps a tile position into the world.
    pub fn clamp_tile(&self, pos: Position) -> Position {
        let (min, max) = self.tile_range();
        Position::new(pos.x.clamp(min.x, max.x), pos.y.clamp(min.y, max.y))
    }

    pub fn world_to_tile(&self, pos: WorldPos) -> Position {
        let tile = self.tile_size();
        Position::new((pos.x / tile).floor() as i32, (pos.y / tile).floor() as i32)
    }

    pub fn tile_center(&self, pos: Position) -> WorldPos {
        let tile = self.tile_size();
        WorldPos::new((pos.x as f32 + 0.5) * tile, (pos.y as f32 + 0.5) * tile)
    }

    /// Returns the chunk, generating it first if needed.
    ///
    /// Coordinates outside the world give `None`. A failed generation is
    /// logged and leaves the chunk absent so the next call retries.
    pub fn ensure_chunk(&mut self, coord: ChunkCoord) -> Option<&Chunk> {
        if !self.contains_chunk(coord) {
            return None;
        }
        if !self.chunks.contains_key(&coord) {
            match self.source.generate_chunk(coord, &self.config) {
                Ok(chunk) => {
                    log::debug!("Generated chunk ({}, {})", coord.x, coord.y);
                    self.chunks.insert(coord, chunk);
                    self.newly_loaded.push(coord);
                }
                Err(err) => {
                    log::warn!("Chunk ({}, {}) failed to generate: {}", coord.x, coord.y, err);
                    return None;
                }
            }
        }
        self.chunks.get(&coord)
    }

    /// Generates every chunk within `radius` chunks of a tile.
    pub fn load_around(&mut self, center: Position, radius: i32) {
        let origin = ChunkCoord::from_tile(center, self.chunk_size());
        let radius = radius.max(0);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                self.ensure_chunk(ChunkCoord::new(origin.x + dx, origin.y + dy));
            }
        }
    }

    /// Chunks generated since the last call.
    pub fn take_new_chunks(&mut self) -> Vec<ChunkCoord> {
        std::mem::take(&mut self.newly_loaded)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub(crate) fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    fn locate(&self, pos: Position) -> Option<(&Chunk, i32, i32)> {
        let chunk = self.chunks.get(&ChunkCoord::from_tile(pos, self.chunk_size()))?;
        let (lx, ly) = chunk.local_of(pos)?;
        Some((chunk, lx, ly))
    }

    /// Tile at a world tile position, if its chunk is loaded.
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        let (chunk, lx, ly) = self.locate(pos)?;
        chunk.tile(lx, ly)
    }

    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> EmberfallResult<()> {
        let coord = ChunkCoord::from_tile(pos, self.chunk_size());
        let chunk = self
            .chunks
            .get_mut(&coord)
            .ok_or(EmberfallError::ChunkUnavailable {
                x: coord.x,
                y: coord.y,
            })?;
        let (lx, ly) = chunk
            .local_of(pos)
            .ok_or_else(|| EmberfallError::InvalidState(format!("{:?} outside its chunk", pos)))?;
        chunk.set_tile(lx, ly, tile);
        Ok(())
    }

    /// Unloaded tiles are never walkable.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).map_or(false, |t| t.walkable)
    }

    /// Unloaded tiles block sight.
    pub fn is_transparent(&self, pos: Position) -> bool {
        self.tile(pos).map_or(false, |t| t.transparent)
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.locate(pos)
            .map_or(false, |(chunk, lx, ly)| chunk.is_visible(lx, ly))
    }

    pub fn is_explored(&self, pos: Position) -> bool {
        self.locate(pos)
            .map_or(false, |(chunk, lx, ly)| chunk.is_explored(lx, ly))
    }

    /// Marks a loaded tile visible and explored.
    pub(crate) fn reveal(&mut self, pos: Position) {
        let coord = ChunkCoord::from_tile(pos, self.chunk_size());
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            if let Some((lx, ly)) = chunk.local_of(pos) {
                chunk.reveal(lx, ly);
            }
        }
    }

    /// Loads chunks around the observer and recomputes visibility.
    pub fn update(&mut self, observer: WorldPos, load_radius: i32, radius: i32, near_radius: i32) {
        let tile = self.clamp_tile(self.world_to_tile(observer));
        self.load_around(tile, load_radius);
        update_visibility(observer, self, radius, near_radius);
    }

    /// Where the player starts: the walkable tile closest to the centre of
    /// chunk (0, 0), or of the map for prebuilt worlds.
    pub fn find_spawn(&mut self) -> EmberfallResult<Position> {
        let size = self.chunk_size() as i32;
        let center = match &self.source {
            MapSource::Prebuilt(map) => {
                map.origin + Position::new(map.width as i32 / 2, map.height as i32 / 2)
            }
            MapSource::Procedural(_) => Position::new(size / 2, size / 2),
        };
        let center = self.clamp_tile(center);
        self.load_around(center, 1);

        let spawn = (0..=size)
            .flat_map(|ring| ring_positions(center, ring))
            .find(|pos| {
                self.tile(*pos)
                    .map_or(false, |t| t.walkable && !t.material.is_fluid())
            });
        spawn.ok_or_else(|| {
            EmberfallError::InvalidState(format!("no walkable spawn near {:?}", center))
        })
    }
}

/// Tiles on the square ring at Chebyshev distance `ring`.
fn ring_positions(center: Position, ring: i32) -> Vec<Position> {
    if ring == 0 {
        return vec![center];
    }
    let mut out = Vec::with_capacity((ring * 8) as usize);
    for d in -ring..=ring {
        out.push(center + Position::new(d, -ring));
        out.push(center + Position::new(d, ring));
    }
    for d in (-ring + 1)..ring {
        out.push(center + Position::new(-ring, d));
        out.push(center + Position::new(ring, d));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, PrebuiltMap};

    #[test]
    fn test_world_centred_on_origin() {
        let world = World::new(GenerationConfig::for_testing(3));
        let (min, max) = world.chunk_range();
        assert_eq!(min, ChunkCoord::new(-2, -2));
        assert_eq!(max, ChunkCoord::new(1, 1));
        assert!(world.contains_chunk(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_chunks_generate_lazily_once() {
        let mut world = World::new(GenerationConfig::for_testing(3));
        assert_eq!(world.loaded_count(), 0);
        world.load_around(Position::new(0, 0), 1);
        assert_eq!(world.loaded_count(), 9);
        assert_eq!(world.take_new_chunks().len(), 9);
        world.load_around(Position::new(1, 1), 1);
        assert!(world.take_new_chunks().is_empty());
    }

    #[test]
    fn test_unloaded_tiles_block() {
        let world = World::new(GenerationConfig::for_testing(3));
        let pos = Position::new(5, 5);
        assert!(world.tile(pos).is_none());
        assert!(!world.is_walkable(pos));
        assert!(!world.is_transparent(pos));
    }

    #[test]
    fn test_prebuilt_world_spawn_and_bounds() {
        let mut materials = vec![Material::CliffWall; 20 * 20];
        materials[10 * 20 + 12] = Material::Grass;
        let map = PrebuiltMap::from_materials(20, 20, &materials).unwrap();
        let config = GenerationConfig::for_testing(3);
        let mut world = World::with_source(config, MapSource::Prebuilt(map));
        assert_eq!(world.chunk_range(), (ChunkCoord::new(0, 0), ChunkCoord::new(1, 1)));
        assert_eq!(world.find_spawn().unwrap(), Position::new(12, 10));
        assert!(world.ensure_chunk(ChunkCoord::new(-1, 0)).is_none());
    }

    #[test]
    fn test_set_tile_requires_loaded_chunk() {
        let mut world = World::new(GenerationConfig::for_testing(3));
        let pos = Position::new(2, 2);
        assert!(world.set_tile(pos, Tile::new(Material::Lava)).is_err());
        world.ensure_chunk(ChunkCoord::new(0, 0));
        world.set_tile(pos, Tile::new(Material::Lava)).unwrap();
        assert!(!world.is_walkable(pos));
    }
}
