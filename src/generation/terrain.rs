//! # Terrain Generation
//!
//! Turns a chunk coordinate into a finished chunk of tiles.
//!
//! The pipeline runs on a padded square buffer centred on the chunk so that
//! every neighbourhood operation sees the same cells its neighbouring chunk
//! sees. Only the centre window is kept at the end.
//!
//! 1. Region groups from banded region noise (plus cliff ridges inside rock)
//! 2. Majority smoothing followed by a despeckle pass
//! 3. Dominant or accent material per cell
//! 4. Water, deep water, river and lava overlays
//! 5. Transition materials between groups that are far apart

use super::noise_field::{cell_hash, derive_seed, NoiseField};
use super::overlays;
use super::{utils, GenerationConfig, Generator};
use crate::game::{Chunk, ChunkCoord, Material, MaterialFamily, Position, RegionGroup, Tile};
use crate::{EmberfallError, EmberfallResult};
use pathfinding::prelude::{bfs, connected_components};
use std::collections::HashMap;

const REGION_SALT: u64 = 1;
const RIDGE_SALT: u64 = 2;
const DETAIL_SALT: u64 = 3;
const ACCENT_SALT: u64 = 4;
pub(crate) const WATER_SALT: u64 = 5;
pub(crate) const LAVA_SALT: u64 = 6;
pub(crate) const RIVER_SALT: u64 = 7;

/// Upper bound on despeckle passes.
const DESPECKLE_PASSES: u32 = 6;

/// Offsets of the 8 surrounding cells.
pub(crate) const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Offsets of the 4 edge-sharing cells.
pub(crate) const NEIGHBOURS_4: [(i32, i32); 4] = [(0, -1), (0, 1), (1, 0), (-1, 0)];

/// Noise fields used by one generation run.
pub(crate) struct TerrainFields {
    pub region: NoiseField,
    pub ridge: NoiseField,
    pub detail: NoiseField,
    pub water: NoiseField,
    pub lava: NoiseField,
}

impl TerrainFields {
    pub fn new(config: &GenerationConfig) -> Self {
        let octaves = config.noise_octaves;
        let backend = config.noise_backend;
        let seed = config.seed;
        Self {
            region: NoiseField::new(derive_seed(seed, REGION_SALT), config.region_scale, octaves, backend),
            ridge: NoiseField::new(
                derive_seed(seed, RIDGE_SALT),
                config.region_scale * 0.5,
                octaves,
                backend,
            ),
            detail: NoiseField::new(derive_seed(seed, DETAIL_SALT), config.detail_scale, octaves, backend),
            water: NoiseField::new(derive_seed(seed, WATER_SALT), config.water_scale, octaves, backend),
            lava: NoiseField::new(derive_seed(seed, LAVA_SALT), config.lava_scale, octaves, backend),
        }
    }
}

/// Working state for one chunk plus its padding.
#[derive(Debug, Clone)]
pub(crate) struct TerrainBuffer {
    /// World tile of buffer cell (0, 0)
    pub origin: Position,
    pub side: i32,
    pub pad: i32,
    pub chunk_size: i32,
    pub groups: Vec<RegionGroup>,
    /// Material before any fluid or hazard overlay
    pub land: Vec<Material>,
    pub materials: Vec<Material>,
}

impl TerrainBuffer {
    fn new(coord: ChunkCoord, chunk_size: u32, pad: i32) -> Self {
        let side = chunk_size as i32 + 2 * pad;
        let cells = (side * side) as usize;
        Self {
            origin: coord.origin(chunk_size) - Position::new(pad, pad),
            side,
            pad,
            chunk_size: chunk_size as i32,
            groups: vec![RegionGroup::Grassland; cells],
            land: vec![Material::Grass; cells],
            materials: vec![Material::Grass; cells],
        }
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.side || y >= self.side {
            None
        } else {
            Some((y * self.side + x) as usize)
        }
    }

    pub fn coords(&self, index: usize) -> (i32, i32) {
        let i = index as i32;
        (i % self.side, i / self.side)
    }

    pub fn world(&self, x: i32, y: i32) -> Position {
        self.origin + Position::new(x, y)
    }

    pub fn in_chunk(&self, x: i32, y: i32) -> bool {
        let lo = self.pad;
        let hi = self.pad + self.chunk_size;
        x >= lo && y >= lo && x < hi && y < hi
    }

    pub fn on_chunk_boundary(&self, x: i32, y: i32) -> bool {
        let lo = self.pad;
        let hi = self.pad + self.chunk_size - 1;
        self.in_chunk(x, y) && (x == lo || y == lo || x == hi || y == hi)
    }

    pub fn on_buffer_edge(&self, x: i32, y: i32) -> bool {
        x == 0 || y == 0 || x == self.side - 1 || y == self.side - 1
    }

    /// In-buffer neighbour indices for the given offsets.
    pub fn neighbours<'a>(
        &'a self,
        index: usize,
        offsets: &'a [(i32, i32)],
    ) -> impl Iterator<Item = usize> + 'a {
        let (x, y) = self.coords(index);
        offsets
            .iter()
            .filter_map(move |(dx, dy)| self.index(x + dx, y + dy))
    }

    pub fn is_fluid(&self, index: usize) -> bool {
        self.materials[index].is_fluid()
    }

    /// Indices of the chunk window in row-major order.
    pub fn chunk_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let lo = self.pad;
        let hi = self.pad + self.chunk_size;
        (lo..hi).flat_map(move |y| (lo..hi).filter_map(move |x| self.index(x, y)))
    }
}

/// Which groups read as "similar" for transition purposes.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    distances: HashMap<(RegionGroup, RegionGroup), usize>,
}

impl SimilarityGraph {
    const EDGES: [(RegionGroup, RegionGroup); 6] = [
        (RegionGroup::Desert, RegionGroup::Grassland),
        (RegionGroup::Grassland, RegionGroup::Earth),
        (RegionGroup::Earth, RegionGroup::Desert),
        (RegionGroup::Earth, RegionGroup::Rock),
        (RegionGroup::Rock, RegionGroup::Frost),
        (RegionGroup::Rock, RegionGroup::Cliffs),
    ];

    /// Builds the standard graph and precomputes all pairwise step counts.
    pub fn standard() -> Self {
        let mut distances = HashMap::new();
        for from in RegionGroup::ALL {
            for to in RegionGroup::ALL {
                let path = bfs(&from, |group| Self::adjacent(*group), |group| *group == to);
                if let Some(path) = path {
                    distances.insert((from, to), path.len() - 1);
                }
            }
        }
        Self { distances }
    }

    fn adjacent(group: RegionGroup) -> Vec<RegionGroup> {
        Self::EDGES
            .iter()
            .filter_map(|(a, b)| {
                if *a == group {
                    Some(*b)
                } else if *b == group {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Number of graph steps between two groups.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{RegionGroup, SimilarityGraph};
    ///
    /// let graph = SimilarityGraph::standard();
    /// assert_eq!(graph.distance(RegionGroup::Grassland, RegionGroup::Earth), Some(1));
    /// assert_eq!(graph.distance(RegionGroup::Grassland, RegionGroup::Frost), Some(3));
    /// ```
    pub fn distance(&self, a: RegionGroup, b: RegionGroup) -> Option<usize> {
        self.distances.get(&(a, b)).copied()
    }

    /// Material placed on a cell of group `own` that borders group `other`.
    pub fn transition(&self, own: RegionGroup, other: RegionGroup) -> Option<Material> {
        if self.distance(own, other).map_or(true, |steps| steps <= 1) {
            return None;
        }
        match (own, other) {
            (RegionGroup::Grassland, RegionGroup::Rock | RegionGroup::Cliffs) => {
                Some(Material::GrassStoneEdge)
            }
            (RegionGroup::Desert, RegionGroup::Rock | RegionGroup::Cliffs) => {
                Some(Material::SandStoneEdge)
            }
            (RegionGroup::Grassland, RegionGroup::Frost) => Some(Material::GrassSnowEdge),
            (RegionGroup::Earth | RegionGroup::Desert, RegionGroup::Frost) => {
                Some(Material::DirtSnowEdge)
            }
            (RegionGroup::Earth, RegionGroup::Cliffs) => Some(Material::GrassDirtEdge),
            _ => None,
        }
    }
}

impl Default for SimilarityGraph {
    fn default() -> Self {
        Self::standard()
    }
}

/// Smoothed region groups of one chunk, with a one-cell ring of neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMap {
    pub coord: ChunkCoord,
    pub size: u32,
    groups: Vec<RegionGroup>,
}

impl RegionMap {
    fn stride(&self) -> i32 {
        self.size as i32 + 2
    }

    /// Group at chunk-local coordinates. Accepts -1 and `size` for the ring.
    pub fn group_at(&self, x: i32, y: i32) -> Option<RegionGroup> {
        let stride = self.stride();
        let (bx, by) = (x + 1, y + 1);
        if bx < 0 || by < 0 || bx >= stride || by >= stride {
            return None;
        }
        Some(self.groups[(by * stride + bx) as usize])
    }

    fn chunk_cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let size = self.size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| (x, y)))
    }

    /// Chunk cells with no same-group cell among their 8 neighbours.
    pub fn isolated_cells(&self) -> usize {
        self.chunk_cells()
            .filter(|&(x, y)| {
                let own = self.group_at(x, y);
                !NEIGHBOURS_8
                    .iter()
                    .any(|(dx, dy)| self.group_at(x + dx, y + dy) == own)
            })
            .count()
    }

    /// Number of 8-connected same-group components inside the chunk.
    pub fn component_count(&self) -> usize {
        let size = self.size as i32;
        let starts: Vec<(i32, i32)> = self.chunk_cells().collect();
        connected_components(&starts, |&(x, y)| {
            let own = self.group_at(x, y);
            NEIGHBOURS_8
                .iter()
                .map(move |(dx, dy)| (x + dx, y + dy))
                .filter(|&(nx, ny)| nx >= 0 && ny >= 0 && nx < size && ny < size)
                .filter(|&(nx, ny)| self.group_at(nx, ny) == own)
                .collect::<Vec<_>>()
        })
        .len()
    }

    /// Cell count per group inside the chunk.
    pub fn group_counts(&self) -> HashMap<RegionGroup, usize> {
        let mut counts = HashMap::new();
        for (x, y) in self.chunk_cells() {
            if let Some(group) = self.group_at(x, y) {
                *counts.entry(group).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Procedural terrain source.
///
/// Stateless: every call derives its noise fields from the config it is
/// given, so the same generator can serve any number of worlds.
#[derive(Debug, Clone, Default)]
pub struct TerrainGenerator {
    graph: SimilarityGraph,
}

impl TerrainGenerator {
    /// Creates a new terrain generator.
    pub fn new() -> Self {
        Self {
            graph: SimilarityGraph::standard(),
        }
    }

    pub fn similarity(&self) -> &SimilarityGraph {
        &self.graph
    }

    fn padding(config: &GenerationConfig) -> i32 {
        let smoothing = (config.smoothing_iterations + DESPECKLE_PASSES + 2) as i32;
        let lakes = config.min_lake_size as i32 + 1;
        smoothing.max(lakes)
    }

    /// Smoothed region groups for a chunk, for analysis and debugging.
    pub fn region_map(&self, coord: ChunkCoord, config: &GenerationConfig) -> RegionMap {
        let config = config.sanitized();
        let fields = TerrainFields::new(&config);
        let buffer = self.build_regions(coord, &config, &fields);

        let size = config.chunk_side();
        let mut groups = Vec::with_capacity(((size + 2) * (size + 2)) as usize);
        let lo = buffer.pad - 1;
        let hi = buffer.pad + size as i32 + 1;
        for y in lo..hi {
            for x in lo..hi {
                if let Some(i) = buffer.index(x, y) {
                    groups.push(buffer.groups[i]);
                }
            }
        }
        RegionMap {
            coord,
            size,
            groups,
        }
    }

    fn build_regions(
        &self,
        coord: ChunkCoord,
        config: &GenerationConfig,
        fields: &TerrainFields,
    ) -> TerrainBuffer {
        let mut buffer = TerrainBuffer::new(coord, config.chunk_side(), Self::padding(config));
        for i in 0..buffer.groups.len() {
            let (x, y) = buffer.coords(i);
            let world = buffer.world(x, y);
            buffer.groups[i] = base_group(world, config, fields);
        }

        if config.enable_clustering {
            for _ in 0..config.smoothing_iterations {
                majority_pass(&mut buffer);
            }
            for _ in 0..DESPECKLE_PASSES {
                if !despeckle_pass(&mut buffer) {
                    break;
                }
            }
        }
        buffer
    }

    fn assign_materials(&self, buffer: &mut TerrainBuffer, config: &GenerationConfig, fields: &TerrainFields) {
        let accent_seed = derive_seed(config.seed, ACCENT_SALT);
        for i in 0..buffer.groups.len() {
            let (x, y) = buffer.coords(i);
            let world = buffer.world(x, y);
            let group = buffer.groups[i];
            let accents = group.accents();

            let material = if !accents.is_empty()
                && cell_hash(accent_seed, world.x, world.y) < config.accent_chance
            {
                let pick = fields.detail.sample_unit(world.x as f32, world.y as f32);
                let slot = ((pick * accents.len() as f32) as usize).min(accents.len() - 1);
                accents[slot]
            } else {
                group.dominant()
            };
            buffer.land[i] = material;
            buffer.materials[i] = material;
        }
    }

    fn insert_transitions(&self, buffer: &mut TerrainBuffer) {
        let snapshot = buffer.materials.clone();
        let window: Vec<usize> = buffer.chunk_indices().collect();
        for i in window {
            let material = snapshot[i];
            if material.family() != MaterialFamily::Land {
                continue;
            }
            let Some(own) = material.region_group() else {
                continue;
            };
            let replacement = buffer
                .neighbours(i, &NEIGHBOURS_8)
                .filter_map(|n| snapshot[n].region_group())
                .find_map(|other| self.graph.transition(own, other));
            if let Some(edge) = replacement {
                buffer.materials[i] = edge;
            }
        }
    }
}

impl Generator<Chunk> for TerrainGenerator {
    fn generate(&self, coord: ChunkCoord, config: &GenerationConfig) -> EmberfallResult<Chunk> {
        let config = config.sanitized();
        let fields = TerrainFields::new(&config);

        let mut buffer = self.build_regions(coord, &config, &fields);
        self.assign_materials(&mut buffer, &config, &fields);

        if config.enable_water {
            overlays::apply_water(&mut buffer, &config, &fields);
            overlays::remove_small_lakes(&mut buffer, config.min_lake_size);
            overlays::apply_deep_water(&mut buffer, &config, &fields);
            if config.enable_rivers {
                overlays::carve_river(&mut buffer, &config, coord);
            }
        }
        if config.enable_lava {
            overlays::apply_lava(&mut buffer, &config, &fields);
        }
        if config.enable_transitions {
            self.insert_transitions(&mut buffer);
        }

        let tiles: Vec<Tile> = buffer
            .chunk_indices()
            .map(|i| Tile::new(buffer.materials[i]))
            .collect();
        let chunk = Chunk::from_tiles(coord, config.chunk_side(), tiles).ok_or_else(|| {
            EmberfallError::GenerationFailed(format!("chunk ({}, {}) buffer size", coord.x, coord.y))
        })?;
        self.validate(&chunk, &config)?;

        log::debug!(
            "Generated chunk ({}, {}) with {}",
            coord.x,
            coord.y,
            self.generator_type()
        );
        Ok(chunk)
    }

    fn validate(&self, content: &Chunk, config: &GenerationConfig) -> EmberfallResult<()> {
        utils::validate_chunk(content, config)
    }

    fn generator_type(&self) -> &'static str {
        "TerrainGenerator"
    }
}

/// Region group from banded region noise, before smoothing.
fn base_group(world: Position, config: &GenerationConfig, fields: &TerrainFields) -> RegionGroup {
    if !config.enable_biomes {
        return RegionGroup::Grassland;
    }

    let (x, y) = (world.x as f32, world.y as f32);
    let value = fields.region.sample_unit(x, y);
    let w = &config.region_weights;
    let bands = [
        (RegionGroup::Desert, w.desert),
        (RegionGroup::Grassland, w.grassland),
        (RegionGroup::Earth, w.earth),
        (RegionGroup::Rock, w.rock),
        (RegionGroup::Frost, w.frost),
    ];
    let total = w.total().max(f32::EPSILON);

    let mut cumulative = 0.0;
    let mut group = RegionGroup::Grassland;
    for (band, weight) in bands {
        if weight <= 0.0 {
            continue;
        }
        group = band;
        cumulative += weight / total;
        if value <= cumulative {
            break;
        }
    }

    if group == RegionGroup::Rock && fields.ridge.sample_unit(x, y) > config.cliff_threshold {
        RegionGroup::Cliffs
    } else {
        group
    }
}

/// One majority-filter pass. Reads a snapshot, writes the buffer.
fn majority_pass(buffer: &mut TerrainBuffer) {
    let snapshot = buffer.groups.clone();
    for i in 0..snapshot.len() {
        let mut counts = [0usize; RegionGroup::ALL.len()];
        let mut total = 0;
        for n in buffer.neighbours(i, &NEIGHBOURS_8) {
            counts[group_slot(snapshot[n])] += 1;
            total += 1;
        }
        if let Some(slot) = counts.iter().position(|count| count * 2 > total) {
            buffer.groups[i] = RegionGroup::ALL[slot];
        }
    }
}

/// Rewrites isolated cells to a neighbouring group. Returns whether
/// anything changed.
///
/// Cells with at least one same-group neighbour are never touched, and an
/// isolated cell prefers groups held by non-isolated neighbours, so the
/// number of isolated cells can only go down.
fn despeckle_pass(buffer: &mut TerrainBuffer) -> bool {
    let snapshot = buffer.groups.clone();
    let isolated: Vec<bool> = (0..snapshot.len())
        .map(|i| {
            !buffer
                .neighbours(i, &NEIGHBOURS_8)
                .any(|n| snapshot[n] == snapshot[i])
        })
        .collect();

    let mut changed = false;
    for i in 0..snapshot.len() {
        if !isolated[i] {
            continue;
        }
        let mut stable = [0usize; RegionGroup::ALL.len()];
        let mut any = [0usize; RegionGroup::ALL.len()];
        for n in buffer.neighbours(i, &NEIGHBOURS_8) {
            let slot = group_slot(snapshot[n]);
            any[slot] += 1;
            if !isolated[n] {
                stable[slot] += 1;
            }
        }
        let counts = if stable.iter().any(|c| *c > 0) { stable } else { any };
        if let Some(slot) = plurality(&counts) {
            let group = RegionGroup::ALL[slot];
            if group != snapshot[i] {
                buffer.groups[i] = group;
                changed = true;
            }
        }
    }
    changed
}

fn group_slot(group: RegionGroup) -> usize {
    RegionGroup::ALL
        .iter()
        .position(|g| *g == group)
        .unwrap_or(0)
}

/// Index of the largest count, lowest index on ties.
fn plurality(counts: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (slot, count) in counts.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        if best.map_or(true, |(_, c)| *count > c) {
            best = Some((slot, *count));
        }
    }
    best.map(|(slot, _)| slot)
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// Region groups and base materials for a chunk, before overlays.
    pub fn buffer(coord: ChunkCoord, config: &GenerationConfig) -> TerrainBuffer {
        let generator = TerrainGenerator::new();
        let fields = TerrainFields::new(config);
        let mut buffer = generator.build_regions(coord, config, &fields);
        generator.assign_materials(&mut buffer, config, &fields);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass_only(seed: u64) -> GenerationConfig {
        GenerationConfig {
            region_weights: super::super::RegionWeights::grass_dominant(),
            enable_water: false,
            enable_lava: false,
            chunk_size: 64,
            ..GenerationConfig::new(seed)
        }
    }

    #[test]
    fn test_similarity_distances() {
        let graph = SimilarityGraph::standard();
        assert_eq!(graph.distance(RegionGroup::Rock, RegionGroup::Rock), Some(0));
        assert_eq!(graph.distance(RegionGroup::Desert, RegionGroup::Rock), Some(2));
        assert_eq!(graph.distance(RegionGroup::Frost, RegionGroup::Cliffs), Some(2));
        assert_eq!(graph.distance(RegionGroup::Grassland, RegionGroup::Cliffs), Some(3));
    }

    #[test]
    fn test_transitions_only_for_distant_pairs() {
        let graph = SimilarityGraph::standard();
        assert_eq!(graph.transition(RegionGroup::Grassland, RegionGroup::Earth), None);
        assert_eq!(
            graph.transition(RegionGroup::Grassland, RegionGroup::Rock),
            Some(Material::GrassStoneEdge)
        );
        assert_eq!(
            graph.transition(RegionGroup::Grassland, RegionGroup::Frost),
            Some(Material::GrassSnowEdge)
        );
        assert_eq!(graph.transition(RegionGroup::Rock, RegionGroup::Grassland), None);
    }

    #[test]
    fn test_region_bands_follow_weights() {
        let config = GenerationConfig::new(2024);
        let fields = TerrainFields::new(&config);
        let side = 200;
        let mut counts: HashMap<RegionGroup, usize> = HashMap::new();
        for i in 0..side * side {
            let world = Position::new((i % side) * 12, (i / side) * 12);
            let group = match base_group(world, &config, &fields) {
                RegionGroup::Cliffs => RegionGroup::Rock,
                group => group,
            };
            *counts.entry(group).or_insert(0) += 1;
        }

        let w = &config.region_weights;
        for (group, weight) in [
            (RegionGroup::Desert, w.desert),
            (RegionGroup::Grassland, w.grassland),
            (RegionGroup::Earth, w.earth),
            (RegionGroup::Rock, w.rock),
            (RegionGroup::Frost, w.frost),
        ] {
            let share = counts.get(&group).copied().unwrap_or(0) as f32 / (side * side) as f32;
            let expected = weight / w.total();
            assert!(
                (share - expected).abs() < 0.05,
                "{:?} covers {:.3}, weight {:.3}",
                group,
                share,
                expected
            );
        }
    }

    #[test]
    fn test_transitions_line_the_grass_side_of_a_rock_seam() {
        let mut buffer = TerrainBuffer::new(ChunkCoord::new(0, 0), 8, 1);
        for i in 0..buffer.materials.len() {
            let (x, _) = buffer.coords(i);
            let material = if x < 5 { Material::Grass } else { Material::Stone };
            buffer.materials[i] = material;
            buffer.land[i] = material;
        }
        let pond = buffer.index(4, 3).unwrap();
        let lava = buffer.index(4, 6).unwrap();
        buffer.materials[pond] = Material::ShallowWater;
        buffer.materials[lava] = Material::Lava;

        TerrainGenerator::new().insert_transitions(&mut buffer);

        let window: Vec<usize> = buffer.chunk_indices().collect();
        for i in window {
            let (x, y) = buffer.coords(i);
            let expected = if i == pond {
                Material::ShallowWater
            } else if i == lava {
                Material::Lava
            } else if x >= 5 {
                Material::Stone
            } else if x == 4 {
                Material::GrassStoneEdge
            } else {
                Material::Grass
            };
            assert_eq!(buffer.materials[i], expected, "cell ({}, {})", x, y);
        }
    }

    #[test]
    fn test_majority_pass_fills_hole() {
        let mut buffer = TerrainBuffer::new(ChunkCoord::new(0, 0), 4, 0);
        buffer.groups = vec![RegionGroup::Rock; 16];
        buffer.groups[5] = RegionGroup::Frost;
        majority_pass(&mut buffer);
        assert!(buffer.groups.iter().all(|g| *g == RegionGroup::Rock));
    }

    #[test]
    fn test_despeckle_clears_checkerboard_speck() {
        let mut buffer = TerrainBuffer::new(ChunkCoord::new(0, 0), 6, 0);
        for i in 0..buffer.groups.len() {
            let (x, _) = buffer.coords(i);
            buffer.groups[i] = if x < 3 {
                RegionGroup::Desert
            } else {
                RegionGroup::Earth
            };
        }
        let speck = buffer.index(1, 1).unwrap_or(0);
        buffer.groups[speck] = RegionGroup::Frost;
        assert!(despeckle_pass(&mut buffer));
        assert_eq!(buffer.groups[speck], RegionGroup::Desert);
        assert!(!despeckle_pass(&mut buffer));
    }

    #[test]
    fn test_biomes_disabled_gives_grassland() {
        let config = GenerationConfig {
            enable_biomes: false,
            ..GenerationConfig::for_testing(3)
        };
        let map = TerrainGenerator::new().region_map(ChunkCoord::new(2, -1), &config);
        let counts = map.group_counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&RegionGroup::Grassland), Some(&(16 * 16)));
    }

    #[test]
    fn test_grass_dominant_chunk_is_grass_family() {
        let chunk = TerrainGenerator::new()
            .generate(ChunkCoord::new(0, 0), &grass_only(8))
            .unwrap();
        assert_eq!(chunk.tiles().len(), 64 * 64);
        for tile in chunk.tiles() {
            assert_eq!(tile.material.region_group(), Some(RegionGroup::Grassland));
        }
    }

    #[test]
    fn test_accent_rate_close_to_config() {
        let chunk = TerrainGenerator::new()
            .generate(ChunkCoord::new(1, 1), &grass_only(21))
            .unwrap();
        let accents = chunk
            .tiles()
            .iter()
            .filter(|t| t.material != Material::Grass)
            .count();
        let rate = accents as f32 / chunk.tiles().len() as f32;
        assert!(rate > 0.02 && rate < 0.12, "accent rate {}", rate);
    }

    #[test]
    fn test_region_map_ring_is_addressable() {
        let config = GenerationConfig::for_testing(4);
        let map = TerrainGenerator::new().region_map(ChunkCoord::new(0, 0), &config);
        assert!(map.group_at(-1, -1).is_some());
        assert!(map.group_at(16, 16).is_some());
        assert!(map.group_at(17, 0).is_none());
        assert!(map.component_count() >= 1);
    }

    #[test]
    fn test_smoothing_removes_isolated_cells() {
        let rough = GenerationConfig {
            region_scale: 2.0,
            enable_clustering: false,
            ..GenerationConfig::for_testing(17)
        };
        let smooth = GenerationConfig {
            enable_clustering: true,
            smoothing_iterations: 3,
            ..rough.clone()
        };
        let generator = TerrainGenerator::new();
        let before = generator.region_map(ChunkCoord::new(0, 0), &rough);
        let after = generator.region_map(ChunkCoord::new(0, 0), &smooth);
        assert!(after.isolated_cells() <= before.isolated_cells());
        assert!(after.component_count() <= before.component_count());
    }
}
