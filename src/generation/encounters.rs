//! # Encounter Generation
//!
//! Deterministic per-chunk spawn planning. Enemies are placed on walkable,
//! non-fluid tiles with kinds weighted by the region group underfoot; some
//! chunks also get a boss.

use super::{derive_seed, utils, GenerationConfig};
use crate::combat::{BossType, EnemyKind};
use crate::game::{Chunk, ChunkCoord, Position, RegionGroup};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const BOSS_SALT: u64 = 11;
const ENCOUNTER_SALT: u64 = 12;

/// What to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    Enemy(EnemyKind),
    Boss(BossType),
}

/// A planned spawn on a world tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub tile: Position,
    pub kind: SpawnKind,
}

/// Plans encounters for generated chunks.
#[derive(Debug, Clone, Default)]
pub struct EncounterGenerator;

impl EncounterGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Spawn points for a chunk. Same chunk and config, same plan.
    pub fn plan(&self, chunk: &Chunk, config: &GenerationConfig) -> Vec<SpawnPoint> {
        let mut candidates: Vec<(Position, Option<RegionGroup>)> = chunk
            .iter_world()
            .filter(|(_, tile)| tile.walkable && !tile.material.is_fluid())
            .map(|(pos, tile)| (pos, tile.material.region_group()))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut rng = utils::chunk_rng(derive_seed(config.seed, ENCOUNTER_SALT), chunk.coord);
        let mut spawns = Vec::new();

        if self.has_boss(chunk.coord, config) {
            let center = chunk.coord.origin(chunk.size)
                + Position::new(chunk.size as i32 / 2, chunk.size as i32 / 2);
            let lair = candidates
                .iter()
                .enumerate()
                .min_by_key(|(_, (pos, _))| pos.distance_squared(center))
                .map(|(index, _)| index);
            if let (Some(index), Some(boss)) = (lair, BossType::ALL.choose(&mut rng)) {
                let (tile, _) = candidates.swap_remove(index);
                log::debug!(
                    "boss {} planned in chunk ({}, {})",
                    boss.name(),
                    chunk.coord.x,
                    chunk.coord.y
                );
                spawns.push(SpawnPoint {
                    tile,
                    kind: SpawnKind::Boss(*boss),
                });
            }
        }

        let expected = candidates.len() as f32 * config.enemy_density.max(0.0) / 100.0;
        let mut count = expected.floor() as usize;
        if rng.gen::<f32>() < expected.fract() {
            count += 1;
        }
        let count = count.min(candidates.len());

        for (tile, group) in candidates.choose_multiple(&mut rng, count) {
            let kind = pick_kind(*group, &mut rng);
            spawns.push(SpawnPoint {
                tile: *tile,
                kind: SpawnKind::Enemy(kind),
            });
        }
        spawns
    }

    /// Whether a chunk gets a boss. The origin chunk never does.
    pub fn has_boss(&self, coord: ChunkCoord, config: &GenerationConfig) -> bool {
        if coord == ChunkCoord::new(0, 0) {
            return false;
        }
        super::cell_hash(derive_seed(config.seed, BOSS_SALT), coord.x, coord.y) < config.boss_chance
    }
}

fn kind_weights(group: Option<RegionGroup>) -> &'static [(EnemyKind, u32)] {
    match group {
        Some(RegionGroup::Grassland) => &[
            (EnemyKind::Slime, 4),
            (EnemyKind::Goblin, 4),
            (EnemyKind::Orc, 1),
            (EnemyKind::SkeletonArcher, 1),
        ],
        Some(RegionGroup::Desert) => &[
            (EnemyKind::Skeleton, 3),
            (EnemyKind::SkeletonArcher, 3),
            (EnemyKind::Goblin, 1),
        ],
        Some(RegionGroup::Earth) => &[(EnemyKind::Goblin, 3), (EnemyKind::Orc, 2), (EnemyKind::Slime, 2)],
        Some(RegionGroup::Rock) | Some(RegionGroup::Cliffs) => &[
            (EnemyKind::Orc, 3),
            (EnemyKind::Skeleton, 2),
            (EnemyKind::DarkMage, 1),
        ],
        Some(RegionGroup::Frost) => &[
            (EnemyKind::DarkMage, 3),
            (EnemyKind::Skeleton, 2),
            (EnemyKind::Slime, 1),
        ],
        None => &[(EnemyKind::Slime, 1), (EnemyKind::Goblin, 1)],
    }
}

fn pick_kind<R: Rng>(group: Option<RegionGroup>, rng: &mut R) -> EnemyKind {
    let table = kind_weights(group);
    match WeightedIndex::new(table.iter().map(|(_, weight)| *weight)) {
        Ok(dist) => table[dist.sample(rng)].0,
        Err(err) => {
            log::warn!("bad encounter weights for {:?}: {}", group, err);
            EnemyKind::Slime
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Material, Tile};

    fn grass_chunk(coord: ChunkCoord) -> Chunk {
        let tiles = vec![Tile::new(Material::Grass); 16 * 16];
        Chunk::from_tiles(coord, 16, tiles).unwrap()
    }

    #[test]
    fn test_plan_is_deterministic() {
        let config = GenerationConfig::for_testing(5);
        let chunk = grass_chunk(ChunkCoord::new(2, -1));
        let generator = EncounterGenerator::new();
        assert_eq!(generator.plan(&chunk, &config), generator.plan(&chunk, &config));
    }

    #[test]
    fn test_density_scales_count() {
        let mut config = GenerationConfig::for_testing(5);
        config.enemy_density = 5.0;
        let spawns = EncounterGenerator::new().plan(&grass_chunk(ChunkCoord::new(1, 1)), &config);
        // 256 walkable tiles at 5 per 100
        assert!((12..=13).contains(&spawns.len()), "{}", spawns.len());
        assert!(spawns.iter().all(|s| matches!(
            s.kind,
            SpawnKind::Enemy(EnemyKind::Slime | EnemyKind::Goblin | EnemyKind::Orc | EnemyKind::SkeletonArcher)
        )));
    }

    #[test]
    fn test_no_spawns_on_water() {
        let mut config = GenerationConfig::for_testing(5);
        config.enemy_density = 50.0;
        let tiles = vec![Tile::new(Material::ShallowWater); 16 * 16];
        let chunk = Chunk::from_tiles(ChunkCoord::new(1, 0), 16, tiles).unwrap();
        assert!(EncounterGenerator::new().plan(&chunk, &config).is_empty());
    }

    #[test]
    fn test_origin_never_has_boss() {
        let mut config = GenerationConfig::for_testing(5);
        config.boss_chance = 1.0;
        let generator = EncounterGenerator::new();
        assert!(!generator.has_boss(ChunkCoord::new(0, 0), &config));
        assert!(generator.has_boss(ChunkCoord::new(0, 1), &config));

        let spawns = generator.plan(&grass_chunk(ChunkCoord::new(0, 1)), &config);
        assert!(matches!(spawns[0].kind, SpawnKind::Boss(_)));
    }
}
