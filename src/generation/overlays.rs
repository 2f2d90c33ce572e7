//! Fluid and hazard passes applied on top of the base terrain.

use super::terrain::{TerrainBuffer, TerrainFields, NEIGHBOURS_4, RIVER_SALT};
use super::{noise_field::derive_seed, utils, GenerationConfig};
use crate::game::{ChunkCoord, Direction, Material, RegionGroup};
use pathfinding::prelude::bfs_reach;
use rand::seq::SliceRandom;
use rand::Rng;

/// Chance that a river step heads for its target side.
const RIVER_BIAS: f64 = 0.6;

/// Floods cells above the water threshold with shallow water. Cliffs stay dry.
pub(crate) fn apply_water(buffer: &mut TerrainBuffer, config: &GenerationConfig, fields: &TerrainFields) {
    for i in 0..buffer.materials.len() {
        if buffer.groups[i] == RegionGroup::Cliffs {
            continue;
        }
        let (x, y) = buffer.coords(i);
        let world = buffer.world(x, y);
        if fields.water.sample(world.x as f32, world.y as f32) > config.water_threshold {
            buffer.materials[i] = Material::ShallowWater;
        }
    }
}

/// Dries out water bodies smaller than `min_size`.
///
/// Bodies touching the buffer edge may continue outside it, so they are
/// always kept.
pub(crate) fn remove_small_lakes(buffer: &mut TerrainBuffer, min_size: usize) {
    let mut seen = vec![false; buffer.materials.len()];
    for start in 0..buffer.materials.len() {
        if seen[start] || !buffer.is_fluid(start) {
            continue;
        }

        let body: Vec<usize> = bfs_reach(start, |&i| {
            buffer
                .neighbours(i, &NEIGHBOURS_4)
                .filter(|&n| buffer.is_fluid(n))
                .collect::<Vec<_>>()
        })
        .collect();

        let mut touches_edge = false;
        for &i in &body {
            seen[i] = true;
            let (x, y) = buffer.coords(i);
            touches_edge |= buffer.on_buffer_edge(x, y);
        }

        if body.len() < min_size && !touches_edge {
            for i in body {
                buffer.materials[i] = buffer.land[i];
            }
        }
    }
}

/// Deepens water whose noise is above the deep threshold and whose four
/// neighbours are all water.
pub(crate) fn apply_deep_water(
    buffer: &mut TerrainBuffer,
    config: &GenerationConfig,
    fields: &TerrainFields,
) {
    let snapshot: Vec<bool> = (0..buffer.materials.len())
        .map(|i| buffer.is_fluid(i))
        .collect();

    for i in 0..snapshot.len() {
        if !snapshot[i] {
            continue;
        }
        let (x, y) = buffer.coords(i);
        let surrounded = NEIGHBOURS_4.iter().all(|(dx, dy)| {
            buffer
                .index(x + dx, y + dy)
                .map_or(false, |n| snapshot[n])
        });
        if !surrounded {
            continue;
        }
        let world = buffer.world(x, y);
        if fields.water.sample(world.x as f32, world.y as f32) > config.deep_water_threshold {
            buffer.materials[i] = Material::DeepWater;
        }
    }
}

/// Carves at most one river inside the chunk window, then prunes dead ends.
///
/// The walk starts on a lake cell that borders land and heads for a randomly
/// chosen chunk side. It stops on cliffs, on the chunk boundary or after
/// `river_max_steps` steps.
pub(crate) fn carve_river(buffer: &mut TerrainBuffer, config: &GenerationConfig, coord: ChunkCoord) {
    let mut rng = utils::chunk_rng(derive_seed(config.seed, RIVER_SALT), coord);
    if !rng.gen_bool(config.river_chance as f64) {
        return;
    }

    let lake: Vec<bool> = (0..buffer.materials.len())
        .map(|i| buffer.is_fluid(i))
        .collect();
    let starts: Vec<usize> = buffer
        .chunk_indices()
        .filter(|&i| {
            lake[i]
                && buffer.materials[i] == Material::ShallowWater
                && buffer
                    .neighbours(i, &NEIGHBOURS_4)
                    .any(|n| !lake[n] && buffer.materials[n] != Material::CliffWall)
        })
        .collect();
    let Some(&start) = starts.choose(&mut rng) else {
        return;
    };

    let target = *Direction::cardinal()
        .choose(&mut rng)
        .unwrap_or(&Direction::East);
    let sideways: Vec<Direction> = Direction::cardinal()
        .into_iter()
        .filter(|d| *d != target.opposite())
        .collect();

    let mut river = vec![false; buffer.materials.len()];
    let (mut x, mut y) = buffer.coords(start);
    for _ in 0..config.river_max_steps {
        let direction = if rng.gen_bool(RIVER_BIAS) {
            target
        } else {
            *sideways.choose(&mut rng).unwrap_or(&target)
        };
        let delta = direction.to_delta();
        let (nx, ny) = (x + delta.x, y + delta.y);
        if !buffer.in_chunk(nx, ny) {
            break;
        }
        let Some(next) = buffer.index(nx, ny) else {
            break;
        };
        if buffer.materials[next] == Material::CliffWall {
            break;
        }
        if !buffer.is_fluid(next) {
            buffer.materials[next] = Material::ShallowWater;
            river[next] = true;
        }
        x = nx;
        y = ny;
        if buffer.on_chunk_boundary(x, y) {
            break;
        }
    }

    let carved = river.iter().filter(|c| **c).count();
    let pruned = prune_river_stubs(buffer, &mut river, &lake);
    log::trace!(
        "River in chunk ({}, {}): {} cells carved, {} pruned",
        coord.x,
        coord.y,
        carved,
        pruned
    );
}

/// Removes river cells that dead-end away from a lake and the chunk boundary.
/// Repeats until nothing changes. Returns how many cells were removed.
pub(crate) fn prune_river_stubs(buffer: &mut TerrainBuffer, river: &mut [bool], lake: &[bool]) -> usize {
    let mut removed = 0;
    loop {
        let stubs: Vec<usize> = (0..river.len())
            .filter(|&i| river[i])
            .filter(|&i| {
                let (x, y) = buffer.coords(i);
                if buffer.on_chunk_boundary(x, y) {
                    return false;
                }
                let touches_lake = buffer.neighbours(i, &NEIGHBOURS_4).any(|n| lake[n]);
                let water_neighbours = buffer
                    .neighbours(i, &NEIGHBOURS_4)
                    .filter(|&n| buffer.is_fluid(n))
                    .count();
                water_neighbours <= 1 && !touches_lake
            })
            .collect();

        if stubs.is_empty() {
            return removed;
        }
        for i in stubs {
            river[i] = false;
            buffer.materials[i] = buffer.land[i];
            removed += 1;
        }
    }
}

/// Places lava on dry rock cells above the lava threshold.
pub(crate) fn apply_lava(buffer: &mut TerrainBuffer, config: &GenerationConfig, fields: &TerrainFields) {
    for i in 0..buffer.materials.len() {
        if buffer.groups[i] != RegionGroup::Rock || buffer.is_fluid(i) {
            continue;
        }
        let (x, y) = buffer.coords(i);
        let world = buffer.world(x, y);
        if fields.lava.sample(world.x as f32, world.y as f32) > config.lava_threshold {
            buffer.materials[i] = Material::Lava;
        }
    }
}
