//! Chunk generation through the public API.

use emberfall::{
    ChunkCoord, EmberfallError, EncounterGenerator, GenerationConfig, Generator, MapSource,
    Material, NoiseBackend, PrebuiltMap, RegionGroup, TerrainGenerator, World,
};

fn materials(config: &GenerationConfig, coord: ChunkCoord) -> Vec<Material> {
    TerrainGenerator::new()
        .generate(coord, config)
        .unwrap()
        .tiles()
        .iter()
        .map(|t| t.material)
        .collect()
}

#[test]
fn test_chunks_are_deterministic() {
    let config = GenerationConfig::new(2024);
    for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 5), ChunkCoord::new(7, -7)] {
        assert_eq!(materials(&config, coord), materials(&config, coord));
    }
}

#[test]
fn test_perlin_backend_is_deterministic() {
    let config = GenerationConfig {
        noise_backend: NoiseBackend::Perlin,
        ..GenerationConfig::for_testing(31)
    };
    assert_eq!(
        materials(&config, ChunkCoord::new(1, 2)),
        materials(&config, ChunkCoord::new(1, 2))
    );
}

#[test]
fn test_seed_changes_terrain() {
    let a = materials(&GenerationConfig::new(1), ChunkCoord::new(0, 0));
    let b = materials(&GenerationConfig::new(2), ChunkCoord::new(0, 0));
    assert_ne!(a, b);
}

#[test]
fn test_no_water_when_disabled() {
    let config = GenerationConfig {
        enable_water: false,
        ..GenerationConfig::new(55)
    };
    for y in -2..2 {
        for x in -2..2 {
            let tiles = materials(&config, ChunkCoord::new(x, y));
            assert!(
                tiles
                    .iter()
                    .all(|m| !matches!(m, Material::ShallowWater | Material::DeepWater)),
                "water in chunk ({}, {})",
                x,
                y
            );
        }
    }
}

#[test]
fn test_lava_disabled_means_no_lava() {
    let config = GenerationConfig {
        enable_lava: false,
        region_weights: emberfall::RegionWeights {
            desert: 0.0,
            grassland: 0.0,
            earth: 0.0,
            rock: 1.0,
            frost: 0.0,
        },
        ..GenerationConfig::new(9)
    };
    let tiles = materials(&config, ChunkCoord::new(0, 0));
    assert!(!tiles.contains(&Material::Lava));
    assert!(tiles
        .iter()
        .filter(|m| m.family() == emberfall::MaterialFamily::Land)
        .all(|m| matches!(m.region_group(), Some(RegionGroup::Rock) | Some(RegionGroup::Cliffs))));
}

#[test]
fn test_prebuilt_map_json_round_trip() {
    let mut cells = vec![Material::Grass; 20 * 12];
    cells[5] = Material::Lava;
    cells[40] = Material::DeepWater;
    let map = PrebuiltMap::from_materials(20, 12, &cells).unwrap();

    let parsed = PrebuiltMap::from_json(&map.to_json().unwrap()).unwrap();
    assert_eq!(parsed, map);
}

#[test]
fn test_prebuilt_chunk_outside_map_is_unavailable() {
    let map = PrebuiltMap::from_materials(16, 16, &vec![Material::Dirt; 256]).unwrap();
    let config = GenerationConfig::for_testing(1);
    let result = MapSource::Prebuilt(map).generate_chunk(ChunkCoord::new(3, 3), &config);
    assert!(matches!(result, Err(EmberfallError::ChunkUnavailable { x: 3, y: 3 })));
}

#[test]
fn test_streaming_stops_at_world_edge() {
    // for_testing: 4x4 chunks of 16 tiles, chunk coords -2..=1
    let mut world = World::new(GenerationConfig::for_testing(8));
    world.load_around(emberfall::Position::new(-32, -32), 1);
    assert_eq!(world.loaded_count(), 4);
    assert!(world.chunk(ChunkCoord::new(-3, -2)).is_none());
    assert_eq!(world.take_new_chunks().len(), 4);
}

#[test]
fn test_encounters_stay_on_walkable_ground() {
    let config = GenerationConfig {
        enemy_density: 5.0,
        boss_chance: 1.0,
        ..GenerationConfig::new(404)
    };
    let encounters = EncounterGenerator::new();
    let mut world = World::new(config.clone());
    world.load_around(emberfall::Position::new(0, 0), 1);

    let mut total = 0;
    for chunk in world.chunks() {
        for spawn in encounters.plan(chunk, &config) {
            let tile = world.tile(spawn.tile).unwrap();
            assert!(tile.walkable && !tile.material.is_fluid());
            total += 1;
        }
    }
    assert!(total > 0);
}
