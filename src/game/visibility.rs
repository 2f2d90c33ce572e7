//! # Visibility
//!
//! Radius-bounded fog-of-war. Cells close to the observer are always seen;
//! further cells need a clear Bresenham line. Anything seen is also
//! explored, and explored cells stay explored.

use super::{Position, World, WorldPos};

/// Recomputes every loaded chunk's visible mask around an observer.
///
/// Intermediate cells on the line must be transparent; unloaded cells block.
/// With `radius <= 0` only the observer's own tile is marked.
pub fn update_visibility(observer: WorldPos, world: &mut World, radius: i32, near_radius: i32) {
    let origin = world.clamp_tile(world.world_to_tile(observer));

    for chunk in world.chunks_mut() {
        chunk.clear_visible();
    }

    world.reveal(origin);
    if radius <= 0 {
        return;
    }

    let radius_sq = i64::from(radius) * i64::from(radius);
    let near_sq = i64::from(near_radius.max(0)) * i64::from(near_radius.max(0));
    let mut seen = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let cell = Position::new(origin.x + dx, origin.y + dy);
            let dist_sq = origin.distance_squared(cell);
            if dist_sq > radius_sq || world.tile(cell).is_none() {
                continue;
            }
            if dist_sq <= near_sq || has_line_of_sight(world, origin, cell) {
                seen.push(cell);
            }
        }
    }

    for cell in seen {
        world.reveal(cell);
    }
}

/// Whether every cell strictly between `from` and `to` is transparent.
pub fn has_line_of_sight(world: &World, from: Position, to: Position) -> bool {
    bresenham_line(from, to)
        .iter()
        .skip(1)
        .take_while(|cell| **cell != to)
        .all(|cell| world.is_transparent(*cell))
}

/// Integer Bresenham line including both endpoints.
///
/// # Examples
///
/// ```
/// use emberfall::{bresenham_line, Position};
///
/// let line = bresenham_line(Position::new(0, 0), Position::new(3, 1));
/// assert_eq!(line.first(), Some(&Position::new(0, 0)));
/// assert_eq!(line.last(), Some(&Position::new(3, 1)));
/// assert_eq!(line.len(), 4);
/// ```
pub fn bresenham_line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut line = Vec::with_capacity((dx - dy + 1) as usize);

    loop {
        line.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenerationConfig, Material, MapSource, PrebuiltMap, Tile};

    /// Open grass map with a wall column at x = 5.
    fn walled_world() -> World {
        let size = 32;
        let mut materials = vec![Material::Grass; size * size];
        for y in 0..size {
            materials[y * size + 5] = Material::CliffWall;
        }
        let map = PrebuiltMap::from_materials(size as u32, size as u32, &materials).unwrap();
        let mut world = World::with_source(GenerationConfig::for_testing(1), MapSource::Prebuilt(map));
        world.load_around(Position::new(8, 8), 2);
        world
    }

    fn observer_at(world: &World, tile: Position) -> WorldPos {
        world.tile_center(tile)
    }

    #[test]
    fn test_wall_occludes() {
        let mut world = walled_world();
        let eye = observer_at(&world, Position::new(1, 10));
        update_visibility(eye, &mut world, 10, 3);

        assert!(world.is_visible(Position::new(4, 10)));
        assert!(world.is_visible(Position::new(5, 10)));
        assert!(!world.is_visible(Position::new(8, 10)));
        assert!(!world.is_explored(Position::new(8, 10)));
    }

    #[test]
    fn test_near_radius_sees_through_walls() {
        let mut world = walled_world();
        let eye = observer_at(&world, Position::new(4, 10));
        update_visibility(eye, &mut world, 10, 3);
        assert!(world.is_visible(Position::new(6, 10)));
        assert!(!world.is_visible(Position::new(9, 10)));
    }

    #[test]
    fn test_explored_persists_after_moving_away() {
        let mut world = walled_world();
        update_visibility(observer_at(&world, Position::new(10, 10)), &mut world, 6, 3);
        assert!(world.is_visible(Position::new(14, 10)));

        update_visibility(observer_at(&world, Position::new(25, 25)), &mut world, 6, 3);
        assert!(!world.is_visible(Position::new(14, 10)));
        assert!(world.is_explored(Position::new(14, 10)));
        assert!(world.chunks().all(|c| c.masks_consistent()));
    }

    #[test]
    fn test_zero_radius_marks_only_self() {
        let mut world = walled_world();
        update_visibility(observer_at(&world, Position::new(10, 10)), &mut world, 0, 3);
        let visible: usize = world.chunks().map(|c| c.visible_count()).sum();
        assert_eq!(visible, 1);
        assert!(world.is_visible(Position::new(10, 10)));
    }

    #[test]
    fn test_observer_outside_world_is_clamped() {
        let mut world = walled_world();
        world.set_tile(Position::new(0, 0), Tile::new(Material::Grass)).unwrap();
        update_visibility(WorldPos::new(-500.0, -500.0), &mut world, 0, 0);
        assert!(world.is_visible(Position::new(0, 0)));
    }

    #[test]
    fn test_bresenham_is_symmetric_in_length() {
        let a = Position::new(-3, 2);
        let b = Position::new(7, -4);
        assert_eq!(bresenham_line(a, b).len(), bresenham_line(b, a).len());
    }
}
