//! Fixed-size square pieces of the world map.

use crate::game::{Position, Tile};
use serde::{Deserialize, Serialize};

/// Coordinate of a chunk in chunk space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk containing a world tile.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{ChunkCoord, Position};
    ///
    /// assert_eq!(ChunkCoord::from_tile(Position::new(33, 5), 32), ChunkCoord::new(1, 0));
    /// assert_eq!(ChunkCoord::from_tile(Position::new(-1, 0), 32), ChunkCoord::new(-1, 0));
    /// ```
    pub fn from_tile(tile: Position, chunk_size: u32) -> Self {
        let size = chunk_size as i32;
        Self::new(tile.x.div_euclid(size), tile.y.div_euclid(size))
    }

    /// World tile of this chunk's top-left cell.
    pub fn origin(self, chunk_size: u32) -> Position {
        let size = chunk_size as i32;
        Position::new(self.x * size, self.y * size)
    }
}

/// A square block of tiles with its visibility masks.
///
/// `explored` only ever gains cells. `visible` is rebuilt on every
/// visibility update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub size: u32,
    tiles: Vec<Tile>,
    visible: Vec<bool>,
    explored: Vec<bool>,
    pub generated: bool,
}

impl Chunk {
    /// Creates an ungenerated chunk filled with default tiles.
    pub fn new(coord: ChunkCoord, size: u32) -> Self {
        let cells = (size * size) as usize;
        Self {
            coord,
            size,
            tiles: vec![Tile::default(); cells],
            visible: vec![false; cells],
            explored: vec![false; cells],
            generated: false,
        }
    }

    /// Wraps a finished row-major tile buffer into a generated chunk.
    pub fn from_tiles(coord: ChunkCoord, size: u32, tiles: Vec<Tile>) -> Option<Self> {
        if tiles.len() != (size * size) as usize {
            return None;
        }
        let cells = tiles.len();
        Some(Self {
            coord,
            size,
            tiles,
            visible: vec![false; cells],
            explored: vec![false; cells],
            generated: true,
        })
    }

    fn index(&self, local_x: i32, local_y: i32) -> Option<usize> {
        let size = self.size as i32;
        if local_x < 0 || local_y < 0 || local_x >= size || local_y >= size {
            return None;
        }
        Some((local_y * size + local_x) as usize)
    }

    /// Converts a world tile to this chunk's local coordinates.
    pub fn local_of(&self, world: Position) -> Option<(i32, i32)> {
        let origin = self.coord.origin(self.size);
        let local = world - origin;
        self.index(local.x, local.y).map(|_| (local.x, local.y))
    }

    pub fn tile(&self, local_x: i32, local_y: i32) -> Option<&Tile> {
        self.index(local_x, local_y).map(|i| &self.tiles[i])
    }

    pub fn set_tile(&mut self, local_x: i32, local_y: i32, tile: Tile) -> bool {
        match self.index(local_x, local_y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn is_visible(&self, local_x: i32, local_y: i32) -> bool {
        self.index(local_x, local_y)
            .map(|i| self.visible[i])
            .unwrap_or(false)
    }

    pub fn is_explored(&self, local_x: i32, local_y: i32) -> bool {
        self.index(local_x, local_y)
            .map(|i| self.explored[i])
            .unwrap_or(false)
    }

    /// Marks a cell visible, which also marks it explored.
    pub fn reveal(&mut self, local_x: i32, local_y: i32) {
        if let Some(i) = self.index(local_x, local_y) {
            self.visible[i] = true;
            self.explored[i] = true;
        }
    }

    pub fn clear_visible(&mut self) {
        self.visible.iter_mut().for_each(|cell| *cell = false);
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|cell| **cell).count()
    }

    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|cell| **cell).count()
    }

    /// Iterates over `(world position, tile)` pairs.
    pub fn iter_world(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        let origin = self.coord.origin(self.size);
        let size = self.size as i32;
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            let i = i as i32;
            (origin + Position::new(i % size, i / size), tile)
        })
    }

    /// True when every visible cell is also explored.
    pub fn masks_consistent(&self) -> bool {
        self.visible
            .iter()
            .zip(self.explored.iter())
            .all(|(visible, explored)| !*visible || *explored)
    }
}
