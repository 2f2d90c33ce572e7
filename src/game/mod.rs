//! # Game Module
//!
//! Core world representation, visibility, simulation clock and the state
//! orchestrator that ties the world and its combatants together.
//!
//! This module contains the fundamental building blocks of Emberfall:
//! - Tile and chunk storage with lazy, cached generation
//! - Fog-of-war visibility over the chunked grid
//! - The fixed-timestep clock and the per-tick event queue
//! - The game state orchestrator that owns the player and all enemies

pub mod chunk;
pub mod clock;
pub mod events;
pub mod settings;
pub mod state;
pub mod tile;
pub mod visibility;
pub mod world;

pub use chunk::*;
pub use clock::*;
pub use events::*;
pub use settings::*;
pub use state::*;
pub use tile::*;
pub use visibility::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a 2D tile coordinate in the game world.
///
/// # Examples
///
/// ```
/// use emberfall::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos.distance_squared(Position::new(13, 9)), 25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Squared Euclidean distance in tiles. Avoids the square root for range checks.
    pub fn distance_squared(self, other: Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Grid directions used by generation walks and neighbour scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Returns the 4 cardinal directions.
    pub fn cardinal() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }
}

/// A continuous position (or vector) in world units.
///
/// Tiles are `config::TILE_SIZE` world units wide; combatants and projectiles
/// live in this space while terrain lives in [`Position`] space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    /// Creates a new world-space point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(self, other: WorldPos) -> f32 {
        (other - self).length_squared()
    }

    pub fn distance(self, other: WorldPos) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Returns the unit vector in this direction, or `fallback` when the
    /// vector is too short to normalize.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::WorldPos;
    ///
    /// let fallback = WorldPos::new(1.0, 0.0);
    /// assert_eq!(WorldPos::zero().normalized_or(fallback), fallback);
    /// assert_eq!(WorldPos::new(0.0, 3.0).normalized_or(fallback), WorldPos::new(0.0, 1.0));
    /// ```
    pub fn normalized_or(self, fallback: WorldPos) -> WorldPos {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            fallback
        } else {
            WorldPos::new(self.x / length, self.y / length)
        }
    }

    /// Rotates the vector by `radians` counter-clockwise.
    pub fn rotated(self, radians: f32) -> WorldPos {
        let (sin, cos) = radians.sin_cos();
        WorldPos::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl std::ops::Add for WorldPos {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for WorldPos {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f32> for WorldPos {
    type Output = Self;

    fn mul(self, scale: f32) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }
}

/// Which way a combatant's sprite faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
    Up,
    Down,
}

impl Facing {
    /// Unit vector for this facing, used whenever a direction cannot be derived.
    pub fn unit_vector(self) -> WorldPos {
        match self {
            Facing::Left => WorldPos::new(-1.0, 0.0),
            Facing::Right => WorldPos::new(1.0, 0.0),
            Facing::Up => WorldPos::new(0.0, -1.0),
            Facing::Down => WorldPos::new(0.0, 1.0),
        }
    }

    /// Token used in sprite keys.
    pub fn as_token(self) -> &'static str {
        match self {
            Facing::Left => "left",
            Facing::Right => "right",
            Facing::Up => "up",
            Facing::Down => "down",
        }
    }
}

/// Unique identifier for combatants.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
