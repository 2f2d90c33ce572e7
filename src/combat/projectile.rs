//! Projectiles fired by combatants.

use crate::game::{Facing, WorldPos};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: WorldPos,
    pub max: WorldPos,
}

impl WorldBounds {
    pub fn new(min: WorldPos, max: WorldPos) -> Self {
        Self { min, max }
    }

    /// Bounds large enough to never discard anything.
    pub fn unbounded() -> Self {
        Self::new(WorldPos::new(f32::MIN, f32::MIN), WorldPos::new(f32::MAX, f32::MAX))
    }

    pub fn contains(&self, point: WorldPos) -> bool {
        point.x >= self.min.x && point.y >= self.min.y && point.x <= self.max.x && point.y <= self.max.y
    }

    pub fn clamp(&self, point: WorldPos) -> WorldPos {
        WorldPos::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }
}

/// Launch parameters shared by every projectile of one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileProfile {
    pub speed: f32,
    pub damage: i32,
    pub max_lifetime: f32,
    pub radius: f32,
}

impl Default for ProjectileProfile {
    fn default() -> Self {
        Self {
            speed: 300.0,
            damage: 8,
            max_lifetime: 2.0,
            radius: 6.0,
        }
    }
}

/// A moving damage source owned by the combatant that fired it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub position: WorldPos,
    /// Unit vector
    pub direction: WorldPos,
    pub speed: f32,
    pub damage: i32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub radius: f32,
    pub active: bool,
}

impl Projectile {
    /// Fires from `origin` along `direction`. A zero direction uses `facing`.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{Facing, Projectile, ProjectileProfile, WorldPos};
    ///
    /// let shot = Projectile::fire(WorldPos::zero(), WorldPos::zero(), Facing::Left, &ProjectileProfile::default());
    /// assert_eq!(shot.direction, WorldPos::new(-1.0, 0.0));
    /// ```
    pub fn fire(origin: WorldPos, direction: WorldPos, facing: Facing, profile: &ProjectileProfile) -> Self {
        Self {
            position: origin,
            direction: direction.normalized_or(facing.unit_vector()),
            speed: profile.speed,
            damage: profile.damage,
            lifetime: 0.0,
            max_lifetime: profile.max_lifetime,
            radius: profile.radius,
            active: true,
        }
    }

    /// Moves the projectile and retires it once expired or out of bounds.
    pub fn update(&mut self, dt: f32, bounds: &WorldBounds) {
        if !self.active {
            return;
        }
        self.position = self.position + self.direction * (self.speed * dt);
        self.lifetime += dt;
        if self.lifetime >= self.max_lifetime || !bounds.contains(self.position) {
            self.active = false;
        }
    }

    /// Whether the projectile overlaps a circle.
    pub fn hits(&self, center: WorldPos, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.active && self.position.distance_squared(center) <= reach * reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_expires() {
        let mut shot = Projectile::fire(
            WorldPos::zero(),
            WorldPos::new(1.0, 0.0),
            Facing::Right,
            &ProjectileProfile {
                max_lifetime: 0.5,
                ..ProjectileProfile::default()
            },
        );
        shot.update(0.3, &WorldBounds::unbounded());
        assert!(shot.active);
        assert!((shot.position.x - 90.0).abs() < 1e-3);
        shot.update(0.3, &WorldBounds::unbounded());
        assert!(!shot.active);
    }

    #[test]
    fn test_projectile_leaves_bounds() {
        let bounds = WorldBounds::new(WorldPos::zero(), WorldPos::new(100.0, 100.0));
        let mut shot = Projectile::fire(
            WorldPos::new(95.0, 50.0),
            WorldPos::new(1.0, 0.0),
            Facing::Right,
            &ProjectileProfile::default(),
        );
        shot.update(0.1, &bounds);
        assert!(!shot.active);
        assert!(!shot.hits(shot.position, 100.0));
    }
}
