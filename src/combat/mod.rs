//! # Combat Module
//!
//! Combatants, their shared state machine and the enemy and boss policies
//! that drive them.
//!
//! A [`Combatant`] is a [`CombatantCore`] (everything every fighter has) plus a
//! [`Behavior`] that picks what it does each tick. Per-kind numbers live in a
//! data-driven [`Catalog`]; only ability selection is written as code.

pub mod boss;
pub mod catalog;
pub mod combatant;
pub mod enemy;
pub mod projectile;
pub mod state_machine;

pub use boss::*;
pub use catalog::*;
pub use combatant::*;
pub use enemy::*;
pub use projectile::*;
pub use state_machine::*;

use crate::game::EventQueue;
use serde::{Deserialize, Serialize};

/// Identifies a cooldown-gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    Attack,
    Ranged,
    Volley,
    Contact,
    Dash,
    Jump,
    Transform,
    SuperAttack,
    Summon,
    Charge,
    GroundSlam,
    Teleport,
    Barrage,
    BoulderThrow,
    Quake,
}

/// What a combatant is, used for catalog lookups and sprite prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    Player,
    Enemy(EnemyKind),
    Boss(BossType),
}

impl CombatantKind {
    pub fn name(self) -> &'static str {
        match self {
            CombatantKind::Player => "player",
            CombatantKind::Enemy(kind) => kind.name(),
            CombatantKind::Boss(boss) => boss.name(),
        }
    }
}

/// Everything a combatant may touch while updating.
pub struct TickContext<'a> {
    /// Simulation time in seconds
    pub now: f32,
    pub events: &'a mut EventQueue,
    /// Projectiles leaving this area are discarded
    pub bounds: WorldBounds,
}
