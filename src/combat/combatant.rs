//! # Combatants
//!
//! Shared state for every fighter plus the behaviour variant that decides
//! what it does each tick.

use super::{
    boss, enemy, AbilityId, BossBrain, BossType, Catalog, CombatState, CombatantKind, EnemyBrain,
    EnemyKind, KindProfile, Projectile, ProjectileProfile, StateMachine, Stats, TickContext,
    WorldBounds,
};
use crate::game::{new_entity_id, EntityId, Facing, WorldPos};
use crate::{config, EmberfallError, EmberfallResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Remaining cooldown per ability, in seconds. Never negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownTimers {
    timers: HashMap<AbilityId, f32>,
}

impl CooldownTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a cooldown.
    pub fn start(&mut self, ability: AbilityId, seconds: f32) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.timers.insert(ability, seconds);
    }

    pub fn remaining(&self, ability: AbilityId) -> f32 {
        self.timers.get(&ability).copied().unwrap_or(0.0)
    }

    pub fn is_ready(&self, ability: AbilityId) -> bool {
        self.remaining(ability) <= 0.0
    }

    /// Counts every timer down by `dt`, stopping at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{AbilityId, CooldownTimers};
    ///
    /// let mut timers = CooldownTimers::new();
    /// timers.start(AbilityId::Attack, 0.5);
    /// timers.tick(10.0);
    /// assert_eq!(timers.remaining(AbilityId::Attack), 0.0);
    /// ```
    pub fn tick(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        for remaining in self.timers.values_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }
    }

    pub fn as_map(&self) -> &HashMap<AbilityId, f32> {
        &self.timers
    }
}

/// Result of a damage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead or no damage
    Ignored,
    Hurt,
    Killed,
}

/// State every combatant has regardless of behaviour.
#[derive(Debug, Clone)]
pub struct CombatantCore {
    pub id: EntityId,
    pub kind: CombatantKind,
    pub position: WorldPos,
    pub spawn: WorldPos,
    health: i32,
    max_health: i32,
    pub machine: StateMachine,
    pub cooldowns: CooldownTimers,
    pub stats: Stats,
    pub projectiles: Vec<Projectile>,
    pub aggroed: bool,
    pub corpse_ttl: f32,
}

impl CombatantCore {
    fn from_profile(kind: CombatantKind, position: WorldPos, profile: &KindProfile) -> Self {
        let max_health = profile.max_health.max(1);
        Self {
            id: new_entity_id(),
            kind,
            position,
            spawn: position,
            health: max_health,
            max_health,
            machine: StateMachine::new(profile.sprite_prefix.clone(), profile.animation.clone()),
            cooldowns: CooldownTimers::new(),
            stats: profile.stats.clone(),
            projectiles: Vec::new(),
            aggroed: false,
            corpse_ttl: profile.corpse_ttl,
        }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn health_ratio(&self) -> f32 {
        self.health as f32 / self.max_health as f32
    }

    pub fn is_dead(&self) -> bool {
        self.machine.is_dead()
    }

    pub fn facing(&self) -> Facing {
        self.machine.facing()
    }

    /// Faces left or right once the horizontal offset clears the deadzone.
    pub fn face_toward(&mut self, dx: f32) {
        if dx.abs() > config::FACING_DEADZONE {
            self.machine
                .set_facing(if dx < 0.0 { Facing::Left } else { Facing::Right });
        }
    }

    fn apply_damage(&mut self, amount: i32, now: f32) -> DamageOutcome {
        if self.is_dead() || amount <= 0 {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount).max(0);
        if self.health == 0 {
            self.machine.kill(now);
            DamageOutcome::Killed
        } else {
            self.machine.set_state(CombatState::Hurt);
            DamageOutcome::Hurt
        }
    }

    /// Launches a projectile owned by this combatant.
    pub fn fire(&mut self, direction: WorldPos, profile: &ProjectileProfile) {
        let shot = Projectile::fire(self.position, direction, self.facing(), profile);
        self.projectiles.push(shot);
    }

    fn update_projectiles(&mut self, dt: f32, bounds: &WorldBounds) {
        for projectile in self.projectiles.iter_mut() {
            projectile.update(dt, bounds);
        }
        self.projectiles.retain(|p| p.active);
    }
}

/// What drives a combatant.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Driven by input; only animation and cooldowns update on their own
    Player,
    Enemy(EnemyBrain),
    Boss(Box<BossBrain>),
}

/// A player, enemy or boss.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub core: CombatantCore,
    pub behavior: Behavior,
}

impl Combatant {
    /// Creates the player from its catalog profile.
    pub fn player(position: WorldPos, profile: &KindProfile) -> Self {
        Self {
            core: CombatantCore::from_profile(CombatantKind::Player, position, profile),
            behavior: Behavior::Player,
        }
    }

    /// Creates an enemy of `kind` from an explicit profile.
    pub fn from_profile(kind: EnemyKind, position: WorldPos, profile: &KindProfile) -> Self {
        Self {
            core: CombatantCore::from_profile(CombatantKind::Enemy(kind), position, profile),
            behavior: Behavior::Enemy(EnemyBrain::from_profile(profile)),
        }
    }

    /// Creates an enemy using the catalog entry for `kind`.
    pub fn enemy(kind: EnemyKind, position: WorldPos, catalog: &Catalog) -> EmberfallResult<Self> {
        Ok(Self::from_profile(kind, position, catalog.enemy(kind)?))
    }

    /// Creates a boss. `seed` feeds the boss's private RNG.
    pub fn boss(boss_type: BossType, position: WorldPos, catalog: &Catalog, seed: u64) -> EmberfallResult<Self> {
        let profile = catalog.boss(boss_type)?;
        let minion = catalog.enemy(profile.minion_kind)?.clone();
        Ok(Self {
            core: CombatantCore::from_profile(CombatantKind::Boss(boss_type), position, &profile.base),
            behavior: Behavior::Boss(Box::new(BossBrain::new(boss_type, profile, minion, seed))),
        })
    }

    pub fn id(&self) -> EntityId {
        self.core.id
    }

    pub fn kind(&self) -> CombatantKind {
        self.core.kind
    }

    pub fn position(&self) -> WorldPos {
        self.core.position
    }

    pub fn health(&self) -> i32 {
        self.core.health()
    }

    pub fn max_health(&self) -> i32 {
        self.core.max_health()
    }

    pub fn state(&self) -> CombatState {
        self.core.machine.state()
    }

    pub fn sprite_key(&self) -> &str {
        self.core.machine.sprite_key()
    }

    pub fn is_dead(&self) -> bool {
        self.core.is_dead()
    }

    pub fn boss_brain(&self) -> Option<&BossBrain> {
        match &self.behavior {
            Behavior::Boss(brain) => Some(brain),
            _ => None,
        }
    }

    pub fn boss_brain_mut(&mut self) -> Option<&mut BossBrain> {
        match &mut self.behavior {
            Behavior::Boss(brain) => Some(brain),
            _ => None,
        }
    }

    /// Minions owned by this combatant. Empty for non-bosses.
    pub fn minions(&self) -> &[Combatant] {
        match &self.behavior {
            Behavior::Boss(brain) => brain.minions(),
            _ => &[],
        }
    }

    pub fn minions_mut(&mut self) -> &mut [Combatant] {
        match &mut self.behavior {
            Behavior::Boss(brain) => brain.minions_mut(),
            _ => &mut [],
        }
    }

    /// Applies damage at simulation time `now`.
    ///
    /// Health clamps at zero. Reaching zero kills the combatant exactly once;
    /// damage to a dead combatant is ignored.
    pub fn take_damage(&mut self, amount: i32, now: f32) -> DamageOutcome {
        let Combatant { core, behavior } = self;
        let outcome = core.apply_damage(amount, now);
        if let Behavior::Boss(brain) = behavior {
            brain.on_damage(core, outcome);
        }
        outcome
    }

    /// Restores health up to the maximum. The dead stay dead.
    pub fn heal(&mut self, amount: i32) {
        if self.core.is_dead() || amount <= 0 {
            return;
        }
        self.core.health = self.core.health.saturating_add(amount).min(self.core.max_health);
    }

    /// Brings a combatant back at its spawn point with full health.
    pub fn reset_to_spawn(&mut self) {
        self.core.health = self.core.max_health;
        self.core.position = self.core.spawn;
        self.core.aggroed = false;
        self.core.projectiles.clear();
        self.core.machine.reset_to_spawn();
    }

    /// Dead for at least the kind's corpse lifetime. Players never qualify.
    pub fn is_despawnable(&self, now: f32) -> bool {
        if self.core.kind == CombatantKind::Player {
            return false;
        }
        self.core
            .machine
            .died_at()
            .map_or(false, |died| now - died >= self.core.corpse_ttl)
    }

    /// Runs one simulation step against a target point.
    pub fn update(&mut self, dt: f32, target_x: f32, target_y: f32, ctx: &mut TickContext) {
        let Combatant { core, behavior } = self;
        core.machine.advance(dt);
        core.update_projectiles(dt, &ctx.bounds);

        let target = WorldPos::new(target_x, target_y);
        if core.is_dead() {
            if let Behavior::Boss(brain) = behavior {
                brain.prune_minions();
                brain.update_minions(dt, target, ctx);
            }
            return;
        }

        match behavior {
            Behavior::Player => core.cooldowns.tick(dt),
            Behavior::Enemy(brain) => enemy::update(core, brain, dt, target, ctx),
            Behavior::Boss(brain) => boss::update(core, brain, dt, target, ctx),
        }
    }

    /// Plain-fields snapshot for persistence.
    pub fn to_record(&self) -> CombatantRecord {
        CombatantRecord {
            id: self.core.id,
            kind: self.core.kind,
            x: self.core.position.x,
            y: self.core.position.y,
            health: self.core.health,
            max_health: self.core.max_health,
            facing: self.core.facing(),
            stats: self.core.stats.clone(),
            cooldowns: self.core.cooldowns.as_map().clone(),
            died_at: self.core.machine.died_at(),
            aggroed: self.core.aggroed,
        }
    }

    /// Applies a snapshot taken with [`Combatant::to_record`].
    pub fn apply_record(&mut self, record: &CombatantRecord) -> EmberfallResult<()> {
        if record.kind != self.core.kind {
            return Err(EmberfallError::InvalidState(format!(
                "record for {} applied to {}",
                record.kind.name(),
                self.core.kind.name()
            )));
        }

        let core = &mut self.core;
        core.id = record.id;
        core.position = WorldPos::new(record.x, record.y);
        core.max_health = record.max_health.max(1);
        core.health = record.health.clamp(0, core.max_health);
        core.stats = record.stats.clone();
        core.aggroed = record.aggroed;
        core.cooldowns = CooldownTimers::new();
        for (ability, remaining) in &record.cooldowns {
            core.cooldowns.start(*ability, *remaining);
        }

        if core.health == 0 {
            core.machine.kill(record.died_at.unwrap_or(0.0));
        } else if core.machine.is_dead() {
            core.machine.reset_to_spawn();
        }
        core.machine.set_facing(record.facing);

        if let Behavior::Boss(brain) = &mut self.behavior {
            brain.resync_phase(&mut self.core);
        }
        Ok(())
    }
}

/// Persistence view of a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantRecord {
    pub id: EntityId,
    pub kind: CombatantKind,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub max_health: i32,
    pub facing: Facing,
    pub stats: Stats,
    pub cooldowns: HashMap<AbilityId, f32>,
    pub died_at: Option<f32>,
    pub aggroed: bool,
}
