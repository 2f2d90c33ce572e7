//! # Enemy AI
//!
//! Aggro, pursuit, basic attack arbitration, volleys and the kind-specific
//! extended abilities. Bosses run this same policy as their base behaviour.

use super::{
    AbilityId, AttackStyle, CombatState, CombatantCore, ExtendedAbility, KindProfile,
    ProjectileProfile, TickContext, VolleyProfile,
};
use crate::game::{GameEvent, WorldPos};

/// Seconds between contact hits.
pub const CONTACT_COOLDOWN: f32 = 1.0;

/// Fraction of the attack range to aim past the target while pursuing.
const OVERSHOOT_FACTOR: f32 = 0.25;

/// Extra strike reach for a lunge landing, relative to the attack range.
const LUNGE_REACH_FACTOR: f32 = 1.5;

/// Movement applied while an extended state runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Unit vector
    pub direction: WorldPos,
    pub speed: f32,
}

/// A strike that lands once the current extended state ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingStrike {
    pub damage: i32,
    pub reach: f32,
}

/// Per-enemy decision state.
#[derive(Debug, Clone)]
pub struct EnemyBrain {
    pub attack: AttackStyle,
    pub projectile: Option<ProjectileProfile>,
    pub volley: Option<VolleyProfile>,
    pub extended: Vec<ExtendedAbility>,
    pub motion: Option<Motion>,
    pub pending_strike: Option<PendingStrike>,
    /// Set once a transform ability has fired
    pub transformed: bool,
    /// How far past the target pursuit aims
    pub overshoot: f32,
}

impl EnemyBrain {
    pub fn from_profile(profile: &KindProfile) -> Self {
        Self {
            attack: profile.attack.clone(),
            projectile: profile.projectile.clone(),
            volley: profile.volley.clone(),
            extended: profile.extended.clone(),
            motion: None,
            pending_strike: None,
            transformed: false,
            overshoot: profile.stats.attack_range * OVERSHOOT_FACTOR,
        }
    }
}

/// One tick of the enemy policy. Animation, projectiles and the dead check
/// are handled by the caller.
pub(crate) fn update(
    core: &mut CombatantCore,
    brain: &mut EnemyBrain,
    dt: f32,
    target: WorldPos,
    ctx: &mut TickContext,
) {
    core.cooldowns.tick(dt);

    let to_target = target - core.position;
    core.face_toward(to_target.x);
    let dist_sq = to_target.length_squared();

    if !core.aggroed {
        let radius = core.stats.aggro_radius;
        if dist_sq > radius * radius {
            if !core.machine.is_busy() {
                core.machine.set_state(CombatState::Idle);
            }
            return;
        }
        core.aggroed = true;
        log::debug!("{} {} aggroed", core.kind.name(), core.id);
    }

    fire_volley(core, brain, to_target, dist_sq, ctx);

    if core.machine.state().is_extended() {
        if let Some(motion) = brain.motion {
            let step = motion.direction * (motion.speed * dt);
            core.position = ctx.bounds.clamp(core.position + step);
        }
        return;
    }
    brain.motion = None;

    if let Some(strike) = brain.pending_strike.take() {
        push_strike(core, ctx, strike.reach, strike.damage);
    }

    contact(core, dist_sq, ctx);

    if core.machine.is_busy() {
        return;
    }

    let range = core.stats.attack_range;
    let dist = dist_sq.sqrt();
    if dist_sq > range * range {
        if !try_extended(core, brain, to_target, dist, ctx) {
            pursue(core, brain, target, dt, ctx);
            core.machine.set_state(CombatState::Moving);
        }
    } else if core.cooldowns.is_ready(AbilityId::Attack) {
        basic_attack(core, brain, to_target, dist, ctx);
    } else {
        core.machine.set_state(CombatState::Idle);
    }
}

fn pursue(core: &mut CombatantCore, brain: &EnemyBrain, target: WorldPos, dt: f32, ctx: &TickContext) {
    let fallback = core.facing().unit_vector();
    let aim = target + (target - core.position).normalized_or(fallback) * brain.overshoot;
    let mut step = (aim - core.position).normalized_or(fallback) * (core.stats.move_speed * dt);
    step.y *= core.stats.vertical_speed_factor;
    core.position = ctx.bounds.clamp(core.position + step);
}

fn push_strike(core: &CombatantCore, ctx: &mut TickContext, reach: f32, damage: i32) {
    ctx.events.push(GameEvent::MeleeStrike {
        attacker: core.id,
        origin: core.position,
        reach,
        damage,
    });
}

fn contact(core: &mut CombatantCore, dist_sq: f32, ctx: &mut TickContext) {
    let reach = core.stats.contact_range;
    if core.stats.contact_damage <= 0.0
        || dist_sq > reach * reach
        || !core.cooldowns.is_ready(AbilityId::Contact)
    {
        return;
    }
    let damage = core.stats.contact_damage.round() as i32;
    push_strike(core, ctx, reach, damage);
    core.cooldowns.start(AbilityId::Contact, CONTACT_COOLDOWN);
}

fn try_extended(
    core: &mut CombatantCore,
    brain: &mut EnemyBrain,
    to_target: WorldPos,
    dist: f32,
    ctx: &mut TickContext,
) -> bool {
    let candidate = brain.extended.iter().find(|ability| {
        (ability.state != CombatState::Transforming || !brain.transformed)
            && core.cooldowns.is_ready(ability.ability)
            && dist >= ability.min_distance
            && dist <= ability.max_distance
    });
    let Some(ability) = candidate.cloned() else {
        return false;
    };
    if !core.machine.try_enter_extended(ability.state) {
        return false;
    }

    core.cooldowns.start(ability.ability, ability.cooldown);
    if ability.speed_multiplier > 0.0 {
        brain.motion = Some(Motion {
            direction: to_target.normalized_or(core.facing().unit_vector()),
            speed: core.stats.move_speed * ability.speed_multiplier,
        });
    }
    if ability.damage > 0 {
        brain.pending_strike = Some(PendingStrike {
            damage: ability.damage,
            reach: core.stats.attack_range * LUNGE_REACH_FACTOR,
        });
    }
    if ability.state == CombatState::Transforming {
        brain.transformed = true;
        core.stats.move_speed *= 1.2;
        core.stats.attack_damage += core.stats.attack_damage / 4;
        log::debug!("{} {} transformed", core.kind.name(), core.id);
    }

    ctx.events.push(GameEvent::AbilityUsed {
        combatant: core.id,
        ability: ability.ability,
    });
    true
}

fn basic_attack(
    core: &mut CombatantCore,
    brain: &EnemyBrain,
    to_target: WorldPos,
    dist: f32,
    ctx: &mut TickContext,
) {
    let ranged = match &brain.attack {
        AttackStyle::Melee => None,
        AttackStyle::Ranged => brain.projectile.as_ref(),
        AttackStyle::Dual { ranged_min, .. } if dist >= *ranged_min => brain.projectile.as_ref(),
        AttackStyle::Dual { .. } => None,
    };

    match ranged {
        Some(profile) => core.fire(to_target, profile),
        None => {
            let reach = match brain.attack {
                AttackStyle::Dual { melee_reach, .. } => melee_reach,
                _ => core.stats.attack_range,
            };
            push_strike(core, ctx, reach, core.stats.attack_damage);
        }
    }

    core.cooldowns.start(AbilityId::Attack, core.stats.attack_cooldown);
    core.machine.set_state(CombatState::Attacking);
}

fn fire_volley(
    core: &mut CombatantCore,
    brain: &EnemyBrain,
    to_target: WorldPos,
    dist_sq: f32,
    ctx: &mut TickContext,
) {
    let Some(volley) = &brain.volley else {
        return;
    };
    if dist_sq > volley.range * volley.range || !core.cooldowns.is_ready(AbilityId::Volley) {
        return;
    }

    let aim = to_target.normalized_or(core.facing().unit_vector());
    let count = volley.count.max(1);
    let first = -(count as f32 - 1.0) * volley.spread / 2.0;
    for shot in 0..count {
        let angle = first + shot as f32 * volley.spread;
        core.fire(aim.rotated(angle), &volley.projectile);
    }
    core.cooldowns.start(AbilityId::Volley, volley.cooldown);
    ctx.events.push(GameEvent::AbilityUsed {
        combatant: core.id,
        ability: AbilityId::Volley,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Catalog, Combatant, EnemyKind, WorldBounds};
    use crate::game::EventQueue;

    fn spawn(kind: EnemyKind) -> Combatant {
        Combatant::enemy(kind, WorldPos::zero(), &Catalog::standard()).unwrap()
    }

    fn tick(enemy: &mut Combatant, events: &mut EventQueue, target: WorldPos, now: f32) {
        let mut ctx = TickContext {
            now,
            events,
            bounds: WorldBounds::unbounded(),
        };
        enemy.update(0.016, target.x, target.y, &mut ctx);
    }

    #[test]
    fn test_aggro_radius() {
        let mut events = EventQueue::new();
        let mut near = spawn(EnemyKind::Goblin);
        near.core.stats.aggro_radius = 300.0;
        tick(&mut near, &mut events, WorldPos::new(200.0, 0.0), 0.0);
        assert!(near.core.aggroed);
        assert_eq!(near.state(), CombatState::Moving);

        let mut far = spawn(EnemyKind::Goblin);
        far.core.stats.aggro_radius = 300.0;
        tick(&mut far, &mut events, WorldPos::new(400.0, 0.0), 0.0);
        assert!(!far.core.aggroed);
        assert_eq!(far.state(), CombatState::Idle);
        assert_eq!(far.position(), WorldPos::zero());
    }

    #[test]
    fn test_pursuit_moves_toward_target() {
        let mut events = EventQueue::new();
        let mut slime = spawn(EnemyKind::Slime);
        tick(&mut slime, &mut events, WorldPos::new(200.0, 0.0), 0.0);
        assert_eq!(slime.state(), CombatState::Moving);
        assert!(slime.position().x > 0.0);
        assert_eq!(slime.position().y, 0.0);
    }

    #[test]
    fn test_melee_in_range_emits_strike() {
        let mut events = EventQueue::new();
        let mut goblin = spawn(EnemyKind::Goblin);
        tick(&mut goblin, &mut events, WorldPos::new(10.0, 0.0), 0.0);
        assert_eq!(goblin.state(), CombatState::Attacking);
        let strikes = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::MeleeStrike { .. }))
            .count();
        assert_eq!(strikes, 1);
        assert!(!goblin.core.cooldowns.is_ready(AbilityId::Attack));
    }

    #[test]
    fn test_archer_picks_by_distance() {
        let mut events = EventQueue::new();
        let mut archer = spawn(EnemyKind::SkeletonArcher);
        tick(&mut archer, &mut events, WorldPos::new(150.0, 0.0), 0.0);
        assert_eq!(archer.core.projectiles.len(), 1);
        assert!(events.is_empty());

        let mut close = spawn(EnemyKind::SkeletonArcher);
        tick(&mut close, &mut events, WorldPos::new(20.0, 0.0), 0.0);
        assert!(close.core.projectiles.is_empty());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_volley_fires_alongside_pursuit() {
        let mut events = EventQueue::new();
        let mut mage = spawn(EnemyKind::DarkMage);
        tick(&mut mage, &mut events, WorldPos::new(300.0, 0.0), 0.0);
        assert_eq!(mage.core.projectiles.len(), 5);
        assert_eq!(mage.state(), CombatState::Moving);
    }

    #[test]
    fn test_zero_direction_uses_facing() {
        let mut events = EventQueue::new();
        let mut mage = spawn(EnemyKind::DarkMage);
        mage.core.machine.set_facing(crate::game::Facing::Left);
        tick(&mut mage, &mut events, WorldPos::zero(), 0.0);
        let shot = &mage.core.projectiles[0];
        assert!(shot.direction.x < 0.0);
        assert!((shot.direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_dash_enters_extended_state() {
        let mut events = EventQueue::new();
        let mut goblin = spawn(EnemyKind::Goblin);
        tick(&mut goblin, &mut events, WorldPos::new(100.0, 0.0), 0.0);
        assert_eq!(goblin.state(), CombatState::Dashing);
        let before = goblin.position().x;
        tick(&mut goblin, &mut events, WorldPos::new(100.0, 0.0), 0.016);
        assert!(goblin.position().x > before);
        assert!(!goblin.core.cooldowns.is_ready(AbilityId::Dash));
    }

    #[test]
    fn test_contact_damage_respects_cooldown() {
        let mut events = EventQueue::new();
        let mut orc = spawn(EnemyKind::Orc);
        orc.core.cooldowns.start(AbilityId::Attack, 100.0);
        tick(&mut orc, &mut events, WorldPos::new(5.0, 0.0), 0.0);
        tick(&mut orc, &mut events, WorldPos::new(5.0, 0.0), 0.016);
        let strikes = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::MeleeStrike { damage: 4, .. }))
            .count();
        assert_eq!(strikes, 1);
    }

    #[test]
    fn test_dead_enemy_does_nothing() {
        let mut events = EventQueue::new();
        let mut goblin = spawn(EnemyKind::Goblin);
        goblin.take_damage(1000, 0.0);
        tick(&mut goblin, &mut events, WorldPos::new(10.0, 0.0), 0.0);
        assert!(events.is_empty());
        assert_eq!(goblin.position(), WorldPos::zero());
    }
}
