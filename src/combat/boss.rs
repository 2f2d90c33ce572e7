//! # Boss AI
//!
//! Bosses run the regular enemy policy as their base behaviour and layer on
//! top of it: health phases, an ability roster throttled by a global
//! cooldown, owned minions and a desperation roll in the last phase.

use super::{
    enemy, AbilityId, AbilitySpec, BossProfile, BossType, CombatState, Combatant, CombatantCore,
    DamageOutcome, DistanceBands, EnemyBrain, EnemyKind, KindProfile, Motion, PendingStrike,
    ProjectileProfile, Stats, TickContext,
};
use crate::game::{GameEvent, WorldPos};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Radius of the ring minions appear on around the boss.
const SUMMON_RING: f32 = 40.0;

/// Health-derived boss phase. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BossPhase {
    Phase1,
    Phase2,
    Phase3,
}

impl BossPhase {
    /// Phase a given health ratio calls for.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::BossPhase;
    ///
    /// assert_eq!(BossPhase::from_ratio(0.48), BossPhase::Phase2);
    /// assert_eq!(BossPhase::from_ratio(0.25), BossPhase::Phase3);
    /// ```
    pub fn from_ratio(ratio: f32) -> Self {
        if ratio <= 0.25 {
            BossPhase::Phase3
        } else if ratio <= 0.5 {
            BossPhase::Phase2
        } else {
            BossPhase::Phase1
        }
    }

    fn index(self) -> usize {
        match self {
            BossPhase::Phase1 => 0,
            BossPhase::Phase2 => 1,
            BossPhase::Phase3 => 2,
        }
    }
}

/// One ability in a boss roster.
#[derive(Debug, Clone, PartialEq)]
pub struct BossAbility {
    pub id: AbilityId,
    pub name: String,
    pub cooldown_seconds: f32,
    pub last_used: Option<f32>,
}

impl BossAbility {
    fn from_spec(spec: &AbilitySpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name.clone(),
            cooldown_seconds: spec.cooldown_seconds,
            last_used: None,
        }
    }

    pub fn is_ready(&self, now: f32) -> bool {
        self.last_used
            .map_or(true, |used| now - used >= self.cooldown_seconds)
    }
}

/// Boss decision state.
#[derive(Debug, Clone)]
pub struct BossBrain {
    pub boss_type: BossType,
    pub base: EnemyBrain,
    phase: BossPhase,
    transitioned: [bool; 3],
    announced: BossPhase,
    pub abilities: Vec<BossAbility>,
    pub global_cooldown: f32,
    global_last_used: Option<f32>,
    bands: DistanceBands,
    minions: Vec<Combatant>,
    max_minions: usize,
    minions_per_summon: usize,
    minion_kind: EnemyKind,
    minion_profile: KindProfile,
    desperation_chance: f32,
    desperation_resets: u32,
    slam_reach: f32,
    slam_damage: i32,
    charge_multiplier: f32,
    barrage_count: u32,
    barrage_projectile: ProjectileProfile,
    rng: StdRng,
}

impl BossBrain {
    pub fn new(boss_type: BossType, profile: &BossProfile, minion_profile: KindProfile, seed: u64) -> Self {
        Self {
            boss_type,
            base: EnemyBrain::from_profile(&profile.base),
            phase: BossPhase::Phase1,
            transitioned: [true, false, false],
            announced: BossPhase::Phase1,
            abilities: profile.abilities.iter().map(BossAbility::from_spec).collect(),
            global_cooldown: profile.global_cooldown,
            global_last_used: None,
            bands: profile.bands.clone(),
            minions: Vec::new(),
            max_minions: profile.max_minions,
            minions_per_summon: profile.minions_per_summon,
            minion_kind: profile.minion_kind,
            minion_profile,
            desperation_chance: profile.desperation_chance.clamp(0.0, 1.0),
            desperation_resets: 0,
            slam_reach: profile.slam_reach,
            slam_damage: profile.slam_damage,
            charge_multiplier: profile.charge_multiplier,
            barrage_count: profile.barrage_count,
            barrage_projectile: profile.barrage_projectile.clone(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn has_transitioned(&self, phase: BossPhase) -> bool {
        self.transitioned[phase.index()]
    }

    pub fn minions(&self) -> &[Combatant] {
        &self.minions
    }

    pub fn minions_mut(&mut self) -> &mut [Combatant] {
        &mut self.minions
    }

    pub fn alive_minions(&self) -> usize {
        self.minions.iter().filter(|m| !m.is_dead()).count()
    }

    /// How many times desperation has reset the global cooldown.
    pub fn desperation_resets(&self) -> u32 {
        self.desperation_resets
    }

    pub fn global_ready(&self, now: f32) -> bool {
        self.global_last_used
            .map_or(true, |used| now - used >= self.global_cooldown)
    }

    /// Moves to the phase the health ratio calls for, applying each
    /// transition's modifiers exactly once. Returns true if the phase advanced.
    pub fn refresh_phase(&mut self, stats: &mut Stats, ratio: f32) -> bool {
        let target = BossPhase::from_ratio(ratio);
        if target <= self.phase {
            return false;
        }
        for phase in [BossPhase::Phase2, BossPhase::Phase3] {
            if phase <= target && !self.transitioned[phase.index()] {
                apply_phase_modifiers(stats, phase);
                self.transitioned[phase.index()] = true;
            }
        }
        log::info!("{} enters {:?}", self.boss_type.name(), target);
        self.phase = target;
        true
    }

    /// Reacts to a damage call on the owning combatant.
    ///
    /// The phase is refreshed before the desperation roll, so the hit that
    /// first drops the boss into Phase3 already rolls. Killing blows never do.
    pub(crate) fn on_damage(&mut self, core: &mut CombatantCore, outcome: DamageOutcome) {
        if outcome == DamageOutcome::Ignored {
            return;
        }
        let ratio = core.health_ratio();
        self.refresh_phase(&mut core.stats, ratio);

        if outcome == DamageOutcome::Hurt
            && self.phase == BossPhase::Phase3
            && self.rng.gen_bool(f64::from(self.desperation_chance))
        {
            self.global_last_used = None;
            self.desperation_resets += 1;
            log::debug!("{} desperation resets global cooldown", self.boss_type.name());
        }
    }

    /// Restores the phase after a record was applied. Stats in the record
    /// already carry the phase modifiers.
    pub(crate) fn resync_phase(&mut self, core: &mut CombatantCore) {
        let phase = BossPhase::from_ratio(core.health_ratio()).max(self.phase);
        for step in [BossPhase::Phase2, BossPhase::Phase3] {
            if step <= phase {
                self.transitioned[step.index()] = true;
            }
        }
        self.phase = phase;
        self.announced = phase;
    }

    fn ready(&self, id: AbilityId, now: f32) -> Option<usize> {
        self.abilities.iter().position(|a| a.id == id && a.is_ready(now))
    }

    /// Picks the next ability for the current distance, if any is allowed.
    pub fn select_ability(&self, distance: f32, now: f32) -> Option<usize> {
        if !self.global_ready(now) {
            return None;
        }
        let close = distance <= self.bands.close;
        let far = distance >= self.bands.far;
        let mid = !close && !far;
        let can_summon = self.minions_per_summon > 0 && self.alive_minions() < self.max_minions;
        let when = |allowed: bool, id: AbilityId| if allowed { self.ready(id, now) } else { None };

        match self.boss_type {
            BossType::GoblinKing => when(can_summon, AbilityId::Summon)
                .or_else(|| when(mid, AbilityId::Charge))
                .or_else(|| when(close, AbilityId::GroundSlam)),
            BossType::Necromancer => when(close, AbilityId::Teleport)
                .or_else(|| when(can_summon, AbilityId::Summon))
                .or_else(|| when(!close, AbilityId::Barrage)),
            BossType::StoneGolem => when(far, AbilityId::Charge)
                .or_else(|| when(mid, AbilityId::BoulderThrow))
                .or_else(|| when(close, AbilityId::Quake)),
        }
    }

    /// Runs the ability at `index`. Out-of-range indices are logged and ignored.
    pub fn use_ability(
        &mut self,
        index: usize,
        core: &mut CombatantCore,
        target: WorldPos,
        ctx: &mut TickContext,
    ) -> bool {
        if index >= self.abilities.len() {
            log::warn!(
                "{} has no ability at index {} ({} known)",
                self.boss_type.name(),
                index,
                self.abilities.len()
            );
            return false;
        }
        let ability = &mut self.abilities[index];
        ability.last_used = Some(ctx.now);
        let id = ability.id;
        self.global_last_used = Some(ctx.now);

        let aim = (target - core.position).normalized_or(core.facing().unit_vector());
        match id {
            AbilityId::Summon => self.summon(core, ctx),
            AbilityId::Charge => {
                core.machine.try_enter_extended(CombatState::Dashing);
                self.base.motion = Some(Motion {
                    direction: aim,
                    speed: core.stats.move_speed * self.charge_multiplier,
                });
                self.base.pending_strike = Some(PendingStrike {
                    damage: core.stats.attack_damage,
                    reach: core.stats.attack_range,
                });
            }
            AbilityId::GroundSlam | AbilityId::Quake => {
                core.machine.try_enter_extended(CombatState::SuperAttacking);
                ctx.events.push(GameEvent::MeleeStrike {
                    attacker: core.id,
                    origin: core.position,
                    reach: self.slam_reach,
                    damage: self.slam_damage,
                });
            }
            AbilityId::Teleport => {
                core.position = ctx.bounds.clamp(target + aim * self.bands.far);
                core.machine.try_enter_extended(CombatState::Jumping);
            }
            AbilityId::Barrage => {
                let count = self.barrage_count.max(1);
                for shot in 0..count {
                    let angle = TAU * shot as f32 / count as f32;
                    core.fire(aim.rotated(angle), &self.barrage_projectile);
                }
                core.machine.set_state(CombatState::Attacking);
            }
            AbilityId::BoulderThrow => {
                core.fire(aim, &self.barrage_projectile);
                core.machine.set_state(CombatState::Attacking);
            }
            other => log::warn!("{} cannot use {:?}", self.boss_type.name(), other),
        }

        log::debug!("{} uses {:?}", self.boss_type.name(), id);
        ctx.events.push(GameEvent::AbilityUsed {
            combatant: core.id,
            ability: id,
        });
        true
    }

    fn summon(&mut self, core: &mut CombatantCore, ctx: &mut TickContext) {
        let room = self.max_minions.saturating_sub(self.alive_minions());
        let count = self.minions_per_summon.min(room);
        for slot in 0..count {
            let angle = TAU * slot as f32 / count as f32;
            let offset = WorldPos::new(angle.cos(), angle.sin()) * SUMMON_RING;
            let mut minion = Combatant::from_profile(
                self.minion_kind,
                ctx.bounds.clamp(core.position + offset),
                &self.minion_profile,
            );
            minion.core.aggroed = true;
            self.minions.push(minion);
        }
        core.machine.try_enter_extended(CombatState::Transforming);
        if count > 0 {
            ctx.events.push(GameEvent::MinionsSummoned {
                boss: core.id,
                count,
            });
        }
    }

    /// Drops minions that died on an earlier tick.
    pub(crate) fn prune_minions(&mut self) {
        let before = self.minions.len();
        self.minions.retain(|m| !m.is_dead());
        let pruned = before - self.minions.len();
        if pruned > 0 {
            log::debug!("{} lost {} minions", self.boss_type.name(), pruned);
        }
    }

    pub(crate) fn update_minions(&mut self, dt: f32, target: WorldPos, ctx: &mut TickContext) {
        for minion in self.minions.iter_mut() {
            minion.update(dt, target.x, target.y, ctx);
        }
    }
}

fn apply_phase_modifiers(stats: &mut Stats, phase: BossPhase) {
    stats.move_speed *= 1.25;
    stats.attack_cooldown *= 0.8;
    if phase == BossPhase::Phase3 {
        stats.contact_damage *= 1.5;
    }
}

/// One tick of boss behaviour. The caller has already advanced animation and
/// checked for death.
pub(crate) fn update(
    core: &mut CombatantCore,
    brain: &mut BossBrain,
    dt: f32,
    target: WorldPos,
    ctx: &mut TickContext,
) {
    brain.prune_minions();

    if brain.announced != brain.phase {
        brain.announced = brain.phase;
        ctx.events.push(GameEvent::PhaseChanged {
            boss: core.id,
            phase: brain.phase,
        });
    }

    enemy::update(core, &mut brain.base, dt, target, ctx);

    if core.aggroed && matches!(core.machine.state(), CombatState::Idle | CombatState::Moving) {
        let distance = core.position.distance(target);
        if let Some(index) = brain.select_ability(distance, ctx.now) {
            brain.use_ability(index, core, target, ctx);
        }
    }

    brain.update_minions(dt, target, ctx);
}

impl Combatant {
    /// Runs a boss ability by roster index. False for non-bosses.
    pub fn use_boss_ability(&mut self, index: usize, target: WorldPos, ctx: &mut TickContext) -> bool {
        let Combatant { core, behavior } = self;
        match behavior {
            super::Behavior::Boss(brain) => brain.use_ability(index, core, target, ctx),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Catalog, WorldBounds};
    use crate::game::EventQueue;

    fn boss(boss_type: BossType) -> Combatant {
        Combatant::boss(boss_type, WorldPos::zero(), &Catalog::standard(), 7).unwrap()
    }

    fn ctx(events: &mut EventQueue, now: f32) -> TickContext<'_> {
        TickContext {
            now,
            events,
            bounds: WorldBounds::unbounded(),
        }
    }

    #[test]
    fn test_phase_from_damage() {
        let mut king = boss(BossType::GoblinKing);
        king.take_damage(260, 0.0);
        assert_eq!(king.health(), 240);
        let brain = king.boss_brain().unwrap();
        assert_eq!(brain.phase(), BossPhase::Phase2);
        assert!(!brain.has_transitioned(BossPhase::Phase3));
    }

    #[test]
    fn test_phase_latches_after_heal() {
        let mut king = boss(BossType::GoblinKing);
        king.take_damage(300, 0.0);
        king.heal(500);
        assert_eq!(king.health(), 500);
        assert_eq!(king.boss_brain().unwrap().phase(), BossPhase::Phase2);
    }

    #[test]
    fn test_phase_modifiers_compound_once() {
        let mut king = boss(BossType::GoblinKing);
        let speed = king.core.stats.move_speed;
        let cooldown = king.core.stats.attack_cooldown;
        let contact = king.core.stats.contact_damage;

        king.take_damage(260, 0.0);
        king.take_damage(1, 0.1);
        assert!((king.core.stats.move_speed - speed * 1.25).abs() < 1e-4);

        king.take_damage(150, 0.2);
        king.take_damage(1, 0.3);
        assert_eq!(king.boss_brain().unwrap().phase(), BossPhase::Phase3);
        assert!((king.core.stats.move_speed - speed * 1.25 * 1.25).abs() < 1e-3);
        assert!((king.core.stats.attack_cooldown - cooldown * 0.64).abs() < 1e-4);
        assert!((king.core.stats.contact_damage - contact * 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_skipping_a_phase_applies_both() {
        let mut golem = boss(BossType::StoneGolem);
        let speed = golem.core.stats.move_speed;
        golem.take_damage(700, 0.0);
        assert_eq!(golem.boss_brain().unwrap().phase(), BossPhase::Phase3);
        assert!((golem.core.stats.move_speed - speed * 1.5625).abs() < 1e-3);
    }

    #[test]
    fn test_phase_change_announced_next_update() {
        let mut events = EventQueue::new();
        let mut king = boss(BossType::GoblinKing);
        king.take_damage(260, 0.0);
        king.update(0.016, 1000.0, 1000.0, &mut ctx(&mut events, 0.016));
        let phases: Vec<_> = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PhaseChanged { .. }))
            .collect();
        assert_eq!(phases.len(), 1);
    }

    #[test]
    fn test_bad_ability_index_is_noop() {
        let mut events = EventQueue::new();
        let mut king = boss(BossType::GoblinKing);
        assert!(!king.use_boss_ability(99, WorldPos::new(10.0, 0.0), &mut ctx(&mut events, 0.0)));
        assert!(events.is_empty());
        assert!(king.boss_brain().unwrap().global_ready(0.0));
    }

    #[test]
    fn test_global_cooldown_throttles() {
        let mut events = EventQueue::new();
        let mut king = boss(BossType::GoblinKing);
        assert!(king.use_boss_ability(2, WorldPos::new(10.0, 0.0), &mut ctx(&mut events, 0.0)));
        let brain = king.boss_brain().unwrap();
        assert_eq!(brain.select_ability(150.0, 1.0), None);
        assert!(brain.select_ability(150.0, 2.5).is_some());
    }

    #[test]
    fn test_policy_by_distance() {
        let golem = boss(BossType::StoneGolem);
        let brain = golem.boss_brain().unwrap();
        let id = |d: f32| brain.select_ability(d, 0.0).map(|i| brain.abilities[i].id);
        assert_eq!(id(50.0), Some(AbilityId::Quake));
        assert_eq!(id(150.0), Some(AbilityId::BoulderThrow));
        assert_eq!(id(300.0), Some(AbilityId::Charge));
    }

    #[test]
    fn test_minions_capped_and_pruned_next_tick() {
        let mut events = EventQueue::new();
        let mut necro = boss(BossType::Necromancer);
        necro.use_boss_ability(1, WorldPos::new(500.0, 0.0), &mut ctx(&mut events, 0.0));
        necro.use_boss_ability(1, WorldPos::new(500.0, 0.0), &mut ctx(&mut events, 20.0));
        necro.use_boss_ability(1, WorldPos::new(500.0, 0.0), &mut ctx(&mut events, 40.0));
        assert_eq!(necro.minions().len(), 5);

        necro.minions_mut()[0].take_damage(1000, 41.0);
        assert_eq!(necro.minions().len(), 5);
        necro.update(0.016, 2000.0, 0.0, &mut ctx(&mut events, 41.016));
        assert_eq!(necro.minions().len(), 4);
    }

    #[test]
    fn test_teleport_lands_past_target() {
        let mut events = EventQueue::new();
        let mut necro = boss(BossType::Necromancer);
        necro.use_boss_ability(0, WorldPos::new(20.0, 0.0), &mut ctx(&mut events, 0.0));
        assert!(necro.position().x > 200.0);
        assert_eq!(necro.state(), CombatState::Jumping);
    }

    #[test]
    fn test_barrage_is_radial() {
        let mut events = EventQueue::new();
        let mut necro = boss(BossType::Necromancer);
        necro.use_boss_ability(2, WorldPos::new(150.0, 0.0), &mut ctx(&mut events, 0.0));
        assert_eq!(necro.core.projectiles.len(), 8);
    }

    #[test]
    fn test_hit_entering_phase3_rolls_desperation() {
        let mut catalog = Catalog::standard();
        if let Some(king) = catalog.bosses.get_mut(&BossType::GoblinKing) {
            king.desperation_chance = 1.0;
        }
        let mut king = Combatant::boss(BossType::GoblinKing, WorldPos::zero(), &catalog, 7).unwrap();

        king.take_damage(260, 0.0);
        assert_eq!(king.boss_brain().unwrap().desperation_resets(), 0);

        king.take_damage(140, 1.0);
        let brain = king.boss_brain().unwrap();
        assert_eq!(brain.phase(), BossPhase::Phase3);
        assert_eq!(brain.desperation_resets(), 1);

        king.take_damage(1000, 2.0);
        assert!(king.is_dead());
        assert_eq!(king.boss_brain().unwrap().desperation_resets(), 1);
    }

    #[test]
    fn test_desperation_is_probabilistic() {
        let mut events = EventQueue::new();
        let mut king = boss(BossType::GoblinKing);
        king.take_damage(400, 0.0);
        assert_eq!(king.boss_brain().unwrap().phase(), BossPhase::Phase3);

        for step in 0..1000 {
            let now = step as f32;
            king.use_boss_ability(2, WorldPos::new(10.0, 0.0), &mut ctx(&mut events, now));
            king.take_damage(1, now);
            king.heal(1);
        }
        let resets = king.boss_brain().unwrap().desperation_resets();
        assert!((200..=400).contains(&resets), "resets = {}", resets);
        assert_eq!(king.boss_brain().unwrap().phase(), BossPhase::Phase3);
    }
}
