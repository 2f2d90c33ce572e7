//! # Game State Module
//!
//! Central game state management and coordination between all game systems.
//!
//! [`GameState`] owns the world, the player, every enemy and boss and the
//! event queue. One call to [`GameState::tick`] advances the whole simulation
//! by a fixed step: move the player, stream chunks and recompute visibility,
//! spawn encounters on new chunks, update combatants, resolve the queued
//! events and finally despawn old corpses.

use super::{ChunkCoord, EventQueue, GameConfig, GameEvent, Position, World, WorldPos};
use crate::combat::{
    AbilityId, Catalog, CombatState, Combatant, CombatantKind, CombatantRecord, DamageOutcome,
    TickContext,
};
use crate::{
    derive_seed, EmberfallError, EmberfallResult, EncounterGenerator, Facing, MapSource,
    PrebuiltMap, SpawnKind,
};
use serde::{Deserialize, Serialize};

/// Collision radius used for strikes and projectile hits.
pub const COMBATANT_RADIUS: f32 = 12.0;

const SAVE_VERSION: u32 = 1;

/// What the player asked for this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Desired direction; any length, zero for none
    pub movement: WorldPos,
    pub attack: bool,
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Number of enemies defeated
    pub enemies_defeated: u32,
    /// Number of bosses defeated
    pub bosses_defeated: u32,
    /// Total damage dealt by the player
    pub damage_dealt: u64,
    /// Total damage taken by the player
    pub damage_taken: u64,
    /// Number of times the player has died
    pub deaths: u32,
    /// Chunks generated this session
    pub chunks_generated: u32,
    /// Abilities used by enemies and bosses
    pub abilities_used: u32,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a resolved event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::CombatantDied { kind, .. } => match kind {
                CombatantKind::Player => self.deaths += 1,
                CombatantKind::Enemy(_) => self.enemies_defeated += 1,
                CombatantKind::Boss(_) => self.bosses_defeated += 1,
            },
            GameEvent::ChunkLoaded { .. } => self.chunks_generated += 1,
            GameEvent::AbilityUsed { .. } => self.abilities_used += 1,
            _ => {}
        }
    }
}

/// Whether the session is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    PlayerDied,
}

/// Persistence view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub version: u32,
    pub seed: u64,
    /// Simulation time in seconds
    pub time: f32,
    pub player: CombatantRecord,
    pub enemies: Vec<CombatantRecord>,
    pub statistics: GameStatistics,
}

/// Central game state containing all game data and systems.
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    /// The chunked tile world
    pub world: World,
    /// Kind profiles used for every spawn
    pub catalog: Catalog,
    pub player: Combatant,
    /// Live enemies and bosses; minions live inside their boss
    pub enemies: Vec<Combatant>,
    pub events: EventQueue,
    /// Simulation time in seconds
    pub time: f32,
    pub tick_count: u64,
    pub statistics: GameStatistics,
    pub completion_state: GameCompletionState,
    encounters: EncounterGenerator,
}

impl GameState {
    /// Creates a session from a config, loading the catalog and map it names.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{GameConfig, GameState};
    ///
    /// let state = GameState::new(GameConfig::for_testing(12345)).unwrap();
    /// assert_eq!(state.tick_count, 0);
    /// assert!(!state.player.is_dead());
    /// ```
    pub fn new(config: GameConfig) -> EmberfallResult<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::standard(),
        };
        let source = match &config.map_path {
            Some(path) => MapSource::Prebuilt(PrebuiltMap::load(path)?),
            None => MapSource::procedural(),
        };
        Self::with_parts(config, catalog, source)
    }

    /// Creates a session from explicit parts.
    pub fn with_parts(config: GameConfig, catalog: Catalog, source: MapSource) -> EmberfallResult<Self> {
        let config = config.sanitized();
        let mut world = World::with_source(config.generation.clone(), source);
        let spawn = world.find_spawn()?;
        let player = Combatant::player(world.tile_center(spawn), &catalog.player);
        log::info!(
            "New game: seed {}, player at tile ({}, {})",
            config.generation.seed,
            spawn.x,
            spawn.y
        );

        let mut state = Self {
            config,
            world,
            catalog,
            player,
            enemies: Vec::new(),
            events: EventQueue::new(),
            time: 0.0,
            tick_count: 0,
            statistics: GameStatistics::new(),
            completion_state: GameCompletionState::Playing,
            encounters: EncounterGenerator::new(),
        };
        state.refresh_world();
        Ok(state)
    }

    pub fn seed(&self) -> u64 {
        self.config.generation.seed
    }

    pub fn is_game_ended(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Total live enemies including boss minions.
    pub fn hostile_count(&self) -> usize {
        self.enemies.iter().map(|e| 1 + e.minions().len()).sum()
    }

    /// The first live boss within `radius` world units of the player.
    pub fn nearest_boss(&self, radius: f32) -> Option<&Combatant> {
        let player = self.player.position();
        self.enemies
            .iter()
            .filter(|e| e.boss_brain().is_some() && !e.is_dead())
            .filter(|e| e.position().distance(player) <= radius)
            .min_by(|a, b| {
                a.position()
                    .distance_squared(player)
                    .total_cmp(&b.position().distance_squared(player))
            })
    }

    /// Advances the simulation by one fixed step and returns the events
    /// resolved during it.
    pub fn tick(&mut self, dt: f32, input: &TickInput) -> Vec<GameEvent> {
        self.time += dt;
        self.tick_count += 1;

        if !self.player.is_dead() {
            self.move_player(dt, input.movement);
        }
        self.refresh_world();

        let target = self.player.position();
        let mut ctx = TickContext {
            now: self.time,
            events: &mut self.events,
            bounds: self.world.bounds(),
        };
        self.player.update(dt, target.x, target.y, &mut ctx);
        if input.attack {
            player_attack(&mut self.player, &mut ctx);
        }
        for enemy in self.enemies.iter_mut() {
            enemy.update(dt, target.x, target.y, &mut ctx);
        }

        let mut resolved = self.resolve_events();
        resolved.extend(self.resolve_projectiles());
        resolved.extend(self.despawn_corpses());

        for event in &resolved {
            self.statistics.update_from_event(event);
        }
        resolved
    }

    fn move_player(&mut self, dt: f32, movement: WorldPos) {
        let direction = movement.normalized_or(WorldPos::zero());
        let core = &mut self.player.core;
        if direction == WorldPos::zero() {
            if core.machine.state() == CombatState::Moving {
                core.machine.set_state(CombatState::Idle);
            }
            return;
        }

        if direction.x.abs() >= direction.y.abs() {
            core.machine
                .set_facing(if direction.x < 0.0 { Facing::Left } else { Facing::Right });
        } else {
            core.machine
                .set_facing(if direction.y < 0.0 { Facing::Up } else { Facing::Down });
        }

        let step = direction * (core.stats.move_speed * dt);
        let from = core.position;
        let bounds = self.world.bounds();
        let candidates = [
            from + step,
            from + WorldPos::new(step.x, 0.0),
            from + WorldPos::new(0.0, step.y),
        ];
        let world = &self.world;
        let destination = candidates
            .into_iter()
            .map(|pos| bounds.clamp(pos))
            .find(|pos| *pos != from && world.is_walkable(world.world_to_tile(*pos)));

        if let Some(destination) = destination {
            core.position = destination;
            if !core.machine.is_busy() {
                core.machine.set_state(CombatState::Moving);
            }
        }
    }

    /// Streams chunks around the player, recomputes visibility and populates
    /// newly generated chunks.
    fn refresh_world(&mut self) {
        self.world.update(
            self.player.position(),
            self.config.chunk_load_radius,
            self.config.visibility_radius,
            self.config.near_visibility_radius,
        );
        for coord in self.world.take_new_chunks() {
            self.events.push(GameEvent::ChunkLoaded { coord });
            self.spawn_encounters(coord);
        }
    }

    fn spawn_encounters(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.world.chunk(coord) else {
            return;
        };
        let plan = self.encounters.plan(chunk, &self.config.generation);
        let player = self.player.position();

        for spawn in plan {
            if self.enemies.len() >= self.config.max_enemies {
                log::debug!("Enemy cap {} reached, skipping spawns", self.config.max_enemies);
                break;
            }
            let position = self.world.tile_center(spawn.tile);
            if position.distance(player) < self.config.spawn_safe_radius {
                continue;
            }
            let spawned = match spawn.kind {
                SpawnKind::Enemy(kind) => Combatant::enemy(kind, position, &self.catalog),
                SpawnKind::Boss(boss) => {
                    let seed = derive_seed(self.seed(), spawn_salt(spawn.tile));
                    Combatant::boss(boss, position, &self.catalog, seed)
                }
            };
            match spawned {
                Ok(combatant) => self.enemies.push(combatant),
                Err(err) => log::warn!("Skipping spawn at {:?}: {}", spawn.tile, err),
            }
        }
    }

    fn resolve_events(&mut self) -> Vec<GameEvent> {
        let now = self.time;
        let player_id = self.player.id();
        let mut resolved = Vec::new();

        for event in self.events.drain() {
            match event {
                GameEvent::MeleeStrike {
                    attacker,
                    origin,
                    reach,
                    damage,
                } if attacker == player_id => {
                    let reach = reach + COMBATANT_RADIUS;
                    let mut deaths = Vec::new();
                    for_each_hostile(&mut self.enemies, |target| {
                        if target.is_dead() || target.position().distance(origin) > reach {
                            return;
                        }
                        self.statistics.damage_dealt += damage.max(0) as u64;
                        if target.take_damage(damage, now) == DamageOutcome::Killed {
                            deaths.push(GameEvent::CombatantDied {
                                id: target.id(),
                                kind: target.kind(),
                            });
                        }
                    });
                    resolved.push(event);
                    resolved.extend(deaths);
                }
                GameEvent::MeleeStrike {
                    origin,
                    reach,
                    damage,
                    ..
                } => {
                    let hit = self.player.position().distance(origin) <= reach + COMBATANT_RADIUS;
                    resolved.push(event);
                    if hit {
                        resolved.extend(self.damage_player(damage));
                    }
                }
                other => resolved.push(other),
            }
        }
        resolved
    }

    fn resolve_projectiles(&mut self) -> Vec<GameEvent> {
        let player_pos = self.player.position();
        let mut damage = Vec::new();
        for_each_hostile(&mut self.enemies, |shooter| {
            for projectile in shooter.core.projectiles.iter_mut() {
                if projectile.hits(player_pos, COMBATANT_RADIUS) {
                    projectile.active = false;
                    damage.push(projectile.damage);
                }
            }
            shooter.core.projectiles.retain(|p| p.active);
        });

        damage
            .into_iter()
            .flat_map(|amount| self.damage_player(amount))
            .collect()
    }

    fn damage_player(&mut self, amount: i32) -> Option<GameEvent> {
        if self.player.is_dead() {
            return None;
        }
        self.statistics.damage_taken += amount.max(0) as u64;
        if self.player.take_damage(amount, self.time) != DamageOutcome::Killed {
            return None;
        }
        log::info!("Player died at {:.1}s", self.time);
        self.completion_state = GameCompletionState::PlayerDied;
        Some(GameEvent::CombatantDied {
            id: self.player.id(),
            kind: CombatantKind::Player,
        })
    }

    fn despawn_corpses(&mut self) -> Vec<GameEvent> {
        let now = self.time;
        let mut gone = Vec::new();
        self.enemies.retain(|enemy| {
            // A dead boss stays until its minions are gone too
            let keep = !enemy.is_despawnable(now) || !enemy.minions().is_empty();
            if !keep {
                gone.push(GameEvent::Despawned { id: enemy.id() });
            }
            keep
        });
        gone
    }

    /// Serializes the player and enemies.
    pub fn save_to_json(&self) -> EmberfallResult<String> {
        let snapshot = SaveSnapshot {
            version: SAVE_VERSION,
            seed: self.seed(),
            time: self.time,
            player: self.player.to_record(),
            enemies: self.enemies.iter().map(Combatant::to_record).collect(),
            statistics: self.statistics.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Parses a snapshot written by [`GameState::save_to_json`].
    pub fn records_from_json(json: &str) -> EmberfallResult<SaveSnapshot> {
        let snapshot: SaveSnapshot = serde_json::from_str(json)?;
        if snapshot.version != SAVE_VERSION {
            return Err(EmberfallError::InvalidState(format!(
                "save version {} not supported",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    /// Replaces the player and enemies with the ones in a snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &SaveSnapshot) -> EmberfallResult<()> {
        self.player.apply_record(&snapshot.player)?;
        let mut enemies = Vec::with_capacity(snapshot.enemies.len());
        for record in &snapshot.enemies {
            let position = WorldPos::new(record.x, record.y);
            let mut enemy = match record.kind {
                CombatantKind::Enemy(kind) => Combatant::enemy(kind, position, &self.catalog)?,
                CombatantKind::Boss(boss) => {
                    Combatant::boss(boss, position, &self.catalog, derive_seed(snapshot.seed, enemies.len() as u64))?
                }
                CombatantKind::Player => {
                    return Err(EmberfallError::InvalidState("player record among enemies".to_string()))
                }
            };
            enemy.apply_record(record)?;
            enemies.push(enemy);
        }
        self.enemies = enemies;
        self.time = snapshot.time;
        self.statistics = snapshot.statistics.clone();
        self.completion_state = if self.player.is_dead() {
            GameCompletionState::PlayerDied
        } else {
            GameCompletionState::Playing
        };
        Ok(())
    }
}

fn player_attack(player: &mut Combatant, ctx: &mut TickContext) {
    let core = &mut player.core;
    if core.is_dead() || core.machine.is_busy() || !core.cooldowns.is_ready(AbilityId::Attack) {
        return;
    }
    core.cooldowns.start(AbilityId::Attack, core.stats.attack_cooldown);
    core.machine.set_state(CombatState::Attacking);
    ctx.events.push(GameEvent::MeleeStrike {
        attacker: core.id,
        origin: core.position,
        reach: core.stats.attack_range,
        damage: core.stats.attack_damage,
    });
}

/// Visits every enemy, boss and minion.
fn for_each_hostile(enemies: &mut [Combatant], mut visit: impl FnMut(&mut Combatant)) {
    for enemy in enemies.iter_mut() {
        visit(enemy);
        for minion in enemy.minions_mut() {
            visit(minion);
        }
    }
}

fn spawn_salt(tile: Position) -> u64 {
    ((tile.x as u32 as u64) << 32) | tile.y as u32 as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnemyKind, Material};

    fn open_state() -> GameState {
        let materials = vec![Material::Grass; 48 * 48];
        let map = PrebuiltMap::from_materials(48, 48, &materials).unwrap();
        let mut config = GameConfig::for_testing(12345);
        config.generation.enemy_density = 0.0;
        GameState::with_parts(config, Catalog::standard(), MapSource::Prebuilt(map)).unwrap()
    }

    #[test]
    fn test_game_state_creation() {
        let state = GameState::new(GameConfig::for_testing(12345)).unwrap();
        assert_eq!(state.tick_count, 0);
        assert_eq!(state.seed(), 12345);
        assert!(state.world.loaded_count() > 0);
        assert!(state.world.is_visible(state.world.world_to_tile(state.player.position())));
    }

    #[test]
    fn test_player_moves_on_walkable_ground() {
        let mut state = open_state();
        let start = state.player.position();
        let input = TickInput {
            movement: WorldPos::new(1.0, 0.0),
            attack: false,
        };
        for _ in 0..10 {
            state.tick(1.0 / 60.0, &input);
        }
        assert!(state.player.position().x > start.x);
        assert_eq!(state.player.position().y, start.y);
        assert_eq!(state.tick_count, 10);
    }

    #[test]
    fn test_player_blocked_by_wall() {
        let mut materials = vec![Material::Grass; 48 * 48];
        for y in 0..48 {
            materials[y * 48 + 25] = Material::CliffWall;
        }
        let map = PrebuiltMap::from_materials(48, 48, &materials).unwrap();
        let mut config = GameConfig::for_testing(1);
        config.generation.enemy_density = 0.0;
        let mut state = GameState::with_parts(config, Catalog::standard(), MapSource::Prebuilt(map)).unwrap();

        let input = TickInput {
            movement: WorldPos::new(1.0, 0.0),
            attack: false,
        };
        for _ in 0..300 {
            state.tick(1.0 / 60.0, &input);
        }
        let tile = state.world.world_to_tile(state.player.position());
        assert_eq!(tile.x, 24);
    }

    #[test]
    fn test_player_strike_kills_enemy_once() {
        let mut state = open_state();
        let pos = state.player.position() + WorldPos::new(10.0, 0.0);
        let mut slime = Combatant::enemy(EnemyKind::Slime, pos, &state.catalog).unwrap();
        slime.core.cooldowns.start(AbilityId::Attack, 100.0);
        state.enemies.push(slime);

        let attack = TickInput {
            movement: WorldPos::zero(),
            attack: true,
        };
        let mut died = 0;
        for _ in 0..120 {
            died += state
                .tick(1.0 / 60.0, &attack)
                .iter()
                .filter(|e| matches!(e, GameEvent::CombatantDied { .. }))
                .count();
        }
        assert_eq!(died, 1);
        assert_eq!(state.statistics.enemies_defeated, 1);
    }

    #[test]
    fn test_corpses_despawn_after_ttl() {
        let mut state = open_state();
        let pos = state.player.position() + WorldPos::new(200.0, 0.0);
        let mut goblin = Combatant::enemy(EnemyKind::Goblin, pos, &state.catalog).unwrap();
        goblin.take_damage(1000, 0.0);
        state.enemies.push(goblin);

        let idle = TickInput::default();
        let mut despawned = false;
        for _ in 0..(60 * 5) {
            despawned |= state
                .tick(1.0 / 60.0, &idle)
                .iter()
                .any(|e| matches!(e, GameEvent::Despawned { .. }));
        }
        assert!(despawned);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_save_round_trip() {
        let mut state = open_state();
        let pos = state.player.position() + WorldPos::new(300.0, 0.0);
        state
            .enemies
            .push(Combatant::enemy(EnemyKind::Orc, pos, &state.catalog).unwrap());
        state.player.take_damage(30, 0.0);

        let json = state.save_to_json().unwrap();
        let snapshot = GameState::records_from_json(&json).unwrap();
        assert_eq!(snapshot.enemies.len(), 1);

        let mut fresh = open_state();
        fresh.apply_snapshot(&snapshot).unwrap();
        assert_eq!(fresh.player.health(), 70);
        assert_eq!(fresh.enemies.len(), 1);
        assert_eq!(fresh.enemies[0].kind(), CombatantKind::Enemy(EnemyKind::Orc));
    }

    #[test]
    fn test_unsupported_save_version() {
        let state = open_state();
        let json = state.save_to_json().unwrap().replace("\"version\": 1", "\"version\": 99");
        assert!(GameState::records_from_json(&json).is_err());
    }

    #[test]
    fn test_statistics_update() {
        let mut stats = GameStatistics::new();
        stats.update_from_event(&GameEvent::ChunkLoaded {
            coord: ChunkCoord::new(0, 0),
        });
        stats.update_from_event(&GameEvent::CombatantDied {
            id: crate::new_entity_id(),
            kind: CombatantKind::Enemy(EnemyKind::Slime),
        });
        assert_eq!(stats.chunks_generated, 1);
        assert_eq!(stats.enemies_defeated, 1);
    }
}
