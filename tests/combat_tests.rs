//! Boss and enemy behaviour inside a running game state.

use emberfall::{
    BossPhase, BossType, Catalog, CombatState, Combatant, CombatantKind, EnemyKind, GameConfig,
    GameEvent, GameState, MapSource, Material, PrebuiltMap, TickContext, TickInput, WorldPos,
};

const DT: f32 = 1.0 / 60.0;

fn arena() -> GameState {
    let materials = vec![Material::Grass; 48 * 48];
    let map = PrebuiltMap::from_materials(48, 48, &materials).unwrap();
    let mut config = GameConfig::for_testing(4242);
    config.generation.enemy_density = 0.0;
    GameState::with_parts(config, Catalog::standard(), MapSource::Prebuilt(map)).unwrap()
}

fn add_boss(state: &mut GameState, boss: BossType, offset: WorldPos) -> usize {
    let position = state.player.position() + offset;
    let combatant = Combatant::boss(boss, position, &state.catalog, 99).unwrap();
    state.enemies.push(combatant);
    state.enemies.len() - 1
}

fn run(state: &mut GameState, ticks: usize, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(state.tick(DT, input));
    }
    events
}

#[test]
fn test_phase_change_surfaces_as_event() {
    let mut state = arena();
    let index = add_boss(&mut state, BossType::GoblinKing, WorldPos::new(600.0, 0.0));

    let boss = &mut state.enemies[index];
    let damage = boss.max_health() * 52 / 100;
    boss.take_damage(damage, 0.0);

    let events = run(&mut state, 2, &TickInput::default());
    let phases: Vec<BossPhase> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![BossPhase::Phase2]);
}

#[test]
fn test_nearest_boss_ignores_the_dead_and_the_distant() {
    let mut state = arena();
    let near = add_boss(&mut state, BossType::StoneGolem, WorldPos::new(200.0, 0.0));
    add_boss(&mut state, BossType::Necromancer, WorldPos::new(500.0, 0.0));

    let found = state.nearest_boss(1000.0).map(|b| b.kind());
    assert_eq!(found, Some(CombatantKind::Boss(BossType::StoneGolem)));
    assert!(state.nearest_boss(100.0).is_none());

    state.enemies[near].take_damage(100_000, 0.0);
    let found = state.nearest_boss(1000.0).map(|b| b.kind());
    assert_eq!(found, Some(CombatantKind::Boss(BossType::Necromancer)));
}

#[test]
fn test_dead_boss_lingers_until_minions_fall() {
    let mut state = arena();
    let index = add_boss(&mut state, BossType::Necromancer, WorldPos::new(600.0, 0.0));

    {
        let target = state.player.position();
        let mut ctx = TickContext {
            now: state.time,
            events: &mut state.events,
            bounds: state.world.bounds(),
        };
        assert!(state.enemies[index].use_boss_ability(1, target, &mut ctx));
    }
    let summoned = run(&mut state, 1, &TickInput::default());
    assert!(summoned
        .iter()
        .any(|e| matches!(e, GameEvent::MinionsSummoned { .. })));
    assert!(!state.enemies[index].minions().is_empty());

    state.enemies[index].take_damage(100_000, state.time);
    let idle = TickInput::default();
    let events = run(&mut state, 60 * 20, &idle);
    assert!(!events.iter().any(|e| matches!(e, GameEvent::Despawned { .. })));
    assert_eq!(state.enemies.len(), 1);

    let now = state.time;
    for minion in state.enemies[0].minions_mut() {
        minion.take_damage(100_000, now);
    }
    let events = run(&mut state, 5, &idle);
    assert!(events.iter().any(|e| matches!(e, GameEvent::Despawned { .. })));
    assert!(state.enemies.is_empty());
}

#[test]
fn test_player_strikes_reach_minions() {
    let mut state = arena();
    let index = add_boss(&mut state, BossType::Necromancer, WorldPos::new(600.0, 0.0));
    {
        let target = state.player.position();
        let mut ctx = TickContext {
            now: state.time,
            events: &mut state.events,
            bounds: state.world.bounds(),
        };
        state.enemies[index].use_boss_ability(1, target, &mut ctx);
    }

    // Pull one minion next to the player
    let beside = state.player.position() + WorldPos::new(8.0, 0.0);
    let minion = &mut state.enemies[index].minions_mut()[0];
    minion.core.position = beside;
    let before = minion.health();

    let attack = TickInput {
        movement: WorldPos::zero(),
        attack: true,
    };
    run(&mut state, 1, &attack);
    let after = state.enemies[index]
        .minions()
        .iter()
        .map(|m| m.health())
        .min()
        .unwrap_or(0);
    assert!(after < before);
}

#[test]
fn test_enemy_chases_and_hits_player() {
    let mut state = arena();
    let position = state.player.position() + WorldPos::new(120.0, 0.0);
    state
        .enemies
        .push(Combatant::enemy(EnemyKind::Goblin, position, &state.catalog).unwrap());

    let events = run(&mut state, 60 * 5, &TickInput::default());
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::MeleeStrike { .. })));
    assert!(state.player.health() < state.player.max_health());
    assert!(state.statistics.damage_taken > 0);
    assert_ne!(state.player.state(), CombatState::Dead);
}
