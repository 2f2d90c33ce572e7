//! # Combatant Catalog
//!
//! Per-kind numbers (health, speeds, ranges, attacks, abilities, sprite
//! prefixes) as data. The catalog is built once at startup, either from the
//! built-in table or from JSON, and handed to whatever spawns combatants.

use super::{AbilityId, AnimationSet, CombatState, ProjectileProfile};
use crate::{EmberfallError, EmberfallResult, Facing};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Regular enemy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Slime,
    Goblin,
    Skeleton,
    SkeletonArcher,
    Orc,
    DarkMage,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Slime,
        EnemyKind::Goblin,
        EnemyKind::Skeleton,
        EnemyKind::SkeletonArcher,
        EnemyKind::Orc,
        EnemyKind::DarkMage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Slime => "slime",
            EnemyKind::Goblin => "goblin",
            EnemyKind::Skeleton => "skeleton",
            EnemyKind::SkeletonArcher => "skeleton_archer",
            EnemyKind::Orc => "orc",
            EnemyKind::DarkMage => "dark_mage",
        }
    }
}

/// Boss types. Each has its own ability selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossType {
    GoblinKing,
    Necromancer,
    StoneGolem,
}

impl BossType {
    pub const ALL: [BossType; 3] = [BossType::GoblinKing, BossType::Necromancer, BossType::StoneGolem];

    pub fn name(self) -> &'static str {
        match self {
            BossType::GoblinKing => "goblin_king",
            BossType::Necromancer => "necromancer",
            BossType::StoneGolem => "stone_golem",
        }
    }
}

/// Mutable combat numbers. Boss phases scale these in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// World units per second
    pub move_speed: f32,
    /// Multiplier on vertical movement
    pub vertical_speed_factor: f32,
    pub attack_damage: i32,
    /// Seconds between basic attacks
    pub attack_cooldown: f32,
    pub attack_range: f32,
    pub aggro_radius: f32,
    /// Damage dealt by touching the target, per contact cooldown
    pub contact_damage: f32,
    pub contact_range: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            move_speed: 60.0,
            vertical_speed_factor: 0.7,
            attack_damage: 6,
            attack_cooldown: 1.2,
            attack_range: 30.0,
            aggro_radius: 250.0,
            contact_damage: 0.0,
            contact_range: 18.0,
        }
    }
}

/// How a kind chooses its basic attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttackStyle {
    Melee,
    Ranged,
    /// Ranged at or beyond `ranged_min`, melee closer in
    Dual { ranged_min: f32, melee_reach: f32 },
}

/// Independent projectile fire that runs alongside the melee machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolleyProfile {
    pub range: f32,
    pub cooldown: f32,
    pub count: u32,
    /// Radians between neighbouring shots
    pub spread: f32,
    pub projectile: ProjectileProfile,
}

/// A kind-specific ability that uses one of the extended states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedAbility {
    pub ability: AbilityId,
    pub state: CombatState,
    pub cooldown: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Movement speed multiplier while the state lasts
    pub speed_multiplier: f32,
    /// Strike damage when the ability lands, zero for pure movement
    pub damage: i32,
}

/// Everything needed to spawn one kind of combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindProfile {
    pub sprite_prefix: String,
    pub max_health: i32,
    pub stats: Stats,
    pub attack: AttackStyle,
    #[serde(default)]
    pub projectile: Option<ProjectileProfile>,
    #[serde(default)]
    pub volley: Option<VolleyProfile>,
    #[serde(default)]
    pub extended: Vec<ExtendedAbility>,
    /// Seconds a corpse lingers before removal
    pub corpse_ttl: f32,
    #[serde(default)]
    pub animation: AnimationSet,
}

impl KindProfile {
    fn melee(prefix: &str, max_health: i32, stats: Stats) -> Self {
        Self {
            sprite_prefix: prefix.to_string(),
            max_health,
            stats,
            attack: AttackStyle::Melee,
            projectile: None,
            volley: None,
            extended: Vec::new(),
            corpse_ttl: 4.0,
            animation: AnimationSet::default(),
        }
    }
}

/// One entry of a boss's ability roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub id: AbilityId,
    pub name: String,
    pub cooldown_seconds: f32,
}

impl AbilitySpec {
    fn new(id: AbilityId, name: &str, cooldown_seconds: f32) -> Self {
        Self {
            id,
            name: name.to_string(),
            cooldown_seconds,
        }
    }
}

/// Distance bands used by boss ability policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBands {
    /// At or below this the target is "close"
    pub close: f32,
    /// At or above this the target is "far"; between is "mid"
    pub far: f32,
}

/// Boss profile: a regular kind profile plus abilities and minions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossProfile {
    pub base: KindProfile,
    pub abilities: Vec<AbilitySpec>,
    /// Seconds that must pass between any two abilities
    pub global_cooldown: f32,
    pub bands: DistanceBands,
    pub max_minions: usize,
    pub minions_per_summon: usize,
    pub minion_kind: EnemyKind,
    /// Chance that damage in the last phase resets the global cooldown
    pub desperation_chance: f32,
    /// Area strike reach for slam-type abilities
    pub slam_reach: f32,
    pub slam_damage: i32,
    /// Speed multiplier while charging
    pub charge_multiplier: f32,
    /// Projectiles per barrage
    pub barrage_count: u32,
    pub barrage_projectile: ProjectileProfile,
}

/// Data table of every spawnable kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub player: KindProfile,
    pub enemies: HashMap<EnemyKind, KindProfile>,
    pub bosses: HashMap<BossType, BossProfile>,
}

impl Catalog {
    /// The built-in table.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{Catalog, EnemyKind};
    ///
    /// let catalog = Catalog::standard();
    /// let goblin = catalog.enemy(EnemyKind::Goblin).unwrap();
    /// assert_eq!(goblin.sprite_prefix, "enemies/goblin");
    /// ```
    pub fn standard() -> Self {
        let mut enemies = HashMap::new();

        let mut slime = KindProfile::melee(
            "enemies/slime",
            30,
            Stats {
                move_speed: 45.0,
                attack_damage: 4,
                attack_range: 26.0,
                aggro_radius: 220.0,
                ..Stats::default()
            },
        );
        slime.extended.push(ExtendedAbility {
            ability: AbilityId::Jump,
            state: CombatState::Jumping,
            cooldown: 4.0,
            min_distance: 40.0,
            max_distance: 140.0,
            speed_multiplier: 3.0,
            damage: 0,
        });
        enemies.insert(EnemyKind::Slime, slime);

        let mut goblin = KindProfile::melee(
            "enemies/goblin",
            45,
            Stats {
                move_speed: 85.0,
                attack_damage: 6,
                attack_cooldown: 1.0,
                attack_range: 30.0,
                aggro_radius: 260.0,
                ..Stats::default()
            },
        );
        goblin.extended.push(ExtendedAbility {
            ability: AbilityId::Dash,
            state: CombatState::Dashing,
            cooldown: 5.0,
            min_distance: 60.0,
            max_distance: 160.0,
            speed_multiplier: 3.5,
            damage: 0,
        });
        enemies.insert(EnemyKind::Goblin, goblin);

        let mut skeleton = KindProfile::melee(
            "enemies/skeleton",
            60,
            Stats {
                move_speed: 70.0,
                attack_damage: 8,
                attack_range: 32.0,
                aggro_radius: 280.0,
                ..Stats::default()
            },
        );
        skeleton.volley = Some(VolleyProfile {
            range: 200.0,
            cooldown: 5.0,
            count: 1,
            spread: 0.0,
            projectile: ProjectileProfile {
                speed: 220.0,
                damage: 5,
                ..ProjectileProfile::default()
            },
        });
        enemies.insert(EnemyKind::Skeleton, skeleton);

        let mut archer = KindProfile::melee(
            "enemies/skeleton_archer",
            40,
            Stats {
                move_speed: 60.0,
                attack_damage: 5,
                attack_cooldown: 1.6,
                attack_range: 260.0,
                aggro_radius: 320.0,
                ..Stats::default()
            },
        );
        archer.attack = AttackStyle::Dual {
            ranged_min: 80.0,
            melee_reach: 30.0,
        };
        archer.projectile = Some(ProjectileProfile {
            speed: 320.0,
            damage: 8,
            ..ProjectileProfile::default()
        });
        enemies.insert(EnemyKind::SkeletonArcher, archer);

        let mut orc = KindProfile::melee(
            "enemies/orc",
            120,
            Stats {
                move_speed: 65.0,
                attack_damage: 12,
                attack_cooldown: 1.5,
                attack_range: 36.0,
                aggro_radius: 300.0,
                contact_damage: 4.0,
                ..Stats::default()
            },
        );
        orc.corpse_ttl = 6.0;
        orc.extended.push(ExtendedAbility {
            ability: AbilityId::SuperAttack,
            state: CombatState::SuperAttacking,
            cooldown: 8.0,
            min_distance: 40.0,
            max_distance: 100.0,
            speed_multiplier: 2.0,
            damage: 25,
        });
        orc.extended.push(ExtendedAbility {
            ability: AbilityId::Transform,
            state: CombatState::Transforming,
            cooldown: 30.0,
            min_distance: 100.0,
            max_distance: 300.0,
            speed_multiplier: 0.0,
            damage: 0,
        });
        enemies.insert(EnemyKind::Orc, orc);

        let mut mage = KindProfile::melee(
            "enemies/dark_mage",
            50,
            Stats {
                move_speed: 50.0,
                attack_damage: 10,
                attack_cooldown: 2.0,
                attack_range: 240.0,
                aggro_radius: 320.0,
                ..Stats::default()
            },
        );
        mage.attack = AttackStyle::Ranged;
        mage.projectile = Some(ProjectileProfile {
            speed: 240.0,
            damage: 10,
            radius: 8.0,
            ..ProjectileProfile::default()
        });
        mage.volley = Some(VolleyProfile {
            range: 320.0,
            cooldown: 6.0,
            count: 5,
            spread: 0.25,
            projectile: ProjectileProfile {
                speed: 200.0,
                damage: 6,
                ..ProjectileProfile::default()
            },
        });
        enemies.insert(EnemyKind::DarkMage, mage);

        let mut bosses = HashMap::new();
        bosses.insert(
            BossType::GoblinKing,
            BossProfile {
                base: KindProfile {
                    corpse_ttl: 10.0,
                    ..KindProfile::melee(
                        "bosses/goblin_king",
                        500,
                        Stats {
                            move_speed: 70.0,
                            attack_damage: 14,
                            attack_cooldown: 1.5,
                            attack_range: 40.0,
                            aggro_radius: 400.0,
                            contact_damage: 10.0,
                            contact_range: 28.0,
                            ..Stats::default()
                        },
                    )
                },
                abilities: vec![
                    AbilitySpec::new(AbilityId::Summon, "Rally the Horde", 10.0),
                    AbilitySpec::new(AbilityId::Charge, "Royal Charge", 6.0),
                    AbilitySpec::new(AbilityId::GroundSlam, "Ground Slam", 5.0),
                ],
                global_cooldown: 2.0,
                bands: DistanceBands {
                    close: 80.0,
                    far: 250.0,
                },
                max_minions: 4,
                minions_per_summon: 2,
                minion_kind: EnemyKind::Goblin,
                desperation_chance: 0.3,
                slam_reach: 90.0,
                slam_damage: 18,
                charge_multiplier: 3.0,
                barrage_count: 0,
                barrage_projectile: ProjectileProfile::default(),
            },
        );
        bosses.insert(
            BossType::Necromancer,
            BossProfile {
                base: KindProfile {
                    corpse_ttl: 10.0,
                    ..KindProfile::melee(
                        "bosses/necromancer",
                        420,
                        Stats {
                            move_speed: 55.0,
                            attack_damage: 10,
                            attack_cooldown: 1.8,
                            attack_range: 36.0,
                            aggro_radius: 420.0,
                            contact_damage: 6.0,
                            contact_range: 26.0,
                            ..Stats::default()
                        },
                    )
                },
                abilities: vec![
                    AbilitySpec::new(AbilityId::Teleport, "Shadow Step", 7.0),
                    AbilitySpec::new(AbilityId::Summon, "Raise Dead", 12.0),
                    AbilitySpec::new(AbilityId::Barrage, "Bone Barrage", 4.0),
                ],
                global_cooldown: 1.5,
                bands: DistanceBands {
                    close: 90.0,
                    far: 260.0,
                },
                max_minions: 5,
                minions_per_summon: 3,
                minion_kind: EnemyKind::Skeleton,
                desperation_chance: 0.3,
                slam_reach: 0.0,
                slam_damage: 0,
                charge_multiplier: 1.0,
                barrage_count: 8,
                barrage_projectile: ProjectileProfile {
                    speed: 210.0,
                    damage: 7,
                    max_lifetime: 2.5,
                    radius: 7.0,
                },
            },
        );
        bosses.insert(
            BossType::StoneGolem,
            BossProfile {
                base: KindProfile {
                    corpse_ttl: 12.0,
                    ..KindProfile::melee(
                        "bosses/stone_golem",
                        800,
                        Stats {
                            move_speed: 40.0,
                            attack_damage: 22,
                            attack_cooldown: 2.2,
                            attack_range: 44.0,
                            aggro_radius: 380.0,
                            contact_damage: 14.0,
                            contact_range: 32.0,
                            ..Stats::default()
                        },
                    )
                },
                abilities: vec![
                    AbilitySpec::new(AbilityId::Charge, "Landslide", 8.0),
                    AbilitySpec::new(AbilityId::BoulderThrow, "Boulder Throw", 4.0),
                    AbilitySpec::new(AbilityId::Quake, "Quake", 9.0),
                ],
                global_cooldown: 2.5,
                bands: DistanceBands {
                    close: 100.0,
                    far: 240.0,
                },
                max_minions: 0,
                minions_per_summon: 0,
                minion_kind: EnemyKind::Slime,
                desperation_chance: 0.3,
                slam_reach: 140.0,
                slam_damage: 24,
                charge_multiplier: 4.0,
                barrage_count: 1,
                barrage_projectile: ProjectileProfile {
                    speed: 260.0,
                    damage: 20,
                    max_lifetime: 2.0,
                    radius: 14.0,
                },
            },
        );

        let player = KindProfile {
            corpse_ttl: f32::MAX,
            ..KindProfile::melee(
                "player",
                crate::config::DEFAULT_PLAYER_HEALTH,
                Stats {
                    move_speed: crate::config::PLAYER_MOVE_SPEED,
                    vertical_speed_factor: 1.0,
                    attack_damage: 15,
                    attack_cooldown: 0.4,
                    attack_range: 40.0,
                    aggro_radius: 0.0,
                    ..Stats::default()
                },
            )
        };

        Self {
            player,
            enemies,
            bosses,
        }
    }

    pub fn enemy(&self, kind: EnemyKind) -> EmberfallResult<&KindProfile> {
        self.enemies
            .get(&kind)
            .ok_or_else(|| EmberfallError::UnknownKind(kind.name().to_string()))
    }

    pub fn boss(&self, boss: BossType) -> EmberfallResult<&BossProfile> {
        self.bosses
            .get(&boss)
            .ok_or_else(|| EmberfallError::UnknownKind(boss.name().to_string()))
    }

    pub fn from_json(json: &str) -> EmberfallResult<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        Ok(catalog.sanitized())
    }

    pub fn to_json(&self) -> EmberfallResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> EmberfallResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Every sprite key a combatant from this catalog can ask for, with the
    /// frame count of its animation. Used to preload sprite sheets.
    pub fn sprite_manifest(&self) -> Vec<(String, u32)> {
        let profiles = std::iter::once(&self.player)
            .chain(self.enemies.values())
            .chain(self.bosses.values().map(|b| &b.base));

        let mut keys = Vec::new();
        for profile in profiles {
            for state in CombatState::ALL {
                for facing in [Facing::Left, Facing::Right, Facing::Up, Facing::Down] {
                    keys.push((
                        format!("{}/{}/{}", profile.sprite_prefix, state.as_token(), facing.as_token()),
                        profile.animation.frames(state),
                    ));
                }
            }
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Clamps chances and counts loaded from outside into usable ranges.
    pub fn sanitized(mut self) -> Self {
        for (boss, profile) in self.bosses.iter_mut() {
            if !(0.0..=1.0).contains(&profile.desperation_chance) {
                log::warn!(
                    "{} desperation chance {} clamped",
                    boss.name(),
                    profile.desperation_chance
                );
                profile.desperation_chance = profile.desperation_chance.clamp(0.0, 1.0);
            }
            if profile.global_cooldown < 0.0 {
                log::warn!("{} global cooldown below zero, using 0", boss.name());
                profile.global_cooldown = 0.0;
            }
        }
        let profiles = std::iter::once(&mut self.player)
            .chain(self.enemies.values_mut())
            .chain(self.bosses.values_mut().map(|b| &mut b.base));
        for profile in profiles {
            if profile.max_health < 1 {
                log::warn!("{} max health {} raised to 1", profile.sprite_prefix, profile.max_health);
                profile.max_health = 1;
            }
        }
        self
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_complete() {
        let catalog = Catalog::standard();
        for kind in EnemyKind::ALL {
            assert!(catalog.enemy(kind).is_ok(), "{:?}", kind);
        }
        for boss in BossType::ALL {
            let profile = catalog.boss(boss).unwrap();
            assert_eq!(profile.abilities.len(), 3);
            assert_eq!(profile.desperation_chance, 0.3);
        }
    }

    #[test]
    fn test_catalog_json_round_trip_and_sanitize() {
        let mut catalog = Catalog::standard();
        if let Some(king) = catalog.bosses.get_mut(&BossType::GoblinKing) {
            king.desperation_chance = 4.0;
        }
        let json = serde_json::to_string(&catalog).unwrap();
        let loaded = Catalog::from_json(&json).unwrap();
        assert_eq!(
            loaded.boss(BossType::GoblinKing).unwrap().desperation_chance,
            1.0
        );
        assert_eq!(loaded.enemies.len(), EnemyKind::ALL.len());
    }

    #[test]
    fn test_missing_kind_is_an_error() {
        let mut catalog = Catalog::standard();
        catalog.enemies.remove(&EnemyKind::Orc);
        assert!(matches!(
            catalog.enemy(EnemyKind::Orc),
            Err(EmberfallError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_sprite_manifest_covers_every_state() {
        let manifest = Catalog::standard().sprite_manifest();
        assert!(manifest.iter().any(|(key, _)| key == "enemies/goblin/idle/right"));
        assert!(manifest.iter().any(|(key, _)| key.ends_with("/dead/left")));
        assert!(manifest.iter().all(|(_, frames)| *frames >= 1));
    }
}
