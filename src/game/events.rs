//! Per-tick event queue.
//!
//! Combatants never reach into each other. They push events here and the
//! game state resolves them once per tick, after every update has run.

use crate::combat::{AbilityId, BossPhase, CombatantKind};
use crate::game::{ChunkCoord, EntityId, WorldPos};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Area damage around `origin`, hitting the attacker's opponents
    MeleeStrike {
        attacker: EntityId,
        origin: WorldPos,
        reach: f32,
        damage: i32,
    },
    AbilityUsed {
        combatant: EntityId,
        ability: AbilityId,
    },
    MinionsSummoned {
        boss: EntityId,
        count: usize,
    },
    PhaseChanged {
        boss: EntityId,
        phase: BossPhase,
    },
    CombatantDied {
        id: EntityId,
        kind: CombatantKind,
    },
    Despawned {
        id: EntityId,
    },
    ChunkLoaded {
        coord: ChunkCoord,
    },
}

/// FIFO of events waiting to be resolved.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}
