//! # Combatant State Machine
//!
//! Drives animation frames and gates which behaviours a combatant may run.
//!
//! Every state change resets the frame counter and re-resolves the sprite key
//! `"<prefix>/<state>/<facing>"`. A facing change alone re-resolves the key
//! but leaves the frame alone. `Dead` is terminal until
//! [`StateMachine::reset_to_spawn`].

use crate::game::Facing;
use serde::{Deserialize, Serialize};

/// Animation and behaviour states shared by every combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatState {
    Idle,
    Moving,
    Attacking,
    Hurt,
    Dead,
    Transforming,
    Jumping,
    Dashing,
    SuperAttacking,
}

impl CombatState {
    pub const ALL: [CombatState; 9] = [
        CombatState::Idle,
        CombatState::Moving,
        CombatState::Attacking,
        CombatState::Hurt,
        CombatState::Dead,
        CombatState::Transforming,
        CombatState::Jumping,
        CombatState::Dashing,
        CombatState::SuperAttacking,
    ];

    /// Ability states entered only from `Idle` or `Moving`.
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            CombatState::Transforming
                | CombatState::Jumping
                | CombatState::Dashing
                | CombatState::SuperAttacking
        )
    }

    /// States that return to `Idle` once their animation completes.
    pub fn is_one_shot(self) -> bool {
        matches!(self, CombatState::Attacking | CombatState::Hurt) || self.is_extended()
    }

    /// Token used in sprite keys.
    pub fn as_token(self) -> &'static str {
        match self {
            CombatState::Idle => "idle",
            CombatState::Moving => "move",
            CombatState::Attacking => "attack",
            CombatState::Hurt => "hurt",
            CombatState::Dead => "dead",
            CombatState::Transforming => "transform",
            CombatState::Jumping => "jump",
            CombatState::Dashing => "dash",
            CombatState::SuperAttacking => "super",
        }
    }
}

/// Frame counts per state plus the shared frame duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSet {
    pub frame_duration: f32,
    pub idle: u32,
    pub moving: u32,
    pub attacking: u32,
    pub hurt: u32,
    pub dead: u32,
    pub extended: u32,
}

impl AnimationSet {
    pub fn frames(&self, state: CombatState) -> u32 {
        let frames = match state {
            CombatState::Idle => self.idle,
            CombatState::Moving => self.moving,
            CombatState::Attacking => self.attacking,
            CombatState::Hurt => self.hurt,
            CombatState::Dead => self.dead,
            _ => self.extended,
        };
        frames.max(1)
    }

    /// Seconds one full cycle of `state` takes.
    pub fn cycle_time(&self, state: CombatState) -> f32 {
        self.frames(state) as f32 * self.frame_duration
    }
}

impl Default for AnimationSet {
    fn default() -> Self {
        Self {
            frame_duration: 0.1,
            idle: 4,
            moving: 6,
            attacking: 5,
            hurt: 3,
            dead: 6,
            extended: 6,
        }
    }
}

/// Per-combatant animation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    state: CombatState,
    facing: Facing,
    frame: u32,
    timer: f32,
    prefix: String,
    sprite_key: String,
    animation: AnimationSet,
    died_at: Option<f32>,
}

impl StateMachine {
    /// Creates a machine in `Idle`, facing right.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{AnimationSet, CombatState, StateMachine};
    ///
    /// let mut machine = StateMachine::new("enemies/goblin", AnimationSet::default());
    /// assert_eq!(machine.sprite_key(), "enemies/goblin/idle/right");
    /// assert!(machine.set_state(CombatState::Moving));
    /// assert_eq!(machine.sprite_key(), "enemies/goblin/move/right");
    /// ```
    pub fn new(prefix: impl Into<String>, animation: AnimationSet) -> Self {
        let mut machine = Self {
            state: CombatState::Idle,
            facing: Facing::Right,
            frame: 0,
            timer: 0.0,
            prefix: prefix.into(),
            sprite_key: String::new(),
            animation,
            died_at: None,
        };
        machine.resolve_sprite();
        machine
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn sprite_key(&self) -> &str {
        &self.sprite_key
    }

    pub fn animation(&self) -> &AnimationSet {
        &self.animation
    }

    /// When the combatant died, in simulation seconds.
    pub fn died_at(&self) -> Option<f32> {
        self.died_at
    }

    pub fn is_dead(&self) -> bool {
        self.state == CombatState::Dead
    }

    /// Attacking, hurt or in an ability state.
    pub fn is_busy(&self) -> bool {
        self.state.is_one_shot()
    }

    fn resolve_sprite(&mut self) {
        self.sprite_key = format!(
            "{}/{}/{}",
            self.prefix,
            self.state.as_token(),
            self.facing.as_token()
        );
    }

    /// Switches state. Returns false when nothing changed or the machine is dead.
    ///
    /// Entering `Dead` goes through [`StateMachine::kill`] so the death time
    /// gets recorded.
    pub fn set_state(&mut self, state: CombatState) -> bool {
        if self.state == CombatState::Dead || self.state == state || state == CombatState::Dead {
            return false;
        }
        self.state = state;
        self.frame = 0;
        self.timer = 0.0;
        self.resolve_sprite();
        true
    }

    /// Enters an ability state if the combatant is idle or moving.
    pub fn try_enter_extended(&mut self, state: CombatState) -> bool {
        if !state.is_extended() {
            return false;
        }
        match self.state {
            CombatState::Idle | CombatState::Moving => self.set_state(state),
            _ => false,
        }
    }

    pub fn set_facing(&mut self, facing: Facing) {
        if self.facing != facing {
            self.facing = facing;
            self.resolve_sprite();
        }
    }

    /// Moves to `Dead` and stamps the death time. Only the first call has
    /// any effect.
    pub fn kill(&mut self, now: f32) -> bool {
        if self.state == CombatState::Dead {
            return false;
        }
        self.state = CombatState::Dead;
        self.frame = 0;
        self.timer = 0.0;
        if self.died_at.is_none() {
            self.died_at = Some(now);
        }
        self.resolve_sprite();
        true
    }

    /// Leaves any state, including `Dead`, for a fresh `Idle`.
    pub fn reset_to_spawn(&mut self) {
        self.state = CombatState::Idle;
        self.frame = 0;
        self.timer = 0.0;
        self.died_at = None;
        self.resolve_sprite();
    }

    /// Advances the animation. Returns true when a full cycle completed.
    ///
    /// One-shot states drop back to `Idle` on completion. `Dead` holds its
    /// last frame.
    pub fn advance(&mut self, dt: f32) -> bool {
        if dt <= 0.0 || !dt.is_finite() {
            return false;
        }
        let frames = self.animation.frames(self.state);
        let duration = self.animation.frame_duration.max(f32::EPSILON);

        if self.state == CombatState::Dead && self.frame + 1 >= frames {
            self.frame = frames - 1;
            return false;
        }

        self.timer += dt;
        let mut completed = false;
        while self.timer >= duration {
            self.timer -= duration;
            if self.frame + 1 >= frames {
                if self.state == CombatState::Dead {
                    self.frame = frames - 1;
                    self.timer = 0.0;
                    return false;
                }
                self.frame = 0;
                completed = true;
                break;
            }
            self.frame += 1;
        }

        if completed && self.state.is_one_shot() {
            self.set_state(CombatState::Idle);
        }
        completed
    }
}
