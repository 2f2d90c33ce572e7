//! # Input Module
//!
//! Keyboard polling for the real-time loop. Input is sampled once per
//! rendered frame and the same snapshot feeds every simulation tick run
//! during that frame.

use crate::{TickInput, WorldPos};
use macroquad::prelude::*;

/// Everything the player asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    /// Unit vector or zero
    pub movement: WorldPos,
    pub attack: bool,
    pub quit: bool,
    pub debug_toggle: bool,
}

impl InputSnapshot {
    /// Builds a snapshot from raw direction flags. Diagonals are normalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::InputSnapshot;
    ///
    /// let snapshot = InputSnapshot::from_directions(true, false, false, true);
    /// assert!((snapshot.movement.length() - 1.0).abs() < 1e-5);
    /// assert!(snapshot.movement.x > 0.0 && snapshot.movement.y < 0.0);
    /// ```
    pub fn from_directions(up: bool, down: bool, left: bool, right: bool) -> Self {
        let x = (right as i32 - left as i32) as f32;
        let y = (down as i32 - up as i32) as f32;
        Self {
            movement: WorldPos::new(x, y).normalized_or(WorldPos::zero()),
            ..Self::default()
        }
    }

    /// The part of the snapshot the simulation consumes.
    pub fn to_tick_input(&self) -> TickInput {
        TickInput {
            movement: self.movement,
            attack: self.attack,
        }
    }
}

/// Input handler for processing player commands.
///
/// Reads the keyboard through macroquad and reduces it to an
/// [`InputSnapshot`].
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::InputHandler;
    ///
    /// let input_handler = InputHandler::new();
    /// assert!(input_handler.vi_keys_enabled);
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Samples the keyboard. Movement keys are held, the rest are edge
    /// triggered except attack, which repeats while held.
    pub fn poll(&self) -> InputSnapshot {
        let held = |keys: &[KeyCode]| keys.iter().any(|key| is_key_down(*key));

        let vi = self.vi_keys_enabled;
        let up = held(&[KeyCode::Up, KeyCode::W]) || (vi && is_key_down(KeyCode::K));
        let down = held(&[KeyCode::Down, KeyCode::S]) || (vi && is_key_down(KeyCode::J));
        let left = held(&[KeyCode::Left, KeyCode::A]) || (vi && is_key_down(KeyCode::H));
        let right = held(&[KeyCode::Right, KeyCode::D]) || (vi && is_key_down(KeyCode::L));

        InputSnapshot {
            attack: held(&[KeyCode::Space, KeyCode::Enter]) || is_mouse_button_down(MouseButton::Left),
            quit: is_key_pressed(KeyCode::Escape),
            debug_toggle: is_key_pressed(KeyCode::F3),
            ..InputSnapshot::from_directions(up, down, left, right)
        }
    }
}
