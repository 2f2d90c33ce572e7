//! # Rendering Module
//!
//! Macroquad adapters that draw the simulation. Rendering only reads
//! [`crate::GameState`]; the camera and sprite lookup are plain data so they
//! can be tested without a window.

pub mod camera;
pub mod display;
pub mod sprites;

pub use camera::*;
pub use display::*;
pub use sprites::*;
