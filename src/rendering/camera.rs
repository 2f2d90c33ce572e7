//! Screen/world mapping for a camera that follows the player.

use crate::{Position, WorldPos};

/// A camera centred on a world point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: WorldPos,
    pub screen_width: f32,
    pub screen_height: f32,
    /// Screen pixels per world unit
    pub zoom: f32,
}

impl Viewport {
    pub fn new(screen_width: f32, screen_height: f32, zoom: f32) -> Self {
        Self {
            center: WorldPos::zero(),
            screen_width,
            screen_height,
            zoom: if zoom > 0.0 { zoom } else { 1.0 },
        }
    }

    pub fn center_on(&mut self, point: WorldPos) {
        self.center = point;
    }

    /// Screen position of a world point.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{Viewport, WorldPos};
    ///
    /// let mut view = Viewport::new(800.0, 600.0, 1.0);
    /// view.center_on(WorldPos::new(100.0, 100.0));
    /// assert_eq!(view.world_to_screen(WorldPos::new(100.0, 100.0)), (400.0, 300.0));
    /// ```
    pub fn world_to_screen(&self, point: WorldPos) -> (f32, f32) {
        (
            (point.x - self.center.x) * self.zoom + self.screen_width / 2.0,
            (point.y - self.center.y) * self.zoom + self.screen_height / 2.0,
        )
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> WorldPos {
        WorldPos::new(
            (x - self.screen_width / 2.0) / self.zoom + self.center.x,
            (y - self.screen_height / 2.0) / self.zoom + self.center.y,
        )
    }

    /// Inclusive tile range covering the screen, padded by one tile.
    pub fn visible_tiles(&self, tile_size: f32) -> (Position, Position) {
        let top_left = self.screen_to_world(0.0, 0.0);
        let bottom_right = self.screen_to_world(self.screen_width, self.screen_height);
        (
            Position::new(
                (top_left.x / tile_size).floor() as i32 - 1,
                (top_left.y / tile_size).floor() as i32 - 1,
            ),
            Position::new(
                (bottom_right.x / tile_size).floor() as i32 + 1,
                (bottom_right.y / tile_size).floor() as i32 + 1,
            ),
        )
    }

    /// Whether a world point lands on screen, with `margin` pixels of slack.
    pub fn is_on_screen(&self, point: WorldPos, margin: f32) -> bool {
        let (x, y) = self.world_to_screen(point);
        x >= -margin && y >= -margin && x <= self.screen_width + margin && y <= self.screen_height + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_world_round_trip() {
        let mut view = Viewport::new(640.0, 480.0, 2.0);
        view.center_on(WorldPos::new(-50.0, 75.0));
        let world = view.screen_to_world(10.0, 20.0);
        let (x, y) = view.world_to_screen(world);
        assert!((x - 10.0).abs() < 1e-3);
        assert!((y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_visible_tiles_cover_screen() {
        let mut view = Viewport::new(320.0, 320.0, 1.0);
        view.center_on(WorldPos::new(160.0, 160.0));
        let (min, max) = view.visible_tiles(32.0);
        assert_eq!(min, Position::new(-1, -1));
        assert_eq!(max, Position::new(11, 11));
    }

    #[test]
    fn test_bad_zoom_defaults_to_one() {
        assert_eq!(Viewport::new(10.0, 10.0, 0.0).zoom, 1.0);
    }

    #[test]
    fn test_on_screen_margin() {
        let view = Viewport::new(100.0, 100.0, 1.0);
        assert!(view.is_on_screen(WorldPos::new(0.0, 0.0), 0.0));
        assert!(!view.is_on_screen(WorldPos::new(60.0, 0.0), 0.0));
        assert!(view.is_on_screen(WorldPos::new(60.0, 0.0), 16.0));
    }
}
