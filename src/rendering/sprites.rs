//! # Sprite Sheets
//!
//! Sprite lookup keyed by the state machine's sprite key
//! (`prefix/state/facing`). Anything missing is drawn as a coloured
//! rectangle instead.

use crate::{BossType, CombatState, CombatantKind, EnemyKind};
use macroquad::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Frame geometry of a horizontal strip or grid of animation frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetLayout {
    pub frame_width: f32,
    pub frame_height: f32,
    /// Frames per row; at least 1
    pub columns: u32,
    pub frames: u32,
}

impl SheetLayout {
    /// A single-row strip.
    pub fn strip(frame_width: f32, frame_height: f32, frames: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            columns: frames.max(1),
            frames: frames.max(1),
        }
    }

    /// Source rectangle for an animation frame. Frames past the end wrap.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::SheetLayout;
    ///
    /// let layout = SheetLayout { frame_width: 16.0, frame_height: 16.0, columns: 4, frames: 8 };
    /// let rect = layout.frame_rect(5);
    /// assert_eq!((rect.x, rect.y), (16.0, 16.0));
    /// ```
    pub fn frame_rect(&self, frame: u32) -> Rect {
        let frames = self.frames.max(1);
        let columns = self.columns.max(1);
        let index = frame % frames;
        Rect::new(
            (index % columns) as f32 * self.frame_width,
            (index / columns) as f32 * self.frame_height,
            self.frame_width,
            self.frame_height,
        )
    }
}

/// A texture plus the layout of the frames on it.
#[derive(Clone)]
pub struct SpriteSheet {
    pub texture: Texture2D,
    pub layout: SheetLayout,
}

impl SpriteSheet {
    /// Treats the whole texture as a strip of `frames` equal frames.
    pub fn from_strip(texture: Texture2D, frames: u32) -> Self {
        let frames = frames.max(1);
        let layout = SheetLayout::strip(texture.width() / frames as f32, texture.height(), frames);
        Self { texture, layout }
    }
}

/// Resolves sprite keys to sheets.
pub trait SpriteProvider {
    fn sprite(&self, key: &str) -> Option<&SpriteSheet>;
}

/// In-memory sprite table.
#[derive(Clone, Default)]
pub struct SpriteAtlas {
    sheets: HashMap<String, SpriteSheet>,
}

impl SpriteAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, sheet: SpriteSheet) {
        self.sheets.insert(key.into(), sheet);
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Loads `<dir>/<key>.png` for every key. Missing files are logged and
    /// skipped so the renderer falls back to rectangles for them.
    pub async fn load_dir(dir: impl AsRef<Path>, keys: &[(String, u32)]) -> Self {
        let mut atlas = Self::new();
        for (key, frames) in keys {
            let path = dir.as_ref().join(format!("{key}.png"));
            let Some(path_str) = path.to_str() else {
                log::warn!("Sprite path {:?} is not valid UTF-8", path);
                continue;
            };
            match load_texture(path_str).await {
                Ok(texture) => {
                    texture.set_filter(FilterMode::Nearest);
                    atlas.insert(key.clone(), SpriteSheet::from_strip(texture, *frames));
                }
                Err(e) => log::debug!("No sprite for {}: {}", key, e),
            }
        }
        log::info!("Loaded {} of {} sprite sheets", atlas.len(), keys.len());
        atlas
    }
}

impl SpriteProvider for SpriteAtlas {
    fn sprite(&self, key: &str) -> Option<&SpriteSheet> {
        self.sheets.get(key)
    }
}

/// Rectangle colour used when a combatant has no sprite.
pub fn fallback_color(kind: CombatantKind, state: CombatState) -> Color {
    let base = match kind {
        CombatantKind::Player => YELLOW,
        CombatantKind::Enemy(EnemyKind::Slime) => LIME,
        CombatantKind::Enemy(EnemyKind::Goblin) => GREEN,
        CombatantKind::Enemy(EnemyKind::Skeleton) => LIGHTGRAY,
        CombatantKind::Enemy(EnemyKind::SkeletonArcher) => BEIGE,
        CombatantKind::Enemy(EnemyKind::Orc) => DARKGREEN,
        CombatantKind::Enemy(EnemyKind::DarkMage) => PURPLE,
        CombatantKind::Boss(BossType::GoblinKing) => GOLD,
        CombatantKind::Boss(BossType::Necromancer) => VIOLET,
        CombatantKind::Boss(BossType::StoneGolem) => GRAY,
    };
    match state {
        CombatState::Dead => Color::new(base.r * 0.3, base.g * 0.3, base.b * 0.3, 0.6),
        CombatState::Hurt => WHITE,
        CombatState::Attacking | CombatState::SuperAttacking => {
            Color::new((base.r + 0.4).min(1.0), base.g * 0.7, base.b * 0.7, base.a)
        }
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rect_wraps() {
        let layout = SheetLayout::strip(8.0, 12.0, 4);
        assert_eq!(layout.frame_rect(1), Rect::new(8.0, 0.0, 8.0, 12.0));
        assert_eq!(layout.frame_rect(4), layout.frame_rect(0));
    }

    #[test]
    fn test_zero_frame_layout_is_usable() {
        let layout = SheetLayout {
            frame_width: 16.0,
            frame_height: 16.0,
            columns: 0,
            frames: 0,
        };
        assert_eq!(layout.frame_rect(7), Rect::new(0.0, 0.0, 16.0, 16.0));
    }

    #[test]
    fn test_empty_atlas_has_no_sprites() {
        let atlas = SpriteAtlas::new();
        assert!(atlas.is_empty());
        assert!(atlas.sprite("player/idle/right").is_none());
    }

    #[test]
    fn test_fallback_colors_distinguish_states() {
        let kind = CombatantKind::Enemy(EnemyKind::Orc);
        assert_ne!(
            fallback_color(kind, CombatState::Idle),
            fallback_color(kind, CombatState::Dead)
        );
        assert_eq!(fallback_color(CombatantKind::Player, CombatState::Hurt), WHITE);
    }
}
