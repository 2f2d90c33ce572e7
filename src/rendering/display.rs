//! # Display Management
//!
//! Screen management and 2D graphics rendering functionality using macroquad.

use crate::rendering::{fallback_color, SpriteProvider, Viewport};
use crate::{
    BossPhase, Combatant, CombatantKind, EmberfallResult, GameCompletionState, GameEvent,
    GameState, Position, WorldPos,
};
use macroquad::prelude::*;

/// Bosses closer than this (world units) get the boss health bar.
const BOSS_HUD_RADIUS: f32 = 600.0;

/// Explored-but-not-visible cells are drawn at this brightness.
const EXPLORED_DIM: f32 = 0.4;

/// Macroquad display manager for the game.
///
/// Draws terrain by visibility state, combatants, projectiles and the HUD.
/// It only reads the game state; nothing here mutates the simulation.
pub struct MacroquadDisplay {
    /// Screen width in pixels
    pub screen_width: f32,
    /// Screen height in pixels
    pub screen_height: f32,
    /// Camera following the player
    pub viewport: Viewport,
    /// Message history
    pub messages: Vec<String>,
    /// Maximum number of messages to keep
    pub max_messages: usize,
    /// Whether the debug overlay is drawn
    pub show_debug: bool,
    sprites: Box<dyn SpriteProvider>,
}

impl MacroquadDisplay {
    /// Creates a display sized to the current window.
    pub async fn new(sprites: Box<dyn SpriteProvider>) -> EmberfallResult<Self> {
        let screen_width = screen_width();
        let screen_height = screen_height();

        Ok(Self {
            screen_width,
            screen_height,
            viewport: Viewport::new(screen_width, screen_height, 1.0),
            messages: Vec::new(),
            max_messages: 100,
            show_debug: false,
            sprites,
        })
    }

    /// Renders the complete game screen.
    pub fn render_game(&mut self, game_state: &GameState) -> EmberfallResult<()> {
        self.screen_width = screen_width();
        self.screen_height = screen_height();
        self.viewport.screen_width = self.screen_width;
        self.viewport.screen_height = self.screen_height;
        self.viewport.center_on(game_state.player.position());

        clear_background(BLACK);

        self.render_map(game_state);
        self.render_combatants(game_state);
        self.render_projectiles(game_state);
        self.render_hud(game_state);
        self.render_messages();
        if self.show_debug {
            self.render_debug(game_state);
        }
        if game_state.completion_state == GameCompletionState::PlayerDied {
            self.render_death_screen(game_state);
        }

        Ok(())
    }

    /// Toggles the debug overlay and returns the new setting.
    pub fn toggle_debug(&mut self) -> bool {
        self.show_debug = !self.show_debug;
        self.show_debug
    }

    /// Renders loaded terrain. Visible cells at full colour, explored cells
    /// dimmed, everything else left black.
    fn render_map(&self, game_state: &GameState) {
        let world = &game_state.world;
        let tile_size = world.tile_size();
        let screen_tile = tile_size * self.viewport.zoom;
        let (view_min, view_max) = self.viewport.visible_tiles(tile_size);
        let (world_min, world_max) = world.tile_range();

        for y in view_min.y.max(world_min.y)..=view_max.y.min(world_max.y) {
            for x in view_min.x.max(world_min.x)..=view_max.x.min(world_max.x) {
                let pos = Position::new(x, y);
                let Some(tile) = world.tile(pos) else {
                    continue;
                };
                let dim = if world.is_visible(pos) {
                    1.0
                } else if world.is_explored(pos) {
                    EXPLORED_DIM
                } else {
                    continue;
                };

                let (r, g, b) = tile.material.color();
                let color = Color::new(
                    r as f32 / 255.0 * dim,
                    g as f32 / 255.0 * dim,
                    b as f32 / 255.0 * dim,
                    1.0,
                );
                let corner = WorldPos::new(x as f32 * tile_size, y as f32 * tile_size);
                let (sx, sy) = self.viewport.world_to_screen(corner);
                draw_rectangle(sx, sy, screen_tile + 0.5, screen_tile + 0.5, color);
            }
        }
    }

    fn render_combatants(&self, game_state: &GameState) {
        let world = &game_state.world;
        for enemy in &game_state.enemies {
            for minion in enemy.minions() {
                if world.is_visible(world.world_to_tile(minion.position())) {
                    self.draw_combatant(minion);
                }
            }
            if world.is_visible(world.world_to_tile(enemy.position())) {
                self.draw_combatant(enemy);
            }
        }
        self.draw_combatant(&game_state.player);
    }

    fn draw_combatant(&self, combatant: &Combatant) {
        let size = combatant_size(combatant.kind()) * self.viewport.zoom;
        if !self.viewport.is_on_screen(combatant.position(), size) {
            return;
        }
        let (cx, cy) = self.viewport.world_to_screen(combatant.position());
        let (x, y) = (cx - size / 2.0, cy - size / 2.0);

        match self.sprites.sprite(combatant.sprite_key()) {
            Some(sheet) => {
                let source = sheet.layout.frame_rect(combatant.core.machine.frame());
                draw_texture_ex(
                    &sheet.texture,
                    x,
                    y,
                    WHITE,
                    DrawTextureParams {
                        dest_size: Some(vec2(size, size)),
                        source: Some(source),
                        ..Default::default()
                    },
                );
            }
            None => {
                draw_rectangle(x, y, size, size, fallback_color(combatant.kind(), combatant.state()));
            }
        }

        if combatant.kind() != CombatantKind::Player
            && !combatant.is_dead()
            && combatant.health() < combatant.max_health()
        {
            let ratio = combatant.health() as f32 / combatant.max_health().max(1) as f32;
            draw_rectangle(x, y - 6.0, size, 3.0, DARKGRAY);
            draw_rectangle(x, y - 6.0, size * ratio, 3.0, RED);
        }
    }

    fn render_projectiles(&self, game_state: &GameState) {
        let owners = std::iter::once(&game_state.player)
            .chain(game_state.enemies.iter())
            .chain(game_state.enemies.iter().flat_map(|e| e.minions().iter()));

        for owner in owners {
            let color = if owner.kind() == CombatantKind::Player {
                SKYBLUE
            } else {
                ORANGE
            };
            for shot in owner.core.projectiles.iter().filter(|p| p.active) {
                if !self.viewport.is_on_screen(shot.position, shot.radius) {
                    continue;
                }
                let (x, y) = self.viewport.world_to_screen(shot.position);
                draw_circle(x, y, (shot.radius * self.viewport.zoom).max(2.0), color);
            }
        }
    }

    /// Player health, the nearest boss's bar and phase.
    fn render_hud(&self, game_state: &GameState) {
        let player = &game_state.player;
        let ratio = player.health() as f32 / player.max_health().max(1) as f32;
        draw_rectangle(10.0, 10.0, 200.0, 16.0, DARKGRAY);
        draw_rectangle(10.0, 10.0, 200.0 * ratio.clamp(0.0, 1.0), 16.0, RED);
        draw_text(
            &format!("HP {}/{}", player.health(), player.max_health()),
            14.0,
            23.0,
            18.0,
            WHITE,
        );

        let Some(boss) = game_state.nearest_boss(BOSS_HUD_RADIUS) else {
            return;
        };
        let Some(brain) = boss.boss_brain() else {
            return;
        };
        let width = self.screen_width * 0.5;
        let x = (self.screen_width - width) / 2.0;
        let ratio = boss.health() as f32 / boss.max_health().max(1) as f32;
        draw_rectangle(x, 36.0, width, 14.0, DARKGRAY);
        draw_rectangle(x, 36.0, width * ratio.clamp(0.0, 1.0), 14.0, MAROON);
        draw_text(
            &format!(
                "{} - {} - minions {}",
                brain.boss_type.name(),
                phase_label(brain.phase()),
                brain.alive_minions()
            ),
            x,
            30.0,
            20.0,
            WHITE,
        );
    }

    /// Renders the message area.
    fn render_messages(&self) {
        let message_area_y = self.screen_height - 60.0;
        let message_count = 3;
        let line_height = 18.0;

        let start_index = self.messages.len().saturating_sub(message_count);
        for (i, message) in self.messages.iter().skip(start_index).enumerate() {
            let y = message_area_y + i as f32 * line_height;
            draw_text(message, 10.0, y, 16.0, WHITE);
        }
    }

    fn render_debug(&self, game_state: &GameState) {
        let lines = [
            format!("fps {}", get_fps()),
            format!("tick {} time {:.1}s", game_state.tick_count, game_state.time),
            format!("chunks {}", game_state.world.loaded_count()),
            format!("hostiles {}", game_state.hostile_count()),
            format!("player {:?}", game_state.world.world_to_tile(game_state.player.position())),
            format!("state {:?}", game_state.player.state()),
        ];
        let x = self.screen_width - 220.0;
        for (i, line) in lines.iter().enumerate() {
            draw_text(line, x, 20.0 + i as f32 * 18.0, 16.0, GREEN);
        }
    }

    fn render_death_screen(&self, game_state: &GameState) {
        draw_rectangle(
            0.0,
            0.0,
            self.screen_width,
            self.screen_height,
            Color::new(0.0, 0.0, 0.0, 0.6),
        );
        let stats = &game_state.statistics;
        draw_text(
            "YOU DIED",
            self.screen_width / 2.0 - 90.0,
            self.screen_height / 2.0 - 20.0,
            48.0,
            RED,
        );
        draw_text(
            &format!(
                "Enemies defeated: {}  Bosses defeated: {}",
                stats.enemies_defeated, stats.bosses_defeated
            ),
            self.screen_width / 2.0 - 180.0,
            self.screen_height / 2.0 + 20.0,
            20.0,
            WHITE,
        );
    }

    /// Turns resolved events into message log lines.
    pub fn push_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let Some(message) = event_message(event) {
                self.add_message(message);
            }
        }
    }

    /// Adds a message to the message history.
    pub fn add_message(&mut self, message: String) {
        self.messages.push(message);

        if self.messages.len() > self.max_messages {
            self.messages.remove(0);
        }
    }
}

/// On-screen edge length of a combatant, in world units.
fn combatant_size(kind: CombatantKind) -> f32 {
    match kind {
        CombatantKind::Boss(_) => 48.0,
        _ => 24.0,
    }
}

fn phase_label(phase: BossPhase) -> &'static str {
    match phase {
        BossPhase::Phase1 => "Phase 1",
        BossPhase::Phase2 => "Phase 2",
        BossPhase::Phase3 => "Phase 3",
    }
}

/// Log line for an event, if it deserves one.
pub fn event_message(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::CombatantDied { kind, .. } => Some(match kind {
            CombatantKind::Player => "You have fallen.".to_string(),
            other => format!("The {} is slain.", other.name()),
        }),
        GameEvent::PhaseChanged { phase, .. } => {
            Some(format!("The boss grows desperate: {}", phase_label(*phase)))
        }
        GameEvent::MinionsSummoned { count, .. } => Some(format!("{count} minions answer the call")),
        _ => None,
    }
}
