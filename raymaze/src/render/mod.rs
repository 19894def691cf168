//! Software Renderer
//!
//! Builds one composited frame from the game state. Stages run in a fixed
//! order and later stages draw over earlier ones:
//!
//! 1. background, ceiling and floor
//! 2. wall columns (fills the depth buffer)
//! 3. monsters and remote players, farthest first
//! 4. power-ups
//! 5. minimap
//! 6. weapon, damage flash, status text, crosshair, game over
//!
//! Missing textures never fail a frame; every sprite has a fallback.

pub mod frame;
pub mod assets;
pub mod sprites;
pub mod minimap;
pub mod hud;

use std::f64::consts::PI;

use crate::core::vec2::Vec2;
use crate::game::raycast::{DepthBuffer, MAX_DEPTH};
use crate::game::state::{GameState, PlayerId};

pub use assets::{AssetState, AssetStore, AudioSink, NullAudio, SoundClip, Texture};
pub use frame::{Color, Frame, TextAlign, TextCommand};

use sprites::{draw_fallback, draw_textured, project, ProjectionParams};

/// Renderer configuration.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Viewport width (px), one ray per column
    pub width: usize,
    /// Viewport height (px)
    pub height: usize,
    /// Field of view (radians)
    pub fov: f64,
    /// Wall and sprite height multiplier
    pub scale: f64,
    /// Max monster / player sprite size (px)
    pub sprite_cap: f64,
    /// Extra FOV margin for monsters so they do not pop at the edge
    pub monster_fov_margin: f64,
    /// Power-up sprite height multiplier
    pub powerup_scale: f64,
    /// Max power-up sprite size (px)
    pub powerup_cap: f64,
    /// Power-ups at or beyond this distance are not drawn
    pub powerup_distance: f64,
    /// Minimap side length (px)
    pub minimap_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fov: PI / 3.0,
            scale: 1.5,
            sprite_cap: 1000.0,
            monster_fov_margin: 0.2,
            powerup_scale: 0.5,
            powerup_cap: 100.0,
            powerup_distance: MAX_DEPTH,
            minimap_size: 200,
        }
    }
}

const FLOOR_NEAR: Color = Color(0xFF666666);
const FLOOR_FAR: Color = Color(0xFF222222);
const PLAYER_FALLBACK: Color = Color::ORANGE;
const POWERUP_OVERLAY_ALPHA: f64 = 0.7;

/// A sprite queued for the painter's pass.
enum SpriteRef<'a> {
    Monster(usize),
    Player(&'a PlayerId),
}

/// Owns the frame and depth buffer so allocations survive between frames.
pub struct Renderer {
    config: RenderConfig,
    frame: Frame,
    depth: DepthBuffer,
}

impl Renderer {
    /// Create a renderer for the configured viewport.
    pub fn new(config: RenderConfig) -> Self {
        let frame = Frame::new(config.width, config.height);
        Self {
            config,
            frame,
            depth: DepthBuffer::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Change the viewport size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.config.width = width;
        self.config.height = height;
        self.frame.resize(width, height);
    }

    /// Last rendered frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Depth buffer of the last frame.
    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Render a full frame.
    pub fn render_frame(&mut self, state: &GameState, assets: &AssetStore) -> &Frame {
        let (w, h) = (self.config.width, self.config.height);
        if self.frame.width() != w || self.frame.height() != h {
            self.frame.resize(w, h);
        }

        // 1. Background
        self.frame.clear(Color::BLACK);
        self.frame.fill_vertical_gradient((h / 2) as i64, h as i64, FLOOR_NEAR, FLOOR_FAR);

        // 2. Walls
        self.depth
            .fill(&state.grid, state.player.position, state.player.angle, w, self.config.fov);
        self.draw_walls(assets);

        // 3. Monsters and remote players
        self.draw_sprites(state, assets);

        // 4. Power-ups
        self.draw_powerups(state, assets);

        // 5. Minimap
        minimap::draw_minimap(&mut self.frame, state, self.config.minimap_size);

        // 6. Overlays
        hud::draw_weapon(&mut self.frame, state, assets);
        hud::draw_damage_flash(&mut self.frame, state.damage_flash);
        hud::draw_status_text(&mut self.frame, state, self.config.minimap_size);
        hud::draw_crosshair(&mut self.frame, state);
        if state.is_dead() {
            hud::draw_game_over(&mut self.frame);
        }

        &self.frame
    }

    fn draw_walls(&mut self, assets: &AssetStore) {
        let h = self.config.height as f64;
        let texture = assets.image("wallTexture");

        for (col, hit) in self.depth.iter().enumerate() {
            let distance = hit.distance.max(f64::EPSILON);
            let wall_h = (h / distance) * self.config.scale;
            let top = (h - wall_h) / 2.0;
            let y0 = top.floor().max(0.0) as i64;
            let y1 = (top + wall_h).ceil().min(h) as i64;
            let x = col as i64;

            match texture {
                Some(tex) => {
                    let u = hit.texture_u();
                    for y in y0..y1 {
                        let v = (y as f64 + 0.5 - top) / wall_h;
                        self.frame.blend(x, y, tex.sample(u, v.clamp(0.0, 0.999_999)));
                    }
                }
                None => {
                    let shade = (1.0 - hit.distance / MAX_DEPTH).clamp(0.0, 1.0);
                    self.frame.fill_rect(x, y0, 1, y1 - y0, Color::WHITE.shade(shade));
                }
            }
        }
    }

    fn draw_sprites(&mut self, state: &GameState, assets: &AssetStore) {
        let origin = state.player.position;
        let facing = state.player.angle;
        let viewport = (self.config.width, self.config.height);

        // Painter's order: farthest first so nearer sprites overwrite.
        let mut queue: Vec<(f64, SpriteRef<'_>)> = state
            .monsters
            .iter()
            .enumerate()
            .map(|(i, m)| (origin.distance(m.position), SpriteRef::Monster(i)))
            .chain(
                state
                    .remote_players
                    .values()
                    .map(|p| (origin.distance(p.position), SpriteRef::Player(&p.id))),
            )
            .collect();
        queue.sort_by(|a, b| b.0.total_cmp(&a.0));

        let base = ProjectionParams {
            fov: self.config.fov,
            fov_margin: 0.0,
            scale: self.config.scale,
            size_cap: self.config.sprite_cap,
            max_distance: f64::INFINITY,
        };
        let monster_params = ProjectionParams {
            fov_margin: self.config.monster_fov_margin,
            ..base
        };

        for (_, sprite) in queue {
            match sprite {
                SpriteRef::Monster(i) => {
                    let monster = &state.monsters[i];
                    self.draw_billboard(
                        origin,
                        facing,
                        monster.position,
                        &monster_params,
                        viewport,
                        assets.image(monster.kind.sprite_name()),
                        Color::from_hex(&monster.color)
                            .unwrap_or_else(|| Color::from_hex(monster.stats().color).unwrap_or(Color::RED)),
                    );
                }
                SpriteRef::Player(id) => {
                    if let Some(player) = state.remote_players.get(id) {
                        self.draw_billboard(
                            origin,
                            facing,
                            player.position,
                            &base,
                            viewport,
                            assets.image("player_client"),
                            PLAYER_FALLBACK,
                        );
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_billboard(
        &mut self,
        origin: Vec2,
        facing: f64,
        target: Vec2,
        params: &ProjectionParams,
        viewport: (usize, usize),
        texture: Option<&Texture>,
        fallback: Color,
    ) {
        let Some(p) = project(origin, facing, target, viewport, params) else {
            return;
        };
        if !p.visible_in(&self.depth) {
            return;
        }
        match texture {
            Some(tex) => draw_textured(&mut self.frame, tex, &p),
            None => draw_fallback(&mut self.frame, fallback, &p),
        }
    }

    fn draw_powerups(&mut self, state: &GameState, assets: &AssetStore) {
        let params = ProjectionParams {
            fov: self.config.fov,
            fov_margin: 0.0,
            scale: self.config.powerup_scale,
            size_cap: self.config.powerup_cap,
            max_distance: self.config.powerup_distance,
        };
        let viewport = (self.config.width, self.config.height);
        let icon = assets.image("powerup");

        for powerup in &state.powerups {
            let Some(p) = project(state.player.position, state.player.angle, powerup.position, viewport, &params)
            else {
                continue;
            };
            if !p.visible_in(&self.depth) {
                continue;
            }
            let tint = Color::from_hex(powerup.kind.color())
                .unwrap_or(Color::WHITE)
                .with_alpha(POWERUP_OVERLAY_ALPHA);
            self.frame.fill_rect(
                p.left.floor() as i64,
                p.top.floor() as i64,
                p.size.ceil() as i64,
                p.size.ceil() as i64,
                tint,
            );
            if let Some(tex) = icon {
                draw_textured(&mut self.frame, tex, &p);
            }
        }
    }
}
