//! HUD Overlays
//!
//! Weapon sprite, damage flash, status text, crosshair and the game-over
//! screen, in that draw order.

use crate::game::state::{GameState, DAMAGE_FLASH_TICKS};
use crate::render::assets::AssetStore;
use crate::render::frame::{Color, Frame, TextAlign};

/// Weapon sprite side length (px).
pub const WEAPON_SPRITE_SIZE: i64 = 200;

const WEAPON_FALLBACK: Color = Color(0xFF555555);
const GAME_OVER_SHADE: Color = Color(0xB3000000);

/// Equipped weapon at the bottom centre. Gray block when the sprite is missing.
pub fn draw_weapon(frame: &mut Frame, state: &GameState, assets: &AssetStore) {
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    let left = w / 2 - WEAPON_SPRITE_SIZE / 2;
    let top = h - WEAPON_SPRITE_SIZE;

    match assets.image(state.player.weapon().name) {
        Some(texture) => {
            let size = WEAPON_SPRITE_SIZE as f64;
            for y in 0..WEAPON_SPRITE_SIZE {
                for x in 0..WEAPON_SPRITE_SIZE {
                    let texel = texture.sample((x as f64 + 0.5) / size, (y as f64 + 0.5) / size);
                    if texel.a() != 0 {
                        frame.blend(left + x, top + y, texel);
                    }
                }
            }
        }
        None => {
            frame.fill_rect(left + 80, top + 60, 40, WEAPON_SPRITE_SIZE - 60, WEAPON_FALLBACK);
        }
    }
}

/// Red full-screen tint fading out over the flash duration.
pub fn draw_damage_flash(frame: &mut Frame, damage_flash: u32) {
    if damage_flash == 0 {
        return;
    }
    let alpha = damage_flash.min(DAMAGE_FLASH_TICKS) as f64 / 20.0;
    frame.overlay(Color::RED.with_alpha(alpha));
}

/// Status lines for the local player and every remote player.
pub fn draw_status_text(frame: &mut Frame, state: &GameState, minimap_size: u32) {
    let x = frame.width() as i32 - minimap_size as i32 - 30;
    let player = &state.player;
    let lines = [
        format!("Health: {}", player.health),
        format!("Ammo: {}", player.ammo),
        format!("Score: {}", player.score),
        format!("Weapon: {}", player.weapon().display_name()),
    ];

    let mut y = 30;
    for line in lines {
        frame.text_at(x, y, line, Color::WHITE, 20, TextAlign::Left);
        y += 30;
    }
    for remote in state.remote_players.values() {
        frame.text_at(
            x,
            y,
            format!("Player {}: Health {}", remote.id, remote.health),
            Color::WHITE,
            20,
            TextAlign::Left,
        );
        y += 30;
    }
}

/// Crosshair: red while the weapon cools down, else the weapon's colour.
pub fn draw_crosshair(frame: &mut Frame, state: &GameState) {
    let weapon = state.player.weapon();
    let color = if state.player.weapon_cooldown > 0 {
        Color::RED
    } else {
        Color::from_hex(weapon.crosshair_color).unwrap_or(Color::WHITE)
    };
    let (cx, cy) = (frame.width() as f64 / 2.0, frame.height() as f64 / 2.0);
    let s = weapon.crosshair_size as f64;
    frame.draw_line(cx - s, cy, cx + s, cy, 2, color);
    frame.draw_line(cx, cy - s, cx, cy + s, 2, color);
}

/// Darkened screen with restart / exit prompt.
pub fn draw_game_over(frame: &mut Frame) {
    frame.overlay(GAME_OVER_SHADE);
    let cx = frame.width() as i32 / 2;
    let cy = frame.height() as i32 / 2;
    frame.text_at(cx, cy - 50, "GAME OVER", Color::WHITE, 48, TextAlign::Center);
    frame.text_at(cx, cy + 10, "(R)estart   (E)xit", Color::WHITE, 32, TextAlign::Center);
}
