//! Minimap
//!
//! Top-left overview: one block per grid cell plus entity markers.

use crate::core::vec2::Vec2;
use crate::game::state::GameState;
use crate::render::frame::{Color, Frame};

const WALL: Color = Color(0xFFFFFFFF);
const FLOOR: Color = Color(0xFF666666);
const MONSTER_FALLBACK: Color = Color(0xFFFFFF00);

/// Draw the minimap into the top-left `size` x `size` pixels.
pub fn draw_minimap(frame: &mut Frame, state: &GameState, size: u32) {
    let grid = &state.grid;
    let cell = size as f64 / grid.height().max(1) as f64;
    let block = (cell - 1.0).max(1.0).round() as i64;

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let color = if grid.is_floor(x as i64, y as i64) { FLOOR } else { WALL };
            frame.fill_rect(
                (x as f64 * cell) as i64,
                (y as f64 * cell) as i64,
                block,
                block,
                color,
            );
        }
    }

    for powerup in &state.powerups {
        let color = Color::from_hex(powerup.kind.color()).unwrap_or(Color::WHITE);
        frame.fill_circle(powerup.position.x * cell, powerup.position.y * cell, 4.0, color);
    }

    for monster in &state.monsters {
        let color = Color::from_hex(&monster.color).unwrap_or(MONSTER_FALLBACK);
        frame.fill_circle(monster.position.x * cell, monster.position.y * cell, 3.0, color);
    }

    let player = &state.player;
    let (px, py) = (player.position.x * cell, player.position.y * cell);
    frame.fill_circle(px, py, 4.0, Color::ORANGE);
    let heading = player.position + Vec2::from_angle(player.angle);
    frame.draw_line(px, py, heading.x * cell, heading.y * cell, 2, Color::RED);

    for remote in state.remote_players.values() {
        frame.fill_circle(remote.position.x * cell, remote.position.y * cell, 4.0, Color::RED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::maze::Grid;
    use crate::game::state::PlayerId;

    #[test]
    fn test_cells_and_player_marker() {
        let grid = Grid::from_rows(vec![
            vec![1, 1, 1, 1],
            vec![1, 0, 0, 1],
            vec![1, 0, 0, 1],
            vec![1, 1, 1, 1],
        ])
        .unwrap();
        let mut state = GameState::with_grid(PlayerId::from("me"), grid, DeterministicRng::new(1));
        state.player.position = Vec2::new(2.0, 2.0);
        state.player.angle = 0.0;

        let mut frame = Frame::new(100, 100);
        draw_minimap(&mut frame, &state, 100);

        // 25 px per cell, blocks are 24 px with a 1 px gap.
        assert_eq!(frame.get(5, 5), Some(WALL));
        assert_eq!(frame.get(30, 30), Some(FLOOR));
        assert_eq!(frame.get(24, 5), Some(Color::BLACK));
        // Player marker centred at (50, 50).
        assert_eq!(frame.get(48, 48), Some(Color::ORANGE));
        // Heading line runs to the right.
        assert_eq!(frame.get(70, 50), Some(Color::RED));
    }
}
