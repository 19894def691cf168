//! Simulation Tick
//!
//! One step of the local simulation. Order is fixed:
//! input, pickups, power-up spawn, weapon cooldown, monsters, monster
//! respawn, damage flash. A dead player skips all of it.

use std::f64::consts::PI;

use crate::core::vec2::{normalize_angle, Vec2};
use crate::game::collision::slide_move;
use crate::game::combat::{fire, FireOutcome};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::InputFrame;
use crate::game::monster::{maybe_respawn, update_monsters};
use crate::game::powerup::{collect_powerups, maybe_spawn_powerup};
use crate::game::state::{GameState, MAX_HEALTH};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated since the previous tick (including ones queued by
    /// network handlers in between)
    pub events: Vec<GameEvent>,
    /// Outcome of a fire action, if one was attempted
    pub fire: Option<FireOutcome>,
    /// Simulation was skipped because the local player is dead
    pub frozen: bool,
}

/// Configuration for the local simulation.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Grid units moved per tick
    pub move_speed: f64,
    /// Radians turned per tick
    pub rot_speed: f64,
    /// Pickup distance (grid units)
    pub pickup_radius: f64,
    /// Seconds during which no further pickups are processed
    pub pickup_lockout_secs: f64,
    /// Health restored by a health pickup
    pub health_pickup: i32,
    /// Ammo added by an ammo pickup
    pub ammo_pickup: u32,
    /// Health cap for pickups
    pub max_health: i32,
    /// Per-tick power-up spawn chance
    pub powerup_spawn_chance: f64,
    /// Max concurrent power-ups
    pub max_powerups: usize,
    /// Per-tick monster respawn chance
    pub monster_spawn_chance: f64,
    /// Max concurrent monsters
    pub max_monsters: usize,
    /// Max shot distance (exclusive)
    pub fire_range: f64,
    /// Half-angle of the aim cone (exclusive)
    pub fire_cone: f64,
    /// Score per monster kill
    pub kill_reward: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            move_speed: 0.15,
            rot_speed: 0.1,
            pickup_radius: 0.5,
            pickup_lockout_secs: 0.1,
            health_pickup: 25,
            ammo_pickup: 50,
            max_health: MAX_HEALTH,
            powerup_spawn_chance: 0.02,
            max_powerups: 5,
            monster_spawn_chance: 0.02,
            max_monsters: 5,
            fire_range: 8.0,
            fire_cone: PI / 6.0,
            kill_reward: 100,
        }
    }
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The game state (will be mutated)
/// * `input` - Local input for this tick
/// * `config` - Simulation constants
/// * `dt` - Seconds since the previous tick (only the pickup lockout uses it)
pub fn tick(state: &mut GameState, input: &InputFrame, config: &SimConfig, dt: f64) -> TickResult {
    let mut result = TickResult::default();

    // 0. Frozen while dead; queued events (e.g. the killing hit) still flow out
    if state.is_dead() {
        result.frozen = true;
        result.events = state.take_events();
        return result;
    }

    state.tick += 1;

    // 1. Input: move along the current facing, then rotate
    apply_movement(state, input, config);
    if input.switch_pressed() {
        let weapon = state.player.switch_weapon();
        state.emit(GameEventData::WeaponSwitched { weapon: weapon.name });
    }
    if input.fire_pressed() {
        result.fire = Some(fire(state, config));
    }

    // 2. Pickups
    collect_powerups(state, config, dt);

    // 3. Power-up spawn
    maybe_spawn_powerup(state, config);

    // 4. Weapon cooldown
    state.player.weapon_cooldown = state.player.weapon_cooldown.saturating_sub(1);

    // 5. Monsters
    update_monsters(state);

    // 6. Respawn
    maybe_respawn(state, config);

    // 7. Damage flash decay
    state.damage_flash = state.damage_flash.saturating_sub(1);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = state.tick,
        x = state.player.position.x,
        y = state.player.position.y,
        health = state.player.health,
        monsters = state.monsters.len(),
        powerups = state.powerups.len(),
        "tick"
    );

    result.events = state.take_events();
    result
}

/// Translate along the facing direction with slide collision, then rotate.
fn apply_movement(state: &mut GameState, input: &InputFrame, config: &SimConfig) {
    let player = &mut state.player;

    let step = input.move_axis() * config.move_speed;
    if step != 0.0 {
        let candidate: Vec2 = player.position + Vec2::from_angle(player.angle) * step;
        player.position = slide_move(&state.grid, player.position, candidate);
    }

    let turn = input.turn_axis() * config.rot_speed;
    if turn != 0.0 {
        player.angle = normalize_angle(player.angle + turn);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::maze::{Cell, Grid};
    use crate::game::state::{Monster, MonsterKind, PlayerId, PowerUp, PowerUpKind};

    const DT: f64 = 1.0 / 60.0;

    fn quiet_config() -> SimConfig {
        SimConfig {
            powerup_spawn_chance: 0.0,
            monster_spawn_chance: 0.0,
            ..SimConfig::default()
        }
    }

    fn open_state() -> GameState {
        let mut grid = Grid::filled(11, 11, Cell::Floor);
        for i in 0..11 {
            grid.set(i, 0, Cell::Wall);
            grid.set(i, 10, Cell::Wall);
            grid.set(0, i, Cell::Wall);
            grid.set(10, i, Cell::Wall);
        }
        let mut state = GameState::with_grid(PlayerId::from("me"), grid, DeterministicRng::new(3));
        state.player.position = Vec2::new(5.5, 5.5);
        state.player.angle = 0.0;
        state
    }

    #[test]
    fn test_forward_moves_along_facing() {
        let mut state = open_state();
        let input = InputFrame::new().with(InputFrame::FLAG_FORWARD);
        tick(&mut state, &input, &quiet_config(), DT);
        assert!((state.player.position.x - 5.65).abs() < 1e-9);
        assert!((state.player.position.y - 5.5).abs() < 1e-9);
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut state = open_state();
        state.player.angle = PI - 0.05;
        let input = InputFrame::new().with(InputFrame::FLAG_RIGHT);
        tick(&mut state, &input, &quiet_config(), DT);
        assert!(state.player.angle < 0.0);
        assert!((state.player.angle - (PI + 0.05 - 2.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn test_wall_stops_forward() {
        let mut state = open_state();
        state.player.position = Vec2::new(9.9, 5.5);
        let input = InputFrame::new().with(InputFrame::FLAG_FORWARD);
        tick(&mut state, &input, &quiet_config(), DT);
        assert_eq!(state.player.position.x, 9.9);
    }

    #[test]
    fn test_dead_player_frozen() {
        let mut state = open_state();
        state.handle_player_hit(200);
        state.monsters.push(Monster::new(MonsterKind::Basic, Vec2::new(2.5, 2.5), 0.05, 0.0));
        let before = state.clone();

        let input = InputFrame::new().with(InputFrame::FLAG_FORWARD).with(InputFrame::FLAG_FIRE);
        let result = tick(&mut state, &input, &SimConfig::default(), DT);

        assert!(result.frozen);
        assert!(result.events.iter().any(|e| e.data == GameEventData::PlayerDied));
        assert_eq!(state.player, before.player);
        assert_eq!(state.monsters, before.monsters);
        assert_eq!(state.tick, before.tick);
    }

    #[test]
    fn test_cooldowns_decay() {
        let mut state = open_state();
        state.player.weapon_cooldown = 2;
        state.damage_flash = 1;
        tick(&mut state, &InputFrame::new(), &quiet_config(), DT);
        assert_eq!(state.player.weapon_cooldown, 1);
        assert_eq!(state.damage_flash, 0);
    }

    #[test]
    fn test_fire_and_switch() {
        let mut state = open_state();
        let input = InputFrame::new().with(InputFrame::FLAG_SWITCH).with(InputFrame::FLAG_FIRE);
        let result = tick(&mut state, &input, &quiet_config(), DT);

        assert_eq!(state.player.weapon().name, "machinegun");
        assert_eq!(result.fire, Some(FireOutcome::NoTarget));
        assert_eq!(state.player.ammo, 98);
        // Set to 20 on fire, then decremented once in the same tick.
        assert_eq!(state.player.weapon_cooldown, 19);
        assert!(result.events.iter().any(|e| e.sound_cue() == Some("shoot")));
    }

    #[test]
    fn test_pickup_in_tick() {
        let mut state = open_state();
        state.player.health = 50;
        state.powerups.push(PowerUp::new(PowerUpKind::Health, Vec2::new(5.5, 5.6)));
        let result = tick(&mut state, &InputFrame::new(), &quiet_config(), DT);
        assert_eq!(state.player.health, 75);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::PowerUpCollected { kind: PowerUpKind::Health, .. })));
    }
}
