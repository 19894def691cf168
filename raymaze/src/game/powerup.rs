//! Power-up Lifecycle
//!
//! Random spawning and pickup. A pickup starts a short lockout during which
//! no further pickups are processed.

use crate::game::collision::within_radius;
use crate::game::events::GameEventData;
use crate::game::maze::find_empty_spot;
use crate::game::state::{GameState, PowerUp, PowerUpKind};
use crate::game::tick::SimConfig;

/// Apply every uncollected power-up the player is touching.
///
/// Touched power-ups are removed whether or not they were already flagged
/// collected; the effect is applied only to unflagged ones. Returns the
/// number of effects applied.
pub fn collect_powerups(state: &mut GameState, config: &SimConfig, dt: f64) -> usize {
    if state.pickup_lockout > 0.0 {
        state.pickup_lockout = (state.pickup_lockout - dt).max(0.0);
        return 0;
    }

    let origin = state.player.position;
    let mut applied = Vec::new();

    state.powerups.retain_mut(|powerup| {
        if !within_radius(origin, powerup.position, config.pickup_radius) {
            return true;
        }
        if !powerup.collected {
            powerup.collected = true;
            applied.push(powerup.kind);
        }
        false
    });

    for &kind in &applied {
        match kind {
            PowerUpKind::Health => {
                state.player.health = (state.player.health + config.health_pickup).min(config.max_health);
            }
            PowerUpKind::Ammo => {
                state.player.ammo += config.ammo_pickup;
            }
        }
        tracing::debug!(?kind, health = state.player.health, ammo = state.player.ammo, "power-up collected");
        state.emit(GameEventData::PowerUpCollected {
            kind,
            health: state.player.health,
            ammo: state.player.ammo,
        });
    }

    if !applied.is_empty() {
        state.pickup_lockout = config.pickup_lockout_secs;
    }
    applied.len()
}

/// Spawn a power-up of random kind if the roll succeeds and below the cap.
pub fn maybe_spawn_powerup(state: &mut GameState, config: &SimConfig) -> bool {
    if !state.rng.chance(config.powerup_spawn_chance) || state.powerups.len() >= config.max_powerups {
        return false;
    }

    let position = find_empty_spot(&state.grid, &mut state.rng);
    let kind = PowerUpKind::ALL[state.rng.next_index(PowerUpKind::ALL.len())];
    state.powerups.push(PowerUp::new(kind, position));
    tracing::debug!(?kind, x = position.x, y = position.y, "power-up spawned");
    state.emit(GameEventData::PowerUpSpawned { kind, position });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::core::vec2::Vec2;
    use crate::game::maze::{Cell, Grid};
    use crate::game::state::PlayerId;

    const DT: f64 = 1.0 / 60.0;

    fn state_at(x: f64, y: f64) -> GameState {
        let mut grid = Grid::filled(9, 9, Cell::Floor);
        for i in 0..9 {
            grid.set(i, 0, Cell::Wall);
            grid.set(i, 8, Cell::Wall);
            grid.set(0, i, Cell::Wall);
            grid.set(8, i, Cell::Wall);
        }
        let mut state = GameState::with_grid(PlayerId::from("me"), grid, DeterministicRng::new(5));
        state.player.position = Vec2::new(x, y);
        state
    }

    #[test]
    fn test_health_pickup_capped() {
        let mut state = state_at(3.0, 3.0);
        state.player.health = 90;
        state.powerups.push(PowerUp::new(PowerUpKind::Health, Vec2::new(3.2, 3.0)));

        assert_eq!(collect_powerups(&mut state, &SimConfig::default(), DT), 1);
        assert_eq!(state.player.health, 100);
        assert!(state.powerups.is_empty());
        assert!(state.pickup_lockout > 0.0);
    }

    #[test]
    fn test_ammo_pickup() {
        let mut state = state_at(3.0, 3.0);
        state.powerups.push(PowerUp::new(PowerUpKind::Ammo, Vec2::new(3.0, 3.3)));
        collect_powerups(&mut state, &SimConfig::default(), DT);
        assert_eq!(state.player.ammo, 150);
    }

    #[test]
    fn test_collected_flag_never_reapplied() {
        let mut state = state_at(3.0, 3.0);
        let mut stale = PowerUp::new(PowerUpKind::Ammo, Vec2::new(3.0, 3.0));
        stale.collected = true;
        state.powerups.push(stale);

        assert_eq!(collect_powerups(&mut state, &SimConfig::default(), DT), 0);
        assert_eq!(state.player.ammo, 100);
        assert!(state.powerups.is_empty());
    }

    #[test]
    fn test_lockout_blocks_pickups() {
        let config = SimConfig::default();
        let mut state = state_at(3.0, 3.0);
        state.powerups.push(PowerUp::new(PowerUpKind::Ammo, Vec2::new(3.0, 3.0)));
        collect_powerups(&mut state, &config, DT);

        // Another one appears under the player during the lockout.
        state.powerups.push(PowerUp::new(PowerUpKind::Ammo, Vec2::new(3.0, 3.0)));
        assert_eq!(collect_powerups(&mut state, &config, DT), 0);
        assert_eq!(state.powerups.len(), 1);
        assert_eq!(state.player.ammo, 150);

        // Lockout expires after roughly 100 ms of ticks.
        let mut ticks = 0;
        while collect_powerups(&mut state, &config, DT) == 0 {
            ticks += 1;
            assert!(ticks < 10);
        }
        assert_eq!(state.player.ammo, 200);
    }

    #[test]
    fn test_far_powerup_untouched() {
        let mut state = state_at(3.0, 3.0);
        state.powerups.push(PowerUp::new(PowerUpKind::Health, Vec2::new(5.0, 5.0)));
        assert_eq!(collect_powerups(&mut state, &SimConfig::default(), DT), 0);
        assert_eq!(state.powerups.len(), 1);
    }

    #[test]
    fn test_spawn_cap() {
        let mut state = state_at(3.0, 3.0);
        let config = SimConfig { powerup_spawn_chance: 1.0, ..SimConfig::default() };
        for _ in 0..20 {
            maybe_spawn_powerup(&mut state, &config);
        }
        assert_eq!(state.powerups.len(), config.max_powerups);
        for p in &state.powerups {
            assert!(state.grid.is_floor(p.position.x as i64, p.position.y as i64));
            assert!(!p.collected);
        }
    }
}
