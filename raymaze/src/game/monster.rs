//! Monster AI
//!
//! Monsters walk straight at the local player with slide collision, turn to
//! face them, and shoot when in range, off cooldown and with a clear line of
//! sight.

use std::f64::consts::TAU;

use crate::core::vec2::normalize_angle;
use crate::game::collision::slide_move;
use crate::game::events::{DamageSource, GameEventData};
use crate::game::maze::find_empty_spot;
use crate::game::raycast::cast_ray;
use crate::game::state::{GameState, Monster, MonsterKind};
use crate::game::tick::SimConfig;

/// Upper bound (exclusive) of the speed jitter added at spawn.
pub const SPEED_JITTER: f64 = 0.02;

/// Spawn one monster of a random kind on a random empty cell.
///
/// Returns the new monster's index.
pub fn spawn_monster(state: &mut GameState) -> usize {
    let position = find_empty_spot(&state.grid, &mut state.rng);
    let kind = MonsterKind::ALL[state.rng.next_index(MonsterKind::ALL.len())];
    let speed = kind.stats().base_speed + state.rng.next_f64_range(0.0, SPEED_JITTER);
    let angle = state.rng.next_f64() * TAU;

    state.monsters.push(Monster::new(kind, position, speed, angle));
    tracing::debug!(?kind, x = position.x, y = position.y, speed, "monster spawned");
    state.emit(GameEventData::MonsterSpawned { kind, position });
    state.monsters.len() - 1
}

/// Advance every monster one tick.
///
/// Returns the number of shots that hit the local player.
pub fn update_monsters(state: &mut GameState) -> usize {
    let target = state.player.position;
    let mut hits = Vec::new();

    for monster in state.monsters.iter_mut() {
        let dir = (target - monster.position).normalize();
        let candidate = monster.position + dir * monster.speed;
        monster.position = slide_move(&state.grid, monster.position, candidate);

        let distance = monster.position.distance(target);
        monster.angle = normalize_angle(monster.position.angle_to(target));

        let stats = monster.stats();
        let mut fired = false;
        if distance < stats.fire_distance && monster.shoot_cooldown == 0 {
            let sight = cast_ray(&state.grid, monster.position, monster.angle);
            if sight.distance >= distance {
                hits.push(stats.hit_power);
                monster.shoot_cooldown = stats.shoot_cooldown;
                fired = true;
            }
        }
        if !fired && monster.shoot_cooldown > 0 {
            monster.shoot_cooldown -= 1;
        }
    }

    for &damage in &hits {
        tracing::debug!(damage, "monster shot landed");
        state.apply_damage(DamageSource::Monster, damage);
    }
    hits.len()
}

/// Spawn a replacement monster if below the cap and the roll succeeds.
pub fn maybe_respawn(state: &mut GameState, config: &SimConfig) -> Option<usize> {
    if state.monsters.len() < config.max_monsters && state.rng.chance(config.monster_spawn_chance) {
        Some(spawn_monster(state))
    } else {
        None
    }
}
