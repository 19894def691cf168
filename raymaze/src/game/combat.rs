//! Combat Resolution
//!
//! Local firing. A shot considers exactly one candidate: the nearest of all
//! monsters and remote players. That candidate is hit only if it is in range
//! and inside the aim cone, so a nearer unaimed target can swallow a shot
//! meant for a farther aimed one.

use crate::core::vec2::relative_angle;
use crate::game::events::GameEventData;
use crate::game::state::{GameState, PlayerId};
use crate::game::tick::SimConfig;

/// The single target a shot resolves against.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// Index into the monster list
    Monster {
        index: usize,
        distance: f64,
    },
    /// A remote player
    Player {
        id: PlayerId,
        distance: f64,
    },
}

impl Target {
    /// Distance from the shooter.
    pub fn distance(&self) -> f64 {
        match self {
            Target::Monster { distance, .. } | Target::Player { distance, .. } => *distance,
        }
    }
}

/// What a fire action did.
#[derive(Clone, Debug, PartialEq)]
pub enum FireOutcome {
    /// Weapon cooling down or not enough ammo; nothing consumed
    NotReady,
    /// Nothing to shoot at
    NoTarget,
    /// Nearest candidate failed the range / cone gate
    Missed,
    /// Monster damaged
    MonsterHit {
        index: usize,
        killed: bool,
    },
    /// Remote player hit; reported to peers, not applied locally
    PlayerHit {
        target_id: PlayerId,
        damage: i32,
    },
}

/// Pick the nearest candidate. Ties go to the monster.
pub fn select_target(state: &GameState) -> Option<Target> {
    let origin = state.player.position;

    let monster = state
        .monsters
        .iter()
        .enumerate()
        .map(|(index, m)| (index, origin.distance(m.position)))
        .fold(None, |best: Option<(usize, f64)>, (index, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((index, d)),
        });

    let player = state
        .remote_players
        .values()
        .map(|p| (&p.id, origin.distance(p.position)))
        .fold(None, |best: Option<(&PlayerId, f64)>, (id, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((id, d)),
        });

    match (monster, player) {
        (Some((index, md)), Some((id, pd))) => {
            if pd < md {
                Some(Target::Player { id: id.clone(), distance: pd })
            } else {
                Some(Target::Monster { index, distance: md })
            }
        }
        (Some((index, distance)), None) => Some(Target::Monster { index, distance }),
        (None, Some((id, distance))) => Some(Target::Player { id: id.clone(), distance }),
        (None, None) => None,
    }
}

/// Fire the equipped weapon.
///
/// Cooldown and ammo are consumed whenever the weapon is ready, even if the
/// shot then hits nothing.
pub fn fire(state: &mut GameState, config: &SimConfig) -> FireOutcome {
    let weapon = state.player.weapon();
    if state.player.weapon_cooldown > 0 || state.player.ammo < weapon.ammo_cost {
        return FireOutcome::NotReady;
    }

    state.player.weapon_cooldown = weapon.cooldown_ticks;
    state.player.ammo -= weapon.ammo_cost;
    state.emit(GameEventData::WeaponFired {
        weapon: weapon.name,
        ammo_left: state.player.ammo,
    });

    let Some(target) = select_target(state) else {
        return FireOutcome::NoTarget;
    };

    let origin = state.player.position;
    let target_pos = match &target {
        Target::Monster { index, .. } => state.monsters[*index].position,
        Target::Player { id, .. } => match state.remote_players.get(id) {
            Some(p) => p.position,
            None => return FireOutcome::NoTarget,
        },
    };

    let angle = relative_angle(origin, state.player.angle, target_pos);
    if target.distance() >= config.fire_range || angle.abs() >= config.fire_cone {
        tracing::debug!(distance = target.distance(), angle, "shot missed");
        return FireOutcome::Missed;
    }

    match target {
        Target::Monster { index, .. } => {
            let monster = &mut state.monsters[index];
            monster.health = monster.health.saturating_sub(weapon.damage);
            if monster.health <= 0 {
                let kind = monster.kind;
                state.monsters.remove(index);
                state.player.score += config.kill_reward;
                tracing::debug!(?kind, score = state.player.score, "monster killed");
                state.emit(GameEventData::MonsterKilled {
                    kind,
                    new_score: state.player.score,
                });
                FireOutcome::MonsterHit { index, killed: true }
            } else {
                let health_left = monster.health;
                state.emit(GameEventData::MonsterHit {
                    index,
                    damage: weapon.damage,
                    health_left,
                });
                FireOutcome::MonsterHit { index, killed: false }
            }
        }
        Target::Player { id, .. } => {
            tracing::debug!(target = %id, damage = weapon.damage, "remote player hit");
            state.emit(GameEventData::RemotePlayerHit {
                target_id: id.clone(),
                damage: weapon.damage,
            });
            FireOutcome::PlayerHit { target_id: id, damage: weapon.damage }
        }
    }
}
