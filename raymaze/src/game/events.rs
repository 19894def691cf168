//! Game Events
//!
//! Events generated during simulation. The session layer turns them into
//! sound cues and outgoing network messages.

use crate::core::vec2::Vec2;
use crate::game::state::{MonsterKind, PlayerId, PowerUpKind};

/// Where incoming damage came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageSource {
    /// A monster's line-of-sight shot
    Monster,
    /// A `player_hit` notification from a peer
    Remote,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEventData {
    /// Local player fired (cooldown and ammo already applied)
    WeaponFired {
        weapon: &'static str,
        ammo_left: u32,
    },

    /// Local player cycled weapons
    WeaponSwitched {
        weapon: &'static str,
    },

    /// A monster took damage and survived
    MonsterHit {
        index: usize,
        damage: i32,
        health_left: i32,
    },

    /// A monster died to local fire
    MonsterKilled {
        kind: MonsterKind,
        new_score: u32,
    },

    /// A remote player was hit; only the peer applies the damage
    RemotePlayerHit {
        target_id: PlayerId,
        damage: i32,
    },

    /// Local player lost health
    PlayerDamaged {
        source: DamageSource,
        damage: i32,
        health_left: i32,
    },

    /// Local player reached zero health
    PlayerDied,

    /// Local player picked up a power-up
    PowerUpCollected {
        kind: PowerUpKind,
        health: i32,
        ammo: u32,
    },

    /// Power-up appeared
    PowerUpSpawned {
        kind: PowerUpKind,
        position: Vec2,
    },

    /// Monster appeared
    MonsterSpawned {
        kind: MonsterKind,
        position: Vec2,
    },

    /// Grid was replaced and the local player relocated
    MapReplaced {
        width: usize,
        height: usize,
    },
}

/// A game event stamped with the tick it happened on.
#[derive(Clone, Debug, PartialEq)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Logical sound name to play for this event, if any.
    pub fn sound_cue(&self) -> Option<&'static str> {
        match self.data {
            GameEventData::WeaponFired { .. } => Some("shoot"),
            GameEventData::PlayerDamaged { .. } => Some("hit"),
            _ => None,
        }
    }

    /// True for events peers need to hear about immediately.
    pub fn is_network_relevant(&self) -> bool {
        matches!(
            self.data,
            GameEventData::RemotePlayerHit { .. } | GameEventData::PowerUpCollected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_cues() {
        let fired = GameEvent::new(1, GameEventData::WeaponFired { weapon: "pistol", ammo_left: 99 });
        assert_eq!(fired.sound_cue(), Some("shoot"));

        let hurt = GameEvent::new(
            2,
            GameEventData::PlayerDamaged { source: DamageSource::Monster, damage: 5, health_left: 95 },
        );
        assert_eq!(hurt.sound_cue(), Some("hit"));

        let died = GameEvent::new(3, GameEventData::PlayerDied);
        assert_eq!(died.sound_cue(), None);
    }

    #[test]
    fn test_network_relevance() {
        let hit = GameEvent::new(
            1,
            GameEventData::RemotePlayerHit { target_id: PlayerId::from("abc123"), damage: 10 },
        );
        assert!(hit.is_network_relevant());

        let spawned = GameEvent::new(
            1,
            GameEventData::MonsterSpawned { kind: MonsterKind::Basic, position: Vec2::ZERO },
        );
        assert!(!spawned.is_network_relevant());
    }
}
