//! Protocol Messages
//!
//! JSON wire format shared by clients and the relay. Every message is a
//! kind-tagged object (`{"type": ...}`) except the periodic state update,
//! which carries no tag at all. Anything whose `type` is missing or not
//! recognised is read as a state update.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;
use crate::game::maze::Grid;
use crate::game::state::{
    GameState, Monster, MonsterKind, PlayerId, PowerUp, PowerUpKind, RemotePlayer, MAX_HEALTH, WEAPONS,
};

/// Speed assumed for a monster record without `speed`.
pub const DEFAULT_MONSTER_SPEED: f64 = 0.03;

/// Largest health magnitude accepted from a monster record.
pub const MAX_RECORD_HEALTH: i32 = i32::MAX / 2;

/// Kinds carried in the `type` field.
const TAGGED_KINDS: [&str; 7] = [
    "request_map",
    "init",
    "player_hit",
    "player_disconnect",
    "powerup_update",
    "join",
    "restart",
];

/// Protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Not JSON, or a field has the wrong shape
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Top-level value is not an object
    #[error("message is not a JSON object")]
    NotAnObject,

    /// `spriteIndex` outside 0..=2
    #[error("unknown monster sprite index {0}")]
    UnknownSprite(u8),

    /// Monster `health` too large in magnitude to simulate
    #[error("monster health {0} out of range")]
    HealthOutOfRange(i32),
}

// =============================================================================
// RECORDS
// =============================================================================

/// Monster as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterRecord {
    pub x: f64,
    pub y: f64,
    pub health: i32,
    /// 0-based monster type
    pub sprite_index: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoot_cooldown: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "hit_power", default, skip_serializing_if = "Option::is_none")]
    pub hit_power: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monster_shoot_cooldown: Option<u32>,
}

impl MonsterRecord {
    /// Full record for a local monster.
    pub fn from_monster(monster: &Monster) -> Self {
        let stats = monster.stats();
        Self {
            x: monster.position.x,
            y: monster.position.y,
            health: monster.health,
            sprite_index: monster.kind.sprite_index(),
            speed: Some(monster.speed),
            angle: Some(monster.angle),
            shoot_cooldown: Some(monster.shoot_cooldown),
            color: Some(monster.color.clone()),
            hit_power: Some(stats.hit_power),
            fire_distance: Some(stats.fire_distance),
            monster_shoot_cooldown: Some(stats.shoot_cooldown),
        }
    }

    /// Build a monster, filling missing fields with defaults.
    ///
    /// `shoot_cooldown` is always taken from the caller; the record's own
    /// value is ignored.
    pub fn to_monster(&self, shoot_cooldown: u32) -> Result<Monster, ProtocolError> {
        let kind = MonsterKind::from_sprite_index(self.sprite_index)
            .ok_or(ProtocolError::UnknownSprite(self.sprite_index))?;
        if !(-MAX_RECORD_HEALTH..=MAX_RECORD_HEALTH).contains(&self.health) {
            return Err(ProtocolError::HealthOutOfRange(self.health));
        }
        let mut monster = Monster::new(
            kind,
            Vec2::new(self.x, self.y),
            self.speed.unwrap_or(DEFAULT_MONSTER_SPEED),
            self.angle.unwrap_or(0.0),
        );
        monster.health = self.health;
        monster.shoot_cooldown = shoot_cooldown;
        if let Some(color) = &self.color {
            monster.color = color.clone();
        }
        Ok(monster)
    }
}

/// Power-up as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpRecord {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collected: bool,
}

impl From<&PowerUp> for PowerUpRecord {
    fn from(p: &PowerUp) -> Self {
        Self {
            x: p.position.x,
            y: p.position.y,
            kind: p.kind,
            collected: p.collected,
        }
    }
}

impl From<&PowerUpRecord> for PowerUp {
    fn from(r: &PowerUpRecord) -> Self {
        Self {
            position: Vec2::new(r.x, r.y),
            kind: r.kind,
            collected: r.collected,
        }
    }
}

/// Player block of a state update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(default)]
    pub ammo: u32,
    #[serde(default)]
    pub score: u32,
    /// Weapon name (`pistol`, `machinegun`, `plasma`)
    #[serde(default)]
    pub weapon: String,
}

impl PlayerRecord {
    /// Record for the local player.
    pub fn from_state(state: &GameState) -> Self {
        let p = &state.player;
        Self {
            id: p.id.clone(),
            x: p.position.x,
            y: p.position.y,
            angle: p.angle,
            health: Some(p.health),
            ammo: p.ammo,
            score: p.score,
            weapon: p.weapon().name.to_string(),
        }
    }

    /// Remote player view. Missing health reads as full; unknown weapons as the first.
    pub fn to_remote(&self) -> RemotePlayer {
        RemotePlayer {
            id: self.id.clone(),
            position: Vec2::new(self.x, self.y),
            angle: self.angle,
            health: self.health.unwrap_or(MAX_HEALTH),
            ammo: self.ammo,
            score: self.score,
            weapon: WEAPONS.iter().position(|w| w.name == self.weapon).unwrap_or(0),
        }
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Map plus entities, sent by the map authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitPayload {
    pub map: Grid,
    #[serde(default)]
    pub powerups: Vec<PowerUpRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monsters: Option<Vec<MonsterRecord>>,
}

impl InitPayload {
    /// Current map and entities of `state`.
    pub fn from_state(state: &GameState) -> Self {
        Self {
            map: state.grid.clone(),
            powerups: state.powerups.iter().map(PowerUpRecord::from).collect(),
            monsters: Some(state.monsters.iter().map(MonsterRecord::from_monster).collect()),
        }
    }
}

/// Untagged periodic state update. Every block is optional on receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monsters: Option<Vec<MonsterRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powerups: Option<Vec<PowerUpRecord>>,
}

impl StatePayload {
    /// Snapshot of the local player and every entity.
    pub fn from_state(state: &GameState) -> Self {
        Self {
            player: Some(PlayerRecord::from_state(state)),
            monsters: Some(state.monsters.iter().map(MonsterRecord::from_monster).collect()),
            powerups: Some(state.powerups.iter().map(PowerUpRecord::from).collect()),
        }
    }
}

/// Every message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Relay asks the first client for its map
    RequestMap,

    /// Wholesale map and entity replacement
    Init(InitPayload),

    /// A peer hit `target_id`
    PlayerHit {
        #[serde(rename = "targetId")]
        target_id: PlayerId,
        damage: i32,
        #[serde(rename = "sourceId", default, skip_serializing_if = "Option::is_none")]
        source_id: Option<PlayerId>,
    },

    /// A peer left
    PlayerDisconnect {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },

    /// Immediate power-up list after a pickup
    #[serde(rename = "powerup_update")]
    PowerUpUpdate { powerups: Vec<PowerUpRecord> },

    /// Client registers with the relay
    Join {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },

    /// Client restarts after death
    Restart {
        #[serde(rename = "playerId", default, skip_serializing_if = "Option::is_none")]
        player_id: Option<PlayerId>,
    },

    /// Periodic peer state (untagged on the wire)
    #[serde(skip)]
    State(StatePayload),
}

impl WireMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        let text = match self {
            WireMessage::State(payload) => serde_json::to_string(payload)?,
            tagged => serde_json::to_string(tagged)?,
        };
        Ok(text)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        if !value.is_object() {
            return Err(ProtocolError::NotAnObject);
        }
        let kind = value.get("type").and_then(serde_json::Value::as_str);
        match kind {
            Some(kind) if TAGGED_KINDS.contains(&kind) => Ok(serde_json::from_value(value)?),
            _ => Ok(WireMessage::State(serde_json::from_value(value)?)),
        }
    }

    /// Kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::RequestMap => "request_map",
            WireMessage::Init(_) => "init",
            WireMessage::PlayerHit { .. } => "player_hit",
            WireMessage::PlayerDisconnect { .. } => "player_disconnect",
            WireMessage::PowerUpUpdate { .. } => "powerup_update",
            WireMessage::Join { .. } => "join",
            WireMessage::Restart { .. } => "restart",
            WireMessage::State(_) => "state",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
