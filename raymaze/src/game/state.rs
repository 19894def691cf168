//! Game State Definitions
//!
//! All state types for the simulation: the local player, remote players,
//! monsters, power-ups and the static weapon / monster tables.
//! Uses BTreeMap for stable remote-player iteration order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::{normalize_angle, Vec2};
use crate::game::events::{DamageSource, GameEvent, GameEventData};
use crate::game::maze::{self, find_empty_spot, Grid, MazeError};

/// Starting (and maximum) health.
pub const MAX_HEALTH: i32 = 100;

/// Starting ammo.
pub const STARTING_AMMO: u32 = 100;

/// Ticks the red damage overlay lasts.
pub const DAMAGE_FLASH_TICKS: u32 = 10;

/// Monsters present when a fresh maze is generated.
pub const INITIAL_MONSTERS: usize = 5;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Short opaque player identifier.
///
/// Implements Ord for stable BTreeMap ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Length of generated ids.
    pub const LEN: usize = 6;

    /// Fresh random id (first characters of a v4 UUID).
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(Self::LEN);
        Self(id)
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// WEAPONS
// =============================================================================

/// Static weapon definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weapon {
    /// Logical name, also the sprite key
    pub name: &'static str,
    /// Spread in radians (cosmetic)
    pub spread: f64,
    /// Damage per hit
    pub damage: i32,
    /// Ticks between shots
    pub cooldown_ticks: u32,
    /// Ammo consumed per shot
    pub ammo_cost: u32,
    /// Crosshair colour when ready
    pub crosshair_color: &'static str,
    /// Crosshair arm length (px)
    pub crosshair_size: u32,
}

/// Weapon table; selection cycles through it in order.
pub const WEAPONS: [Weapon; 3] = [
    Weapon {
        name: "pistol",
        spread: 0.01,
        damage: 10,
        cooldown_ticks: 10,
        ammo_cost: 1,
        crosshair_color: "#00FF00",
        crosshair_size: 10,
    },
    Weapon {
        name: "machinegun",
        spread: 0.05,
        damage: 20,
        cooldown_ticks: 20,
        ammo_cost: 2,
        crosshair_color: "#FFFF00",
        crosshair_size: 20,
    },
    Weapon {
        name: "plasma",
        spread: 0.1,
        damage: 40,
        cooldown_ticks: 40,
        ammo_cost: 4,
        crosshair_color: "#00FFFF",
        crosshair_size: 40,
    },
];

impl Weapon {
    /// Look up by index, wrapping around the table.
    pub fn by_index(index: usize) -> &'static Weapon {
        &WEAPONS[index % WEAPONS.len()]
    }

    /// Display name with a leading capital.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// =============================================================================
// MONSTERS
// =============================================================================

/// Monster type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    /// Slow, weak
    Basic,
    /// Middle tier
    Medium,
    /// Fast, hits hard, long range
    Hard,
}

/// Immutable per-type base stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonsterStats {
    /// Spawn health
    pub health: i32,
    /// Damage per shot
    pub hit_power: i32,
    /// Speed before spawn jitter
    pub base_speed: f64,
    /// Max shooting distance
    pub fire_distance: f64,
    /// Ticks between shots
    pub shoot_cooldown: u32,
    /// Marker / fallback colour
    pub color: &'static str,
}

const MONSTER_STATS: [MonsterStats; 3] = [
    MonsterStats {
        health: 100,
        hit_power: 5,
        base_speed: 0.01,
        fire_distance: 8.0,
        shoot_cooldown: 200,
        color: "#FF0000",
    },
    MonsterStats {
        health: 125,
        hit_power: 10,
        base_speed: 0.02,
        fire_distance: 10.0,
        shoot_cooldown: 200,
        color: "#8B4513",
    },
    MonsterStats {
        health: 156,
        hit_power: 20,
        base_speed: 0.03,
        fire_distance: 12.0,
        shoot_cooldown: 300,
        color: "#FFD700",
    },
];

impl MonsterKind {
    /// All kinds, in sprite-index order.
    pub const ALL: [MonsterKind; 3] = [MonsterKind::Basic, MonsterKind::Medium, MonsterKind::Hard];

    /// Base stats for this kind.
    #[inline]
    pub fn stats(self) -> &'static MonsterStats {
        &MONSTER_STATS[self.sprite_index() as usize]
    }

    /// Zero-based wire index.
    pub fn sprite_index(self) -> u8 {
        match self {
            MonsterKind::Basic => 0,
            MonsterKind::Medium => 1,
            MonsterKind::Hard => 2,
        }
    }

    /// Decode a wire index.
    pub fn from_sprite_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Asset key for the sprite.
    pub fn sprite_name(self) -> &'static str {
        match self {
            MonsterKind::Basic => "monster1",
            MonsterKind::Medium => "monster2",
            MonsterKind::Hard => "monster3",
        }
    }
}

/// Runtime monster instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Monster {
    /// Position in grid units
    pub position: Vec2,
    /// Remaining health
    pub health: i32,
    /// Type tag
    pub kind: MonsterKind,
    /// Speed fixed at spawn (base + jitter)
    pub speed: f64,
    /// Facing (radians)
    pub angle: f64,
    /// Ticks until it may shoot again
    pub shoot_cooldown: u32,
    /// Colour tag (hex)
    pub color: String,
}

impl Monster {
    /// Fresh monster with full health and a full cooldown.
    pub fn new(kind: MonsterKind, position: Vec2, speed: f64, angle: f64) -> Self {
        let stats = kind.stats();
        Self {
            position,
            health: stats.health,
            kind,
            speed,
            angle: normalize_angle(angle),
            shoot_cooldown: stats.shoot_cooldown,
            color: stats.color.to_owned(),
        }
    }

    /// Base stats of this monster's kind.
    #[inline]
    pub fn stats(&self) -> &'static MonsterStats {
        self.kind.stats()
    }
}

// =============================================================================
// POWER-UPS
// =============================================================================

/// Power-up kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    /// Restores health
    Health,
    /// Adds ammo
    Ammo,
}

impl PowerUpKind {
    /// All kinds.
    pub const ALL: [PowerUpKind; 2] = [PowerUpKind::Health, PowerUpKind::Ammo];

    /// Overlay colour.
    pub fn color(self) -> &'static str {
        match self {
            PowerUpKind::Health => "#00FF00",
            PowerUpKind::Ammo => "#0000FF",
        }
    }
}

/// Power-up instance.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerUp {
    /// Position in grid units
    pub position: Vec2,
    /// What it gives
    pub kind: PowerUpKind,
    /// Set once its effect was applied
    pub collected: bool,
}

impl PowerUp {
    /// Uncollected power-up.
    pub fn new(kind: PowerUpKind, position: Vec2) -> Self {
        Self { position, kind, collected: false }
    }
}

// =============================================================================
// PLAYERS
// =============================================================================

/// The locally simulated player.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalPlayer {
    /// Player ID
    pub id: PlayerId,
    /// Position in grid units
    pub position: Vec2,
    /// Facing, kept in (-π, π]
    pub angle: f64,
    /// 0..=MAX_HEALTH
    pub health: i32,
    /// Remaining ammo
    pub ammo: u32,
    /// Kill score
    pub score: u32,
    /// Index into [`WEAPONS`]
    pub weapon: usize,
    /// Ticks until the weapon can fire
    pub weapon_cooldown: u32,
}

impl LocalPlayer {
    /// Fresh player at full health.
    pub fn new(id: PlayerId, position: Vec2) -> Self {
        Self {
            id,
            position,
            angle: 0.0,
            health: MAX_HEALTH,
            ammo: STARTING_AMMO,
            score: 0,
            weapon: 0,
            weapon_cooldown: 0,
        }
    }

    /// Equipped weapon.
    #[inline]
    pub fn weapon(&self) -> &'static Weapon {
        Weapon::by_index(self.weapon)
    }

    /// Health above zero.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Cycle to the next weapon.
    pub fn switch_weapon(&mut self) -> &'static Weapon {
        self.weapon = (self.weapon + 1) % WEAPONS.len();
        self.weapon()
    }
}

/// A peer's last reported state. Never simulated locally.
#[derive(Clone, Debug, PartialEq)]
pub struct RemotePlayer {
    /// Player ID
    pub id: PlayerId,
    /// Position in grid units
    pub position: Vec2,
    /// Facing
    pub angle: f64,
    /// Reported health
    pub health: i32,
    /// Reported ammo
    pub ammo: u32,
    /// Reported score
    pub score: u32,
    /// Reported weapon index
    pub weapon: usize,
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete client-side simulation state.
///
/// Owned by one session and passed by reference to every system.
#[derive(Clone, Debug)]
pub struct GameState {
    /// Current occupancy grid
    pub grid: Grid,

    /// Local player
    pub player: LocalPlayer,

    /// Peers, keyed by id (BTreeMap for stable iteration)
    pub remote_players: BTreeMap<PlayerId, RemotePlayer>,

    /// Monsters; index order is meaningful to the merge protocol
    pub monsters: Vec<Monster>,

    /// Power-ups
    pub powerups: Vec<PowerUp>,

    /// Gameplay RNG
    pub rng: DeterministicRng,

    /// Remaining damage-flash ticks
    pub damage_flash: u32,

    /// Seconds left before another pickup may be processed
    pub pickup_lockout: f64,

    /// Ticks simulated so far
    pub tick: u64,

    /// Events produced since the last tick result
    pub pending_events: Vec<GameEvent>,
}

impl GameState {
    /// State over an existing grid, with the player on a random empty spot
    /// and no monsters.
    pub fn with_grid(id: PlayerId, grid: Grid, mut rng: DeterministicRng) -> Self {
        let spawn = find_empty_spot(&grid, &mut rng);
        Self {
            grid,
            player: LocalPlayer::new(id, spawn),
            remote_players: BTreeMap::new(),
            monsters: Vec::new(),
            powerups: Vec::new(),
            rng,
            damage_flash: 0,
            pickup_lockout: 0.0,
            tick: 0,
            pending_events: Vec::new(),
        }
    }

    /// Generate a fresh maze and populate it with the initial monsters.
    pub fn generate(id: PlayerId, width: usize, height: usize, seed: u64) -> Result<Self, MazeError> {
        let mut rng = DeterministicRng::new(seed);
        let grid = maze::generate(width, height, &mut rng)?;
        let mut state = Self::with_grid(id, grid, rng);
        for _ in 0..INITIAL_MONSTERS {
            crate::game::monster::spawn_monster(&mut state);
        }
        Ok(state)
    }

    /// Queue an event stamped with the current tick.
    pub fn emit(&mut self, data: GameEventData) {
        self.pending_events.push(GameEvent::new(self.tick, data));
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Local health is zero.
    #[inline]
    pub fn is_dead(&self) -> bool {
        !self.player.is_alive()
    }

    /// Replace the grid and move the local player to a fresh empty cell.
    pub fn update_map(&mut self, grid: Grid) {
        self.grid = grid;
        self.player.position = find_empty_spot(&self.grid, &mut self.rng);
        tracing::info!(
            width = self.grid.width(),
            height = self.grid.height(),
            x = self.player.position.x,
            y = self.player.position.y,
            "map replaced, player relocated"
        );
        self.emit(GameEventData::MapReplaced {
            width: self.grid.width(),
            height: self.grid.height(),
        });
    }

    /// Apply damage reported by a peer.
    pub fn handle_player_hit(&mut self, damage: i32) {
        self.apply_damage(DamageSource::Remote, damage);
    }

    /// Reduce local health (floored at zero) and start the damage flash.
    pub fn apply_damage(&mut self, source: DamageSource, damage: i32) {
        let was_alive = self.player.is_alive();
        self.player.health = self.player.health.saturating_sub(damage.max(0)).max(0);
        self.damage_flash = DAMAGE_FLASH_TICKS;

        self.emit(GameEventData::PlayerDamaged {
            source,
            damage,
            health_left: self.player.health,
        });

        if was_alive && !self.player.is_alive() {
            tracing::info!(player = %self.player.id, ?source, "local player died");
            self.emit(GameEventData::PlayerDied);
        }
    }

    /// Fresh local player (same id) on a new empty spot.
    pub fn restart(&mut self) {
        let spawn = find_empty_spot(&self.grid, &mut self.rng);
        self.player = LocalPlayer::new(self.player.id.clone(), spawn);
        self.damage_flash = 0;
        self.pickup_lockout = 0.0;
        tracing::info!(player = %self.player.id, "local player restarted");
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_state() -> GameState {
        GameState::generate(PlayerId::from("local1"), 11, 11, 42).unwrap()
    }

    #[test]
    fn test_player_id_generate() {
        let a = PlayerId::generate();
        let b = PlayerId::generate();
        assert_eq!(a.as_str().len(), PlayerId::LEN);
        assert_ne!(a, b);
        assert_eq!(serde_json::to_string(&PlayerId::from("abc")).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_weapon_table() {
        assert_eq!(Weapon::by_index(0).name, "pistol");
        assert_eq!(Weapon::by_index(3).name, "pistol");
        assert_eq!(Weapon::by_index(2).damage, 40);
        assert_eq!(Weapon::by_index(1).display_name(), "Machinegun");
    }

    #[test]
    fn test_weapon_switch_cycles() {
        let mut player = LocalPlayer::new(PlayerId::from("p"), Vec2::ZERO);
        assert_eq!(player.switch_weapon().name, "machinegun");
        assert_eq!(player.switch_weapon().name, "plasma");
        assert_eq!(player.switch_weapon().name, "pistol");
    }

    #[test]
    fn test_monster_kinds() {
        for (i, kind) in MonsterKind::ALL.iter().enumerate() {
            assert_eq!(kind.sprite_index() as usize, i);
            assert_eq!(MonsterKind::from_sprite_index(i as u8), Some(*kind));
        }
        assert_eq!(MonsterKind::from_sprite_index(3), None);
        assert_eq!(MonsterKind::Hard.stats().health, 156);

        let m = Monster::new(MonsterKind::Medium, Vec2::new(3.0, 3.0), 0.025, 4.0);
        assert_eq!(m.health, 125);
        assert_eq!(m.shoot_cooldown, 200);
        assert!(m.angle <= std::f64::consts::PI);
    }

    #[test]
    fn test_generate_populates() {
        let state = small_state();
        assert_eq!(state.monsters.len(), INITIAL_MONSTERS);
        assert!(state.powerups.is_empty());
        assert_eq!(state.player.health, MAX_HEALTH);
        assert!(state.grid.is_floor(state.player.position.x as i64, state.player.position.y as i64));
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut state = small_state();
        state.player.health = 1;
        state.handle_player_hit(10);
        assert_eq!(state.player.health, 0);
        assert_eq!(state.damage_flash, DAMAGE_FLASH_TICKS);

        let events = state.take_events();
        assert!(events.iter().any(|e| e.data == GameEventData::PlayerDied));

        // Further hits keep it at zero and do not re-announce death.
        state.handle_player_hit(5);
        assert_eq!(state.player.health, 0);
        assert!(!state.take_events().iter().any(|e| e.data == GameEventData::PlayerDied));
    }

    #[test]
    fn test_update_map_relocates() {
        let mut state = small_state();
        let grid = Grid::from_rows(vec![
            vec![1, 1, 1, 1],
            vec![1, 1, 0, 1],
            vec![1, 1, 1, 1],
        ])
        .unwrap();
        state.update_map(grid);
        assert_eq!(state.player.position, Vec2::new(2.0, 1.0));
        assert!(matches!(
            state.take_events().last().map(|e| &e.data),
            Some(GameEventData::MapReplaced { width: 4, height: 3 })
        ));
    }

    #[test]
    fn test_restart_keeps_id() {
        let mut state = small_state();
        state.player.health = 0;
        state.player.score = 300;
        state.restart();
        assert_eq!(state.player.id, PlayerId::from("local1"));
        assert_eq!(state.player.health, MAX_HEALTH);
        assert_eq!(state.player.score, 0);
    }
}
