//! Network Sync
//!
//! Merge protocol between the local simulation and its peers.
//!
//! Incoming messages land in a bounded queue filled by the transport task
//! and are drained once per frame, before the simulation step, so a merge
//! never interleaves with a tick. Merging is last-writer-wins over whole
//! collections: a peer's state update replaces the local monster and
//! power-up lists outright. Only each monster's `shoot_cooldown` survives,
//! matched by list position.
//!
//! Outgoing messages are fire-and-forget. While disconnected they are
//! dropped instead of queued.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::{GameState, Monster, PowerUp};
use crate::network::protocol::{InitPayload, MonsterRecord, ProtocolError, StatePayload, WireMessage};

/// Sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Emit a snapshot every N connected frames
    pub cadence: u64,
    /// Inbound queue capacity
    pub inbox_capacity: usize,
    /// Outbound queue capacity
    pub outbox_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cadence: 3,
            inbox_capacity: 256,
            outbox_capacity: 256,
        }
    }
}

/// Transport connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Socket open, `join` sent
    Connected,
}

/// Transport-side ends of the sync queues.
#[derive(Debug)]
pub struct SyncEndpoints {
    /// Decoded inbound messages
    pub inbox: mpsc::Sender<WireMessage>,
    /// Messages to write to the socket
    pub outbox: mpsc::Receiver<WireMessage>,
    /// Connection state published by the transport
    pub connection: watch::Sender<ConnectionState>,
}

/// Session-side ends of the sync queues.
pub struct NetworkSync {
    config: SyncConfig,
    inbox: mpsc::Receiver<WireMessage>,
    outbox: mpsc::Sender<WireMessage>,
    connection: watch::Receiver<ConnectionState>,
    update_counter: u64,
}

impl NetworkSync {
    /// Create the queue pair. The endpoints go to the transport task.
    pub fn channel(config: SyncConfig) -> (Self, SyncEndpoints) {
        let (inbox_tx, inbox_rx) = mpsc::channel(config.inbox_capacity.max(1));
        let (outbox_tx, outbox_rx) = mpsc::channel(config.outbox_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let sync = Self {
            config,
            inbox: inbox_rx,
            outbox: outbox_tx,
            connection: state_rx,
            update_counter: 0,
        };
        let endpoints = SyncEndpoints {
            inbox: inbox_tx,
            outbox: outbox_rx,
            connection: state_tx,
        };
        (sync, endpoints)
    }

    /// Sync with no transport. Stays disconnected forever.
    pub fn offline() -> Self {
        let (sync, _endpoints) = Self::channel(SyncConfig::default());
        sync
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// True while the transport reports an open socket.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Drain every queued inbound message into `state`. Replies go to the outbox.
    pub fn drain(&mut self, state: &mut GameState) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            if let Some(reply) = apply_message(state, msg) {
                self.send(reply);
            }
            applied += 1;
        }
        applied
    }

    /// Count a connected frame and emit a snapshot on the cadence.
    pub fn maybe_emit_snapshot(&mut self, state: &GameState) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.update_counter += 1;
        if self.update_counter % self.config.cadence.max(1) != 0 {
            return false;
        }
        self.send(snapshot(state))
    }

    /// Forward remote-player hits and pickups from a tick's events.
    pub fn forward_events(&mut self, state: &GameState, events: &[GameEvent]) {
        for event in events.iter().filter(|e| e.is_network_relevant()) {
            match &event.data {
                GameEventData::RemotePlayerHit { target_id, damage } => {
                    self.send(WireMessage::PlayerHit {
                        target_id: target_id.clone(),
                        damage: *damage,
                        source_id: Some(state.player.id.clone()),
                    });
                }
                GameEventData::PowerUpCollected { .. } => {
                    self.send(powerup_update(state));
                }
                _ => {}
            }
        }
    }

    /// Queue a message. Dropped while disconnected or when the outbox is full.
    pub fn send(&mut self, msg: WireMessage) -> bool {
        if !self.is_connected() {
            debug!(kind = msg.kind(), "not connected, send suppressed");
            return false;
        }
        match self.outbox.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                warn!(kind = msg.kind(), "outbox full, message dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                warn!(kind = msg.kind(), "transport gone, message dropped");
                false
            }
        }
    }
}

/// Periodic snapshot of the local player and all entities.
pub fn snapshot(state: &GameState) -> WireMessage {
    WireMessage::State(StatePayload::from_state(state))
}

/// Current power-up list as an immediate update.
pub fn powerup_update(state: &GameState) -> WireMessage {
    WireMessage::PowerUpUpdate {
        powerups: state.powerups.iter().map(Into::into).collect(),
    }
}

/// Merge one inbound message into `state`. Returns a reply to send, if any.
///
/// A message that fails validation is logged and discarded as a whole;
/// local state is left untouched.
pub fn apply_message(state: &mut GameState, msg: WireMessage) -> Option<WireMessage> {
    let kind = msg.kind();
    match try_apply(state, msg) {
        Ok(reply) => reply,
        Err(e) => {
            warn!(kind, error = %e, "discarding network payload");
            None
        }
    }
}

fn try_apply(state: &mut GameState, msg: WireMessage) -> Result<Option<WireMessage>, ProtocolError> {
    match msg {
        WireMessage::RequestMap => {
            info!("map requested, sending ours");
            return Ok(Some(WireMessage::Init(InitPayload::from_state(state))));
        }
        WireMessage::Init(init) => {
            let powerups: Vec<PowerUp> = init.powerups.iter().map(PowerUp::from).collect();
            let monsters = match &init.monsters {
                Some(records) => Some(decode_monsters(records, |r, _| {
                    r.shoot_cooldown.unwrap_or(0)
                })?),
                None => None,
            };
            info!("received map from peer");
            state.update_map(init.map);
            state.powerups = powerups;
            if let Some(monsters) = monsters {
                state.monsters = monsters;
            }
        }
        WireMessage::PlayerHit { target_id, damage, source_id } => {
            if target_id == state.player.id {
                debug!(damage, source = ?source_id, "hit by peer");
                state.handle_player_hit(damage);
            }
        }
        WireMessage::PlayerDisconnect { player_id } => {
            if state.remote_players.remove(&player_id).is_some() {
                info!(player = %player_id, "peer disconnected");
            }
        }
        WireMessage::PowerUpUpdate { powerups } => {
            state.powerups = powerups.iter().map(PowerUp::from).collect();
        }
        WireMessage::Join { .. } | WireMessage::Restart { .. } => {
            debug!("relay-only message ignored");
        }
        WireMessage::State(update) => merge_state(state, update)?,
    }
    Ok(None)
}

/// Peer state update: upsert the sender, replace monsters and power-ups.
fn merge_state(state: &mut GameState, update: StatePayload) -> Result<(), ProtocolError> {
    // Decode everything first so a bad record leaves state untouched.
    let monsters = match &update.monsters {
        Some(records) => {
            let local = &state.monsters;
            Some(decode_monsters(records, |_, i| {
                local.get(i).map_or(0, |m| m.shoot_cooldown)
            })?)
        }
        None => None,
    };

    if let Some(player) = &update.player {
        if player.id != state.player.id {
            state.remote_players.insert(player.id.clone(), player.to_remote());
        }
    }
    if let Some(monsters) = monsters {
        state.monsters = monsters;
    }
    if let Some(powerups) = &update.powerups {
        state.powerups = powerups.iter().map(PowerUp::from).collect();
    }
    Ok(())
}

fn decode_monsters(
    records: &[MonsterRecord],
    cooldown: impl Fn(&MonsterRecord, usize) -> u32,
) -> Result<Vec<Monster>, ProtocolError> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| r.to_monster(cooldown(r, i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::core::vec2::Vec2;
    use crate::game::combat::{fire, FireOutcome};
    use crate::game::input::InputFrame;
    use crate::game::maze::{Cell, Grid};
    use crate::game::state::{MonsterKind, PlayerId, PowerUpKind};
    use crate::game::tick::{tick, SimConfig};
    use crate::network::protocol::{PlayerRecord, PowerUpRecord};

    fn state() -> GameState {
        GameState::generate(PlayerId::from("me0001"), 11, 11, 7).unwrap()
    }

    fn record(x: f64, sprite_index: u8) -> MonsterRecord {
        MonsterRecord {
            x,
            y: 1.5,
            health: 90,
            sprite_index,
            speed: None,
            angle: None,
            shoot_cooldown: Some(999),
            color: None,
            hit_power: None,
            fire_distance: None,
            monster_shoot_cooldown: None,
        }
    }

    #[test]
    fn test_state_merge_keeps_local_cooldowns() {
        let mut s = state();
        s.monsters.truncate(2);
        s.monsters[0].shoot_cooldown = 17;
        s.monsters[1].shoot_cooldown = 4;

        let update = StatePayload {
            player: None,
            monsters: Some(vec![record(2.0, 0), record(3.0, 1), record(4.0, 2)]),
            powerups: None,
        };
        apply_message(&mut s, WireMessage::State(update));

        assert_eq!(s.monsters.len(), 3);
        assert_eq!(s.monsters[0].shoot_cooldown, 17);
        assert_eq!(s.monsters[1].shoot_cooldown, 4);
        assert_eq!(s.monsters[2].shoot_cooldown, 0);
        assert_eq!(s.monsters[2].kind, MonsterKind::Hard);
        assert_eq!(s.monsters[0].position, Vec2::new(2.0, 1.5));
    }

    #[test]
    fn test_state_upserts_remote_player() {
        let mut s = state();
        let player = PlayerRecord {
            id: PlayerId::from("peer01"),
            x: 3.0,
            y: 3.0,
            angle: 0.5,
            health: None,
            ammo: 10,
            score: 200,
            weapon: "machinegun".into(),
        };
        let update = StatePayload { player: Some(player.clone()), ..StatePayload::default() };
        apply_message(&mut s, WireMessage::State(update));
        let remote = &s.remote_players[&PlayerId::from("peer01")];
        assert_eq!(remote.health, 100);
        assert_eq!(remote.weapon, 1);

        // Own echo is ignored.
        let echo = PlayerRecord { id: s.player.id.clone(), ..player };
        apply_message(&mut s, WireMessage::State(StatePayload { player: Some(echo), ..StatePayload::default() }));
        assert_eq!(s.remote_players.len(), 1);
    }

    #[test]
    fn test_bad_record_discards_whole_message() {
        let mut s = state();
        let before = s.monsters.clone();
        let update = StatePayload {
            player: Some(PlayerRecord {
                id: PlayerId::from("peer01"),
                x: 1.0,
                y: 1.0,
                angle: 0.0,
                health: Some(50),
                ammo: 0,
                score: 0,
                weapon: String::new(),
            }),
            monsters: Some(vec![record(2.0, 0), record(2.0, 9)]),
            powerups: Some(vec![]),
        };
        apply_message(&mut s, WireMessage::State(update));
        assert_eq!(s.monsters, before);
        assert!(s.remote_players.is_empty());
    }

    #[test]
    fn test_hit_targeting() {
        let mut s = state();
        let hit = |target: &str| WireMessage::PlayerHit {
            target_id: PlayerId::from(target),
            damage: 30,
            source_id: None,
        };
        apply_message(&mut s, hit("other1"));
        assert_eq!(s.player.health, 100);
        apply_message(&mut s, hit("me0001"));
        assert_eq!(s.player.health, 70);
        assert!(s.damage_flash > 0);
    }

    #[test]
    fn test_request_map_replies_with_init() {
        let mut s = state();
        let reply = apply_message(&mut s, WireMessage::RequestMap).unwrap();
        let WireMessage::Init(init) = reply else {
            panic!("expected init");
        };
        assert_eq!(init.map, s.grid);
        assert_eq!(init.monsters.unwrap().len(), s.monsters.len());
    }

    #[test]
    fn test_init_replaces_map_and_relocates() {
        let mut s = state();
        let grid = Grid::from_rows(vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]]).unwrap();
        let init = InitPayload {
            map: grid.clone(),
            powerups: vec![PowerUpRecord { x: 1.0, y: 1.0, kind: PowerUpKind::Health, collected: false }],
            monsters: None,
        };
        let monsters_before = s.monsters.len();
        apply_message(&mut s, WireMessage::Init(init));
        assert_eq!(s.grid, grid);
        assert_eq!(s.player.position, Vec2::new(1.0, 1.0));
        assert_eq!(s.powerups.len(), 1);
        assert_eq!(s.monsters.len(), monsters_before);
    }

    #[test]
    fn test_disconnect_removes_remote() {
        let mut s = state();
        s.remote_players.insert(
            PlayerId::from("peer01"),
            PlayerRecord {
                id: PlayerId::from("peer01"),
                x: 1.0,
                y: 1.0,
                angle: 0.0,
                health: None,
                ammo: 0,
                score: 0,
                weapon: String::new(),
            }
            .to_remote(),
        );
        apply_message(&mut s, WireMessage::PlayerDisconnect { player_id: PlayerId::from("peer01") });
        assert!(s.remote_players.is_empty());
    }

    #[test]
    fn test_sends_suppressed_while_disconnected() {
        let (mut sync, mut endpoints) = NetworkSync::channel(SyncConfig::default());
        let s = state();
        assert!(!sync.send(snapshot(&s)));
        for _ in 0..3 {
            assert!(!sync.maybe_emit_snapshot(&s));
        }
        assert!(endpoints.outbox.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_cadence() {
        let (mut sync, mut endpoints) = NetworkSync::channel(SyncConfig::default());
        endpoints.connection.send(ConnectionState::Connected).unwrap();
        let s = state();
        let sent: Vec<bool> = (0..6).map(|_| sync.maybe_emit_snapshot(&s)).collect();
        assert_eq!(sent, vec![false, false, true, false, false, true]);
        assert!(matches!(endpoints.outbox.try_recv(), Ok(WireMessage::State(_))));
    }

    #[test]
    fn test_drain_applies_in_order_and_replies() {
        let (mut sync, mut endpoints) = NetworkSync::channel(SyncConfig::default());
        endpoints.connection.send(ConnectionState::Connected).unwrap();
        let mut s = GameState::with_grid(
            PlayerId::from("me0001"),
            Grid::from_rows(vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]]).unwrap(),
            DeterministicRng::new(3),
        );
        endpoints.inbox.try_send(WireMessage::RequestMap).unwrap();
        endpoints
            .inbox
            .try_send(WireMessage::PowerUpUpdate { powerups: vec![] })
            .unwrap();
        assert_eq!(sync.drain(&mut s), 2);
        assert!(matches!(endpoints.outbox.try_recv(), Ok(WireMessage::Init(_))));
    }

    /// Open 13x13 room with the local player at (2.5, 6.5) facing east.
    fn arena() -> GameState {
        let mut grid = Grid::filled(13, 13, Cell::Wall);
        for y in 1..12 {
            for x in 1..12 {
                grid.set(x, y, Cell::Floor);
            }
        }
        let mut s = GameState::with_grid(PlayerId::from("me0001"), grid, DeterministicRng::new(9));
        s.player.position = Vec2::new(2.5, 6.5);
        s.player.angle = 0.0;
        s
    }

    #[test]
    fn test_extreme_monster_health_rejected() {
        let mut s = arena();
        let text = r#"{"monsters":[{"x":6.5,"y":6.5,"health":-2147483648,"spriteIndex":0}]}"#;
        assert!(apply_message(&mut s, WireMessage::from_json(text).unwrap()).is_none());
        assert!(s.monsters.is_empty());

        // Even a locally corrupted monster survives a shot without overflow.
        let mut monster = Monster::new(MonsterKind::Basic, Vec2::new(6.5, 6.5), 0.0, 0.0);
        monster.health = i32::MIN;
        s.monsters.push(monster);
        let outcome = fire(&mut s, &SimConfig::default());
        assert_eq!(outcome, FireOutcome::MonsterHit { index: 0, killed: true });
        assert!(s.monsters.is_empty());
    }

    #[test]
    fn test_forward_events_sends_hit_and_pickup() {
        let (mut sync, mut endpoints) = NetworkSync::channel(SyncConfig::default());
        endpoints.connection.send(ConnectionState::Connected).unwrap();

        let mut s = arena();
        s.player.health = 50;
        let peer = PlayerRecord {
            id: PlayerId::from("peer01"),
            x: 5.5,
            y: 6.5,
            angle: 0.0,
            health: None,
            ammo: 100,
            score: 0,
            weapon: "pistol".into(),
        };
        s.remote_players.insert(peer.id.clone(), peer.to_remote());
        s.powerups.push(PowerUp::new(PowerUpKind::Health, s.player.position));
        s.powerups.push(PowerUp::new(PowerUpKind::Ammo, Vec2::new(9.5, 9.5)));

        let config = SimConfig {
            powerup_spawn_chance: 0.0,
            monster_spawn_chance: 0.0,
            ..SimConfig::default()
        };
        let result = tick(&mut s, &InputFrame::new().with(InputFrame::FLAG_FIRE), &config, 1.0 / 60.0);
        sync.forward_events(&s, &result.events);

        match endpoints.outbox.try_recv() {
            Ok(WireMessage::PlayerHit { target_id, damage, source_id }) => {
                assert_eq!(target_id, PlayerId::from("peer01"));
                assert_eq!(damage, 10);
                assert_eq!(source_id, Some(PlayerId::from("me0001")));
            }
            other => panic!("expected player_hit, got {:?}", other),
        }
        match endpoints.outbox.try_recv() {
            Ok(WireMessage::PowerUpUpdate { powerups }) => {
                assert_eq!(powerups.len(), 1);
                assert_eq!(powerups[0].kind, PowerUpKind::Ammo);
                assert_eq!((powerups[0].x, powerups[0].y), (9.5, 9.5));
            }
            other => panic!("expected powerup_update, got {:?}", other),
        }
        assert!(endpoints.outbox.try_recv().is_err());
    }
}
