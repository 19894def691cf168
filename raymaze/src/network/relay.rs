//! Relay Server
//!
//! Broadcast hub between clients. It never simulates: it caches the shared
//! map and the last known entity lists, picks one client as map authority
//! and forwards state updates to everyone else.
//!
//! Routing lives in [`RelayState`], which is pure and returns the
//! deliveries for each message. [`RelayServer`] owns the sockets and
//! carries the deliveries out.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::game::maze::Grid;
use crate::game::state::PlayerId;
use crate::network::protocol::{InitPayload, MonsterRecord, PowerUpRecord, WireMessage};

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address
    pub bind_addr: SocketAddr,
    /// Per-client outbound queue size
    pub client_queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8765)),
            client_queue: 64,
        }
    }
}

impl RelayConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("RAYMAZE_BIND_ADDR") {
            match addr.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!("ignoring RAYMAZE_BIND_ADDR={}: {}", addr, e),
            }
        }
        config
    }
}

/// Relay errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// One outcome of routing a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Send text to a client
    Send { to: PlayerId, text: String },
    /// Close the sender's connection
    CloseSender,
}

// =============================================================================
// ROUTING
// =============================================================================

/// Cached world and membership.
#[derive(Debug, Default)]
pub struct RelayState {
    clients: BTreeSet<PlayerId>,
    authority: Option<PlayerId>,
    map: Option<Grid>,
    powerups: Vec<PowerUpRecord>,
    monsters: Vec<MonsterRecord>,
}

impl RelayState {
    /// Empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current map authority.
    pub fn authority(&self) -> Option<&PlayerId> {
        self.authority.as_ref()
    }

    /// Cached map.
    pub fn map(&self) -> Option<&Grid> {
        self.map.as_ref()
    }

    /// Number of joined clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Register a client.
    ///
    /// Without an authority the joiner takes it and is asked for its map
    /// unless one is already cached. Otherwise it receives the cached map.
    pub fn join(&mut self, id: PlayerId) -> Vec<Delivery> {
        self.clients.insert(id.clone());
        info!(player = %id, clients = self.clients.len(), "client joined");

        if self.authority.is_none() {
            self.authority = Some(id.clone());
            if self.map.is_none() {
                info!(player = %id, "requesting map from authority");
                return encode_to(id, &WireMessage::RequestMap);
            }
        }
        match self.cached_init() {
            Some(init) => encode_to(id, &init),
            None => Vec::new(),
        }
    }

    /// Route a message from a joined client. `raw` is relayed verbatim.
    pub fn handle(&mut self, sender: &PlayerId, msg: WireMessage, raw: &str) -> Vec<Delivery> {
        match msg {
            WireMessage::Join { player_id } => {
                warn!(player = %sender, requested = %player_id, "repeat join ignored");
                Vec::new()
            }
            WireMessage::Init(init) => {
                if self.map.is_some() {
                    debug!(player = %sender, "map already cached, init ignored");
                    return Vec::new();
                }
                info!(player = %sender, "caching shared map");
                self.map = Some(init.map);
                self.powerups = init.powerups;
                self.monsters = init.monsters.unwrap_or_default();
                match self.cached_init() {
                    Some(init) => self.broadcast(sender, &init),
                    None => Vec::new(),
                }
            }
            WireMessage::PowerUpUpdate { powerups } => {
                self.powerups = powerups;
                let update = WireMessage::PowerUpUpdate { powerups: self.powerups.clone() };
                self.broadcast(sender, &update)
            }
            WireMessage::Restart { .. } => {
                info!(player = %sender, "client restarting");
                vec![Delivery::CloseSender]
            }
            other => {
                if let WireMessage::State(update) = &other {
                    if let Some(monsters) = &update.monsters {
                        self.monsters = monsters.clone();
                    }
                    if let Some(powerups) = &update.powerups {
                        self.powerups = powerups.clone();
                    }
                }
                self.broadcast_raw(sender, raw)
            }
        }
    }

    /// Remove a client and tell the others. The cached map is kept.
    pub fn leave(&mut self, id: &PlayerId) -> Vec<Delivery> {
        if !self.clients.remove(id) {
            return Vec::new();
        }
        info!(player = %id, clients = self.clients.len(), "client removed");

        if self.authority.as_ref() == Some(id) {
            self.authority = self.clients.iter().next().cloned();
            if let Some(next) = &self.authority {
                info!(player = %next, "map authority handed over");
            }
        }
        let notice = WireMessage::PlayerDisconnect { player_id: id.clone() };
        self.broadcast(id, &notice)
    }

    fn cached_init(&self) -> Option<WireMessage> {
        self.map.as_ref().map(|map| {
            WireMessage::Init(InitPayload {
                map: map.clone(),
                powerups: self.powerups.clone(),
                monsters: Some(self.monsters.clone()),
            })
        })
    }

    fn broadcast(&self, except: &PlayerId, msg: &WireMessage) -> Vec<Delivery> {
        match msg.to_json() {
            Ok(text) => self.broadcast_raw(except, &text),
            Err(e) => {
                error!(kind = msg.kind(), "Failed to serialize message: {}", e);
                Vec::new()
            }
        }
    }

    fn broadcast_raw(&self, except: &PlayerId, text: &str) -> Vec<Delivery> {
        self.clients
            .iter()
            .filter(|id| *id != except)
            .map(|id| Delivery::Send { to: id.clone(), text: text.to_string() })
            .collect()
    }
}

fn encode_to(to: PlayerId, msg: &WireMessage) -> Vec<Delivery> {
    match msg.to_json() {
        Ok(text) => vec![Delivery::Send { to, text }],
        Err(e) => {
            error!(kind = msg.kind(), "Failed to serialize message: {}", e);
            Vec::new()
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

#[derive(Default)]
struct Hub {
    state: RelayState,
    senders: BTreeMap<PlayerId, mpsc::Sender<String>>,
}

impl Hub {
    /// Push deliveries to client queues. Returns true if the sender should close.
    fn dispatch(&self, deliveries: Vec<Delivery>) -> bool {
        let mut close = false;
        for delivery in deliveries {
            match delivery {
                Delivery::Send { to, text } => {
                    if let Some(tx) = self.senders.get(&to) {
                        if tx.try_send(text).is_err() {
                            warn!(player = %to, "client queue full or closed, message dropped");
                        }
                    }
                }
                Delivery::CloseSender => close = true,
            }
        }
        close
    }
}

/// The relay server.
pub struct RelayServer {
    config: RelayConfig,
    hub: Arc<Mutex<Hub>>,
}

impl RelayServer {
    /// Create a relay.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            hub: Arc::new(Mutex::new(Hub::default())),
        }
    }

    /// Bind and serve until the listener fails.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), RelayError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Relay listening on {}", self.config.bind_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), RelayError> {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let hub = self.hub.clone();
                    let queue = self.config.client_queue;
                    tokio::spawn(async move {
                        handle_connection(hub, stream, addr, queue).await;
                    });
                }
                Err(e) => error!("Accept error: {}", e),
            }
        }
    }
}

async fn handle_connection(hub: Arc<Mutex<Hub>>, stream: TcpStream, addr: SocketAddr, queue: usize) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(queue.max(1));

    let sender_task = tokio::spawn(async move {
        while let Some(text) = msg_rx.recv().await {
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut player_id: Option<PlayerId> = None;

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                error!("WebSocket error for {}: {}", addr, e);
                break;
            }
        };

        let parsed = match WireMessage::from_json(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Invalid message from {}: {}", addr, e);
                continue;
            }
        };

        let mut guard = hub.lock().await;
        let close = match parsed {
            WireMessage::Join { player_id: id } if player_id.is_none() => {
                guard.senders.insert(id.clone(), msg_tx.clone());
                let deliveries = guard.state.join(id.clone());
                player_id = Some(id);
                guard.dispatch(deliveries)
            }
            parsed => match &player_id {
                Some(id) => {
                    let deliveries = guard.state.handle(id, parsed, &text);
                    guard.dispatch(deliveries)
                }
                None => {
                    debug!(kind = parsed.kind(), "message before join from {}, ignored", addr);
                    false
                }
            },
        };
        drop(guard);
        if close {
            break;
        }
    }

    if let Some(id) = player_id {
        let mut guard = hub.lock().await;
        guard.senders.remove(&id);
        let deliveries = guard.state.leave(&id);
        guard.dispatch(deliveries);
    }
    drop(msg_tx);
    let _ = sender_task.await;
    info!("Client {} cleaned up", addr);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::protocol::StatePayload;

    fn id(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn init_msg() -> WireMessage {
        WireMessage::Init(InitPayload {
            map: Grid::from_rows(vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]]).unwrap(),
            powerups: vec![],
            monsters: None,
        })
    }

    fn recipients(deliveries: &[Delivery]) -> Vec<&str> {
        deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Send { to, .. } => Some(to.as_str()),
                Delivery::CloseSender => None,
            })
            .collect()
    }

    fn kind_of(delivery: &Delivery) -> &'static str {
        match delivery {
            Delivery::Send { text, .. } => WireMessage::from_json(text).unwrap().kind(),
            Delivery::CloseSender => "close",
        }
    }

    #[test]
    fn test_first_join_requests_map() {
        let mut relay = RelayState::new();
        let out = relay.join(id("aaa"));
        assert_eq!(out.len(), 1);
        assert_eq!(kind_of(&out[0]), "request_map");
        assert_eq!(relay.authority(), Some(&id("aaa")));

        // Second joiner gets nothing until the map exists.
        assert!(relay.join(id("bbb")).is_empty());
    }

    #[test]
    fn test_init_cached_once_and_broadcast() {
        let mut relay = RelayState::new();
        relay.join(id("aaa"));
        relay.join(id("bbb"));

        let out = relay.handle(&id("aaa"), init_msg(), "");
        assert_eq!(recipients(&out), vec!["bbb"]);
        assert_eq!(kind_of(&out[0]), "init");
        assert!(relay.map().is_some());

        // A second init does not replace the cache.
        assert!(relay.handle(&id("bbb"), init_msg(), "").is_empty());

        // Late joiners get the cached map.
        let out = relay.join(id("ccc"));
        assert_eq!(kind_of(&out[0]), "init");
    }

    #[test]
    fn test_state_relayed_verbatim() {
        let mut relay = RelayState::new();
        relay.join(id("aaa"));
        relay.join(id("bbb"));
        relay.join(id("ccc"));
        let raw = r#"{"player":{"id":"aaa","x":1.0,"y":1.0}}"#;
        let out = relay.handle(&id("aaa"), WireMessage::State(StatePayload::default()), raw);
        assert_eq!(recipients(&out), vec!["bbb", "ccc"]);
        assert!(out.iter().all(|d| matches!(d, Delivery::Send { text, .. } if text == raw)));
    }

    #[test]
    fn test_restart_closes_sender() {
        let mut relay = RelayState::new();
        relay.join(id("aaa"));
        let out = relay.handle(&id("aaa"), WireMessage::Restart { player_id: Some(id("aaa")) }, "");
        assert_eq!(out, vec![Delivery::CloseSender]);
    }

    #[test]
    fn test_leave_hands_over_authority_and_keeps_map() {
        let mut relay = RelayState::new();
        relay.join(id("aaa"));
        relay.join(id("ccc"));
        relay.join(id("bbb"));
        relay.handle(&id("aaa"), init_msg(), "");

        let out = relay.leave(&id("aaa"));
        assert_eq!(recipients(&out), vec!["bbb", "ccc"]);
        assert_eq!(kind_of(&out[0]), "player_disconnect");
        assert_eq!(relay.authority(), Some(&id("bbb")));

        relay.leave(&id("bbb"));
        relay.leave(&id("ccc"));
        assert_eq!(relay.client_count(), 0);
        assert!(relay.authority().is_none());
        assert!(relay.map().is_some());

        // Next authority is sent the cached map instead of being asked.
        let out = relay.join(id("ddd"));
        assert_eq!(kind_of(&out[0]), "init");
        assert_eq!(relay.authority(), Some(&id("ddd")));
    }

    #[test]
    fn test_powerup_update_broadcast() {
        let mut relay = RelayState::new();
        relay.join(id("aaa"));
        relay.join(id("bbb"));
        let out = relay.handle(&id("bbb"), WireMessage::PowerUpUpdate { powerups: vec![] }, "");
        assert_eq!(recipients(&out), vec!["aaa"]);
        assert_eq!(kind_of(&out[0]), "powerup_update");
    }

    #[test]
    fn test_repeat_join_keeps_first_id() {
        let mut relay = RelayState::new();
        relay.join(id("aaa"));
        relay.join(id("bbb"));

        let out = relay.handle(&id("aaa"), WireMessage::Join { player_id: id("zzz") }, "");
        assert!(out.is_empty());
        assert_eq!(relay.client_count(), 2);
        assert_eq!(relay.authority(), Some(&id("aaa")));

        // Leaving under the original id still hands authority over.
        relay.leave(&id("aaa"));
        assert_eq!(relay.authority(), Some(&id("bbb")));
        assert_eq!(relay.client_count(), 1);
    }

    #[test]
    fn test_bind_addr_default() {
        assert_eq!(RelayConfig::default().bind_addr.port(), 8765);
    }
}
