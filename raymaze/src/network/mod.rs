//! Network Layer
//!
//! Wire protocol, merge rules, client transport, relay server and the
//! client session that ties simulation, sync and rendering together.
//! All game logic still runs through `game/`; this layer only moves
//! messages and applies peers' state.

pub mod protocol;
pub mod sync;
pub mod client;
pub mod relay;
pub mod session;

pub use protocol::{
    InitPayload, MonsterRecord, PlayerRecord, PowerUpRecord, ProtocolError, StatePayload, WireMessage,
};
pub use sync::{apply_message, ConnectionState, NetworkSync, SyncConfig, SyncEndpoints};
pub use client::{ClientConfig, ClientError};
pub use relay::{RelayConfig, RelayError, RelayServer, RelayState};
pub use session::{ClientSession, SessionStats};
