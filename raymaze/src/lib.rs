//! # Raymaze
//!
//! Raycasting maze shooter: procedural maze, first-person software
//! renderer, monsters, power-ups and peer-to-peer state sharing through a
//! broadcast relay.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          RAYMAZE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D vector and angle helpers               │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - Simulation                                │
//! │  ├── maze.rs     - Grid and maze generator                   │
//! │  ├── collision.rs- Wall queries and slide movement           │
//! │  ├── raycast.rs  - Ray marching and depth buffer             │
//! │  ├── state.rs    - Players, monsters, power-ups              │
//! │  ├── input.rs    - Per-frame input flags                     │
//! │  ├── tick.rs     - Ordered simulation step                   │
//! │  ├── combat.rs   - Targeting and firing                      │
//! │  ├── monster.rs  - Monster AI and respawn                    │
//! │  ├── powerup.rs  - Pickup and spawn                          │
//! │  └── events.rs   - Simulation events                         │
//! │                                                              │
//! │  render/         - Software frame pipeline                   │
//! │  ├── frame.rs    - ARGB framebuffer and draw primitives      │
//! │  ├── assets.rs   - Image/sound handles and audio sink        │
//! │  ├── sprites.rs  - Billboard projection and occlusion        │
//! │  ├── minimap.rs  - Top-down overview                         │
//! │  └── hud.rs      - Weapon, flash, text, crosshair            │
//! │                                                              │
//! │  network/        - Peers                                     │
//! │  ├── protocol.rs - JSON wire messages                        │
//! │  ├── sync.rs     - Merge rules and message queues            │
//! │  ├── client.rs   - WebSocket transport task                  │
//! │  ├── relay.rs    - Broadcast relay server                    │
//! │  └── session.rs  - Per-frame client driver                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frame order
//!
//! A frame drains network messages, emits the periodic snapshot, runs one
//! simulation tick and then renders. Network input is only ever applied
//! between ticks, never during one.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod render;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use game::input::InputFrame;
pub use game::maze::{Grid, MazeError};
pub use game::state::{GameState, PlayerId};
pub use game::tick::{tick, SimConfig, TickResult};
pub use network::{ClientSession, NetworkSync, WireMessage};
pub use render::{AssetStore, Frame, RenderConfig, Renderer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Frame rate the session loop targets (Hz)
pub const TICK_RATE: u32 = 60;
