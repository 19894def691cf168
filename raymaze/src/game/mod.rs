//! Game Logic Module
//!
//! Maze, collision, ray casting and the per-tick entity simulation.
//!
//! ## Module Structure
//!
//! - `maze`: Grid type and the maze generator
//! - `collision`: Occupancy queries and slide movement
//! - `raycast`: Ray marching and the per-frame depth buffer
//! - `state`: Players, monsters, power-ups, weapon and monster tables
//! - `input`: Per-tick input flags
//! - `tick`: Simulation step
//! - `combat`: Local firing resolution
//! - `monster`: Monster AI and spawning
//! - `powerup`: Power-up pickup and spawning
//! - `events`: Events for sound cues and network forwarding

pub mod maze;
pub mod collision;
pub mod raycast;
pub mod state;
pub mod input;
pub mod tick;
pub mod combat;
pub mod monster;
pub mod powerup;
pub mod events;

// Re-export key types
pub use maze::{Grid, Cell, MazeError, generate, find_empty_spot};
pub use raycast::{RayHit, DepthBuffer, cast_ray, cast_column};
pub use input::InputFrame;
pub use state::{GameState, LocalPlayer, RemotePlayer, Monster, MonsterKind, PowerUp, PowerUpKind, PlayerId, Weapon, WEAPONS};
pub use tick::{tick, SimConfig, TickResult};
pub use events::{GameEvent, GameEventData};
