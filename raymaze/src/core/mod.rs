//! Core primitives.
//!
//! Grid-space vector math and the seeded RNG shared by every game system.

pub mod vec2;
pub mod rng;

// Re-export core types
pub use vec2::{Vec2, normalize_angle, relative_angle};
pub use rng::DeterministicRng;
