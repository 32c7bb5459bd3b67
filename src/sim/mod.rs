//! Simulation module
//!
//! All gameplay logic lives here. The module has no rendering or platform
//! dependencies and is deterministic given the same seed, inputs, and frame
//! deltas:
//! - Seeded RNG only (owned by `GameState`)
//! - Stable insertion-order iteration over entity collections
//! - Variable host-supplied `dt` (one tick per rendered frame)

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{ball_block_overlap, rects_overlap};
pub use state::{
    Ball, BallState, Block, EffectTimer, GamePhase, GameState, Paddle, Particle, PowerUp,
    PowerUpKind, TimedEffect,
};
pub use tick::{TickInput, tick};
