//! Neon Breakout - simulation core for a block-breaking arcade game
//!
//! A paddle deflects a ball into a grid of blocks; destroyed blocks spawn
//! particle bursts and occasionally drop power-ups. This crate is only the
//! simulation: physics integration, collision resolution, entity lifecycle,
//! and the win/lose/power-up state machine. The host owns rendering and raw
//! input, calls [`sim::tick`] once per frame with the elapsed time since the
//! previous frame, and reads the public [`sim::GameState`] fields as its
//! render snapshot.
//!
//! The simulation advances at the host's frame cadence with a variable `dt`
//! (it is deliberately not fixed-step), but is deterministic given the same
//! seed, inputs, and frame deltas.

pub mod sim;

pub use sim::{GamePhase, GameState, TickInput};

/// Game tuning constants
pub mod consts {
    /// Ball radius (the collision test uses the ball's bounding square)
    pub const BALL_RADIUS: f32 = 8.0;
    /// Target speed magnitude, conserved across bounces (pixels/s)
    pub const BALL_SPEED: f32 = 400.0;

    /// Paddle defaults
    pub const PADDLE_DEFAULT_WIDTH: f32 = 120.0;
    pub const PADDLE_HEIGHT: f32 = 20.0;
    /// Paddle top edge sits this far above the world's bottom edge
    pub const PADDLE_BOTTOM_OFFSET: f32 = 40.0;
    /// Horizontal deflection per pixel of offset from the paddle center
    pub const PADDLE_DEFLECT_FACTOR: f32 = 5.0;

    /// Block grid layout
    pub const BLOCK_ROWS: u32 = 5;
    pub const BLOCK_COLS: u32 = 8;
    pub const BLOCK_PADDING: f32 = 10.0;
    pub const BLOCK_OFFSET_TOP: f32 = 80.0;
    pub const BLOCK_OFFSET_LEFT: f32 = 60.0;
    pub const BLOCK_HEIGHT: f32 = 30.0;
    /// Entries in the host's block color palette, cycled by row
    pub const BLOCK_PALETTE_LEN: u8 = 5;
    /// Score per destroyed block
    pub const BLOCK_SCORE: u64 = 100;

    /// Power-up capsule size and fall speed
    pub const POWERUP_WIDTH: f32 = 40.0;
    pub const POWERUP_HEIGHT: f32 = 20.0;
    pub const POWERUP_FALL_SPEED: f32 = 150.0;
    /// Drop probability per destroyed block
    pub const POWERUP_DROP_CHANCE: f32 = 0.2;
    /// Flat bonus awarded on any power-up activation
    pub const POWERUP_SCORE: u64 = 500;

    /// WIDE effect: paddle width multiplier and revert delay
    pub const WIDE_PADDLE_FACTOR: f32 = 1.5;
    pub const WIDE_PADDLE_SECS: f32 = 10.0;

    /// Particles spawned per destroyed block
    pub const PARTICLES_PER_BLOCK: usize = 15;
    /// Particle pool cap; the oldest particle is evicted past this
    pub const MAX_PARTICLES: usize = 512;
}

/// Format a duration in seconds as MM:SS for HUD display
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
