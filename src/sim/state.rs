//! Game state and core simulation types
//!
//! Entities mutate only their own fields; collection membership (add/remove)
//! is owned by the controller in `tick`. Entities never hold a reference back
//! to the owning state: world bounds and the paddle are passed into their
//! update calls instead.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Entities initialized, loop not advancing; waiting for a start trigger
    Idle,
    /// Active gameplay
    Running,
    /// All balls lost; session already reset, terminal message showing
    GameOver,
    /// All blocks cleared; session already reset, terminal message showing
    Win,
}

/// Ball mode - attached to the paddle or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Caught on the paddle at a horizontal offset from the paddle center
    Stuck { offset: f32 },
    /// Not yet launched; follows the paddle center
    Ready,
    /// Free-moving, physics integration applies
    Free,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Target speed magnitude, conserved across bounces
    pub speed: f32,
    pub state: BallState,
    /// Fire mode: passes through blocks without reflecting
    pub fire: bool,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            speed: BALL_SPEED,
            state: BallState::Ready,
            fire: false,
        }
    }

    /// Park the ball on the paddle, cleared of motion and fire state
    pub fn attach_to(&mut self, paddle: &Paddle) {
        self.vel = Vec2::ZERO;
        self.fire = false;
        self.state = BallState::Stuck { offset: 0.0 };
        self.pos = Vec2::new(paddle.center_x(), paddle.top() - self.radius);
    }

    pub fn set_fire(&mut self, fire: bool) {
        self.fire = fire;
    }

    /// Release the ball into motion. No-op if already free.
    ///
    /// A zero velocity gets a randomized upward 45-degree direction at the
    /// target speed; an inherited velocity (caught ball, spawned sibling) has
    /// any downward component flipped upward and is renormalized.
    pub fn launch(&mut self, rng: &mut Pcg32) {
        if matches!(self.state, BallState::Free) {
            return;
        }
        self.state = BallState::Free;

        if self.vel == Vec2::ZERO {
            let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            self.vel = Vec2::new(sign, -1.0).normalize() * self.speed;
        } else {
            if self.vel.y > 0.0 {
                self.vel.y = -self.vel.y;
            }
            let len = self.vel.length();
            if len > 0.0 {
                self.vel = self.vel / len * self.speed;
            }
        }
    }

    /// Advance the ball by `dt` and resolve wall and paddle contact.
    ///
    /// The bottom boundary is deliberately not resolved here: a ball past it
    /// is removed by the controller, which is how a life is lost.
    pub fn update(&mut self, dt: f32, world: Vec2, paddle: &Paddle) {
        match self.state {
            BallState::Stuck { offset } => {
                self.pos = Vec2::new(paddle.center_x() + offset, paddle.top() - self.radius);
                return;
            }
            BallState::Ready => {
                self.pos = Vec2::new(paddle.center_x(), paddle.top() - self.radius);
                return;
            }
            BallState::Free => {}
        }

        let mut next = self.pos + self.vel * dt;

        // Side walls: clamp to the boundary and reflect
        if next.x - self.radius < 0.0 {
            next.x = self.radius;
            self.vel.x = -self.vel.x;
        } else if next.x + self.radius > world.x {
            next.x = world.x - self.radius;
            self.vel.x = -self.vel.x;
        }

        // Ceiling
        if next.y - self.radius < 0.0 {
            next.y = self.radius;
            self.vel.y = -self.vel.y;
        }

        self.pos = next;

        self.resolve_paddle(paddle);
    }

    /// Paddle contact: only while the ball center is within the paddle's
    /// horizontal span, the vertical spans overlap, and the ball is moving
    /// downward (so an upward ball sliding along the top edge re-triggers
    /// nothing).
    fn resolve_paddle(&mut self, paddle: &Paddle) {
        let overlaps = self.pos.y + self.radius >= paddle.pos.y
            && self.pos.y - self.radius <= paddle.pos.y + paddle.height
            && self.pos.x >= paddle.pos.x
            && self.pos.x <= paddle.pos.x + paddle.width;
        if !overlaps || self.vel.y <= 0.0 {
            return;
        }

        if paddle.sticky {
            // Catch: ride the paddle at the contact point. Velocity is kept
            // so the next launch reuses the inherited direction.
            self.state = BallState::Stuck {
                offset: self.pos.x - paddle.center_x(),
            };
            self.pos.y = paddle.top() - self.radius;
            return;
        }

        self.vel.y = -self.vel.y.abs();

        // Contact point away from the paddle center angles the return
        let hit_offset = self.pos.x - paddle.center_x();
        self.vel.x = hit_offset * PADDLE_DEFLECT_FACTOR;

        let len = self.vel.length();
        if len > 0.0 {
            self.vel = self.vel / len * self.speed;
        }

        // Reseat on the paddle top so the ball cannot tunnel through
        self.pos.y = paddle.top() - self.radius;
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Catch mode: colliding balls attach instead of bouncing
    pub sticky: bool,
}

impl Paddle {
    pub fn new(world: Vec2) -> Self {
        Self {
            pos: Vec2::new(
                world.x / 2.0 - PADDLE_DEFAULT_WIDTH / 2.0,
                world.y - PADDLE_BOTTOM_OFFSET,
            ),
            width: PADDLE_DEFAULT_WIDTH,
            height: PADDLE_HEIGHT,
            sticky: false,
        }
    }

    /// Restore default width and clear stickiness
    pub fn reset(&mut self) {
        self.width = PADDLE_DEFAULT_WIDTH;
        self.sticky = false;
    }

    /// Set width directly; the left edge stays fixed
    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_sticky(&mut self, sticky: bool) {
        self.sticky = sticky;
    }

    /// Map a pointer x coordinate to the paddle center, clamped to the world
    pub fn track_pointer(&mut self, pointer_x: f32, world_w: f32) {
        self.pos.x = (pointer_x - self.width / 2.0).clamp(0.0, (world_w - self.width).max(0.0));
    }

    /// Keep the paddle anchored near the bottom edge (called every tick, so
    /// a world resize reconciles on the next frame)
    pub fn pin_to_bottom(&mut self, world_h: f32) {
        self.pos.y = world_h - PADDLE_BOTTOM_OFFSET;
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// A static destructible block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Palette index for the host renderer (and the particle burst color)
    pub color: u8,
    /// Flips false exactly once, on the first colliding ball
    pub active: bool,
}

impl Block {
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Paddle width x1.5 for a limited time
    Wide,
    /// Two extra balls from the first ball's position
    Multi,
    /// All active balls pass through blocks
    Fire,
    /// Paddle catches balls until the next paddle reset
    Sticky,
}

/// A falling power-up capsule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    /// Top-left corner
    pub pos: Vec2,
    pub active: bool,
}

impl PowerUp {
    pub const SIZE: Vec2 = Vec2::new(POWERUP_WIDTH, POWERUP_HEIGHT);

    pub fn new(id: u32, kind: PowerUpKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            active: true,
        }
    }

    /// Fall at constant speed; deactivate past the bottom edge. Paddle
    /// contact is resolved by the controller.
    pub fn update(&mut self, dt: f32, world_h: f32) {
        self.pos.y += POWERUP_FALL_SPEED * dt;
        if self.pos.y > world_h {
            self.active = false;
        }
    }
}

/// A cosmetic decay particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Palette index inherited from the destroyed block
    pub color: u8,
    /// Remaining life in [0, 1]
    pub life: f32,
    /// Life lost per second
    pub decay: f32,
}

impl Particle {
    /// Spawn one burst particle with randomized direction, speed, size and
    /// decay rate
    pub fn burst(rng: &mut Pcg32, pos: Vec2, color: u8) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(50.0..150.0);
        Self {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            radius: rng.random_range(1.0..4.0),
            color,
            life: 1.0,
            decay: rng.random_range(1.0..3.0),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.life -= self.decay * dt;
    }
}

/// Deferred effects checked against elapsed session time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedEffect {
    /// Revert the WIDE power-up (shared paddle reset, also clears stickiness)
    RestorePaddle,
}

/// A scheduled effect in the timer queue. The queue is owned by `GameState`
/// and cleared on session reset, so a stale timer can never fire into a new
/// session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EffectTimer {
    /// Elapsed-time deadline in seconds
    pub fires_at: f32,
    pub effect: TimedEffect,
}

/// Complete simulation state. The host reads the public fields as its render
/// snapshot; all mutation happens inside `tick`.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Live world dimensions, updated by the host via `resize`
    pub width: f32,
    pub height: f32,
    pub phase: GamePhase,
    pub score: u64,
    /// Seconds accumulated since session start
    pub elapsed: f32,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    pub blocks: Vec<Block>,
    pub powerups: Vec<PowerUp>,
    pub particles: Vec<Particle>,
    /// Pending timed effects, checked each tick against `elapsed`
    pub timers: Vec<EffectTimer>,
    /// Clear time of the most recent win, for the terminal message
    pub last_clear_time: Option<f32>,
    next_id: u32,
}

impl GameState {
    /// Create a session with one ball attached to the paddle and a fresh
    /// block grid, waiting in `Idle` for a start trigger
    pub fn new(seed: u64, width: f32, height: f32) -> Self {
        let world = Vec2::new(width, height);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            width,
            height,
            phase: GamePhase::Idle,
            score: 0,
            elapsed: 0.0,
            paddle: Paddle::new(world),
            balls: Vec::new(),
            blocks: Vec::new(),
            powerups: Vec::new(),
            particles: Vec::new(),
            timers: Vec::new(),
            last_clear_time: None,
            next_id: 1,
        };

        state.spawn_ball_attached();
        state.build_block_grid();

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a ball parked on the paddle
    pub fn spawn_ball_attached(&mut self) {
        let id = self.next_entity_id();
        let mut ball = Ball::new(id, Vec2::new(self.width / 2.0, self.height / 2.0));
        ball.attach_to(&self.paddle);
        self.balls.push(ball);
    }

    /// Lay out the level's block grid across the current world width
    pub fn build_block_grid(&mut self) {
        self.blocks.clear();

        let available = self.width
            - BLOCK_OFFSET_LEFT * 2.0
            - BLOCK_PADDING * (BLOCK_COLS - 1) as f32;
        let block_w = available / BLOCK_COLS as f32;
        let size = Vec2::new(block_w, BLOCK_HEIGHT);

        for row in 0..BLOCK_ROWS {
            for col in 0..BLOCK_COLS {
                let id = self.next_entity_id();
                self.blocks.push(Block {
                    id,
                    pos: Vec2::new(
                        BLOCK_OFFSET_LEFT + col as f32 * (block_w + BLOCK_PADDING),
                        BLOCK_OFFSET_TOP + row as f32 * (BLOCK_HEIGHT + BLOCK_PADDING),
                    ),
                    size,
                    color: (row % BLOCK_PALETTE_LEN as u32) as u8,
                    active: true,
                });
            }
        }
    }

    /// Reset everything back toward `Idle`: score, entities, paddle, timers.
    /// Pending timers are dropped here, which is what cancels an in-flight
    /// WIDE reversion when the session ends first.
    pub fn reset_session(&mut self) {
        self.score = 0;
        self.elapsed = 0.0;
        self.paddle.reset();
        self.balls.clear();
        self.spawn_ball_attached();
        self.build_block_grid();
        self.powerups.clear();
        self.particles.clear();
        self.timers.clear();
        self.phase = GamePhase::Idle;
    }

    /// Update live world dimensions; the paddle vertical pin and pointer
    /// clamp reconcile on the next tick
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Queue a timed effect `delay` seconds from now
    pub fn schedule(&mut self, delay: f32, effect: TimedEffect) {
        self.timers.push(EffectTimer {
            fires_at: self.elapsed + delay,
            effect,
        });
    }

    /// Whether the loop is advancing, for HUD display
    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Message to overlay when the loop is not advancing
    pub fn status_message(&self) -> Option<String> {
        match self.phase {
            GamePhase::Running => None,
            GamePhase::Idle => Some("Click to Start".to_owned()),
            GamePhase::GameOver => Some("GAME OVER - Click to Retry".to_owned()),
            GamePhase::Win => {
                let clock = crate::format_clock(self.last_clear_time.unwrap_or(0.0));
                Some(format!("YOU WIN! Time: {clock} - Click to Play Again"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_paddle() -> Paddle {
        let mut paddle = Paddle::new(Vec2::new(800.0, 600.0));
        paddle.track_pointer(400.0, 800.0);
        paddle
    }

    #[test]
    fn test_launch_is_idempotent_when_free() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ball = Ball::new(1, Vec2::new(100.0, 100.0));
        ball.state = BallState::Free;
        ball.vel = Vec2::new(30.0, 40.0);

        ball.launch(&mut rng);
        assert_eq!(ball.vel, Vec2::new(30.0, 40.0));
    }

    #[test]
    fn test_launch_from_rest_is_upward_at_speed() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..32 {
            let mut ball = Ball::new(1, Vec2::new(100.0, 100.0));
            ball.state = BallState::Ready;
            ball.launch(&mut rng);

            assert!(matches!(ball.state, BallState::Free));
            assert!(ball.vel.y < 0.0);
            assert!((ball.vel.length() - ball.speed).abs() < 1e-3);
        }
    }

    #[test]
    fn test_launch_flips_inherited_downward_velocity() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ball = Ball::new(1, Vec2::new(100.0, 100.0));
        ball.state = BallState::Stuck { offset: 12.0 };
        ball.vel = Vec2::new(120.0, 90.0);

        ball.launch(&mut rng);
        assert!(ball.vel.y < 0.0);
        assert!(ball.vel.x > 0.0);
        assert!((ball.vel.length() - ball.speed).abs() < 1e-3);
    }

    #[test]
    fn test_launch_zero_velocity_guard_never_divides() {
        // A stuck ball with an exactly-zero inherited velocity takes the
        // randomized branch instead of renormalizing a zero vector
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ball = Ball::new(1, Vec2::new(100.0, 100.0));
        ball.state = BallState::Stuck { offset: 0.0 };

        ball.launch(&mut rng);
        assert!(ball.vel.is_finite());
        assert!((ball.vel.length() - ball.speed).abs() < 1e-3);
    }

    #[test]
    fn test_stuck_ball_rides_paddle() {
        let mut paddle = test_paddle();
        let mut ball = Ball::new(1, Vec2::ZERO);
        ball.state = BallState::Stuck { offset: 25.0 };

        paddle.track_pointer(200.0, 800.0);
        ball.update(1.0, Vec2::new(800.0, 600.0), &paddle);

        assert_eq!(ball.pos.x, paddle.center_x() + 25.0);
        assert_eq!(ball.pos.y, paddle.top() - ball.radius);
    }

    #[test]
    fn test_sticky_paddle_catches_at_contact_offset() {
        let paddle = test_paddle();
        let mut sticky = paddle.clone();
        sticky.set_sticky(true);

        let mut ball = Ball::new(1, Vec2::new(sticky.center_x() + 20.0, sticky.top() - 30.0));
        ball.state = BallState::Free;
        ball.vel = Vec2::new(0.0, 400.0);

        ball.update(0.1, Vec2::new(800.0, 600.0), &sticky);

        match ball.state {
            BallState::Stuck { offset } => assert!((offset - 20.0).abs() < 1e-3),
            other => panic!("expected catch, got {other:?}"),
        }
        // Velocity is kept for the next launch
        assert!(ball.vel.y > 0.0);
    }

    #[test]
    fn test_upward_ball_does_not_retrigger_paddle() {
        let paddle = test_paddle();
        let mut ball = Ball::new(1, Vec2::new(paddle.center_x(), paddle.top() - 4.0));
        ball.state = BallState::Free;
        ball.vel = Vec2::new(100.0, -387.3);

        let before = ball.vel;
        ball.resolve_paddle(&paddle);
        assert_eq!(ball.vel, before);
    }

    #[test]
    fn test_paddle_track_pointer_clamps() {
        let mut paddle = test_paddle();
        paddle.track_pointer(-500.0, 800.0);
        assert_eq!(paddle.pos.x, 0.0);
        paddle.track_pointer(5000.0, 800.0);
        assert_eq!(paddle.pos.x, 800.0 - paddle.width);
    }

    #[test]
    fn test_powerup_falls_and_expires_below_world() {
        let mut p = PowerUp::new(1, PowerUpKind::Wide, Vec2::new(100.0, 590.0));
        p.update(0.1, 600.0);
        assert!((p.pos.y - 605.0).abs() < 1e-3);
        assert!(!p.active);
    }

    #[test]
    fn test_particle_decays() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut p = Particle::burst(&mut rng, Vec2::ZERO, 2);
        assert_eq!(p.life, 1.0);
        p.update(0.5);
        assert!(p.life < 1.0);
        assert!(p.pos != Vec2::ZERO);
    }

    #[test]
    fn test_block_grid_layout() {
        let state = GameState::new(1, 800.0, 600.0);
        assert_eq!(state.blocks.len(), (BLOCK_ROWS * BLOCK_COLS) as usize);

        let first = &state.blocks[0];
        assert_eq!(first.pos, Vec2::new(BLOCK_OFFSET_LEFT, BLOCK_OFFSET_TOP));
        assert!(state.blocks.iter().all(|b| b.active));

        // Grid spans the world symmetrically
        let last_in_row = &state.blocks[(BLOCK_COLS - 1) as usize];
        let right_edge = last_in_row.pos.x + last_in_row.size.x;
        assert!((right_edge - (800.0 - BLOCK_OFFSET_LEFT)).abs() < 1e-3);
    }

    #[test]
    fn test_reset_session_clears_timers_and_effects() {
        let mut state = GameState::new(1, 800.0, 600.0);
        state.paddle.set_width(180.0);
        state.paddle.set_sticky(true);
        state.schedule(10.0, TimedEffect::RestorePaddle);
        state.score = 1200;

        state.reset_session();

        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.paddle.width, PADDLE_DEFAULT_WIDTH);
        assert!(!state.paddle.sticky);
        assert!(state.timers.is_empty());
        assert_eq!(state.balls.len(), 1);
        assert!(matches!(state.balls[0].state, BallState::Stuck { .. }));
    }

    #[test]
    fn test_status_messages() {
        let mut state = GameState::new(1, 800.0, 600.0);
        assert_eq!(state.status_message().as_deref(), Some("Click to Start"));

        state.phase = GamePhase::Running;
        assert_eq!(state.status_message(), None);

        state.phase = GamePhase::Win;
        state.last_clear_time = Some(83.0);
        assert_eq!(
            state.status_message().as_deref(),
            Some("YOU WIN! Time: 01:23 - Click to Play Again")
        );
    }

    proptest! {
        /// Paddle reflection renormalizes jointly, so the speed magnitude is
        /// conserved for any contact offset and incoming downward velocity
        #[test]
        fn prop_paddle_bounce_conserves_speed(
            offset in -59.0f32..59.0,
            dy in 50.0f32..400.0,
            dx in -200.0f32..200.0,
        ) {
            let paddle = test_paddle();
            let mut ball = Ball::new(1, Vec2::new(paddle.center_x() + offset, paddle.top() - 2.0));
            ball.state = BallState::Free;
            ball.vel = Vec2::new(dx, dy);

            ball.resolve_paddle(&paddle);

            prop_assert!(ball.vel.y < 0.0);
            prop_assert!((ball.vel.length() - ball.speed).abs() < 1e-2);
        }

        /// Wall bounces negate one component, so speed is conserved
        #[test]
        fn prop_wall_bounce_conserves_speed(
            x in 0.0f32..800.0,
            y in 50.0f32..500.0,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let paddle = test_paddle();
            let mut ball = Ball::new(1, Vec2::new(x, y));
            ball.state = BallState::Free;
            ball.vel = Vec2::new(angle.cos(), angle.sin()) * ball.speed;

            ball.update(0.016, Vec2::new(800.0, 600.0), &paddle);

            prop_assert!((ball.vel.length() - ball.speed).abs() < 1e-2);
        }
    }
}
