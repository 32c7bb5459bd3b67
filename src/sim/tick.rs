//! Per-frame simulation tick
//!
//! The controller that owns entity lifecycles. Fixed update order per tick:
//! paddle, power-ups, balls (with loss short-circuit), ball-block pass,
//! particles, win check. Collection membership is mutated only here.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{ball_block_overlap, rects_overlap};
use super::state::{
    Ball, BallState, GamePhase, GameState, Particle, PowerUp, PowerUpKind, TimedEffect,
};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer x position, mapped to the paddle center
    pub pointer_x: Option<f32>,
    /// Start trigger: begins an idle session, or releases caught balls while
    /// running
    pub launch: bool,
}

/// Advance the game state by one frame's elapsed time
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Paddle input and bottom-edge pinning apply in every phase, so the
    // paddle reconciles with resizes even while idle
    if let Some(pointer_x) = input.pointer_x {
        state.paddle.track_pointer(pointer_x, state.width);
    }
    state.paddle.pin_to_bottom(state.height);

    if input.launch {
        if state.phase == GamePhase::Running {
            release_balls(state);
        } else {
            log::info!("session start (seed {})", state.seed);
            state.phase = GamePhase::Running;
            state.elapsed = 0.0;
        }
    }

    if state.phase != GamePhase::Running {
        // Attached balls keep riding the paddle while the loop is idle
        let world = Vec2::new(state.width, state.height);
        for ball in &mut state.balls {
            ball.update(dt, world, &state.paddle);
        }
        return;
    }

    state.elapsed += dt;

    // Fire due timed effects. The queue lives on the state and is cleared by
    // session reset, so nothing stale can reach a new session.
    let elapsed = state.elapsed;
    let mut due = Vec::new();
    state.timers.retain(|timer| {
        if timer.fires_at <= elapsed {
            due.push(timer.effect);
            false
        } else {
            true
        }
    });
    for effect in due {
        match effect {
            TimedEffect::RestorePaddle => {
                log::debug!("timed paddle restore");
                state.paddle.reset();
            }
        }
    }

    // Power-ups: fall, collect on paddle contact, prune
    let paddle_pos = state.paddle.pos;
    let paddle_size = state.paddle.size();
    let mut collected: Vec<PowerUpKind> = Vec::new();
    for powerup in &mut state.powerups {
        powerup.update(dt, state.height);
        if powerup.active && rects_overlap(powerup.pos, PowerUp::SIZE, paddle_pos, paddle_size) {
            powerup.active = false;
            collected.push(powerup.kind);
        }
    }
    state.powerups.retain(|p| p.active);
    for kind in collected {
        activate_powerup(state, kind);
    }

    // Balls: integrate and resolve walls/paddle, then prune any ball whose
    // top edge has passed the world's bottom edge
    let world = Vec2::new(state.width, state.height);
    for ball in &mut state.balls {
        ball.update(dt, world, &state.paddle);
    }
    let floor = state.height;
    state.balls.retain(|b| b.pos.y - b.radius <= floor);

    if state.balls.is_empty() {
        game_over(state);
        return;
    }

    // Ball-block pass. The first colliding ball destroys a block; one ball
    // may still destroy several blocks in the same pass, flipping its
    // vertical velocity once per non-fire hit.
    let mut active_at_entry = 0usize;
    let mut bursts: Vec<(Vec2, u8)> = Vec::new();
    let mut drop_rolls: Vec<Vec2> = Vec::new();

    for bi in 0..state.blocks.len() {
        if !state.blocks[bi].active {
            continue;
        }
        active_at_entry += 1;

        for ball in &mut state.balls {
            if !ball_block_overlap(ball, &state.blocks[bi]) {
                continue;
            }
            state.blocks[bi].active = false;
            if !ball.fire {
                ball.vel.y = -ball.vel.y;
            }
            state.score += BLOCK_SCORE;

            let center = state.blocks[bi].center();
            bursts.push((center, state.blocks[bi].color));
            drop_rolls.push(Vec2::new(center.x, state.blocks[bi].pos.y));
            break;
        }
    }

    for (pos, color) in bursts {
        spawn_burst(state, pos, color);
    }
    for pos in drop_rolls {
        try_drop_powerup(state, pos);
    }

    // Particles: pure decay, pruned at zero life
    for particle in &mut state.particles {
        particle.update(dt);
    }
    state.particles.retain(|p| p.life > 0.0);

    // Win on the count taken at pass entry: a grid whose last block died this
    // tick clears on the next tick, a grid already fully inactive clears now
    if active_at_entry == 0 && !state.blocks.is_empty() {
        win(state);
    }
}

/// Release all caught and unlaunched balls
fn release_balls(state: &mut GameState) {
    for ball in &mut state.balls {
        ball.launch(&mut state.rng);
    }
}

fn game_over(state: &mut GameState) {
    log::info!("game over at score {}", state.score);
    state.reset_session();
    state.phase = GamePhase::GameOver;
}

fn win(state: &mut GameState) {
    state.last_clear_time = Some(state.elapsed);
    log::info!(
        "level cleared in {} at score {}",
        crate::format_clock(state.elapsed),
        state.score
    );
    state.reset_session();
    state.phase = GamePhase::Win;
}

/// Apply an activated power-up. Every activation awards the flat bonus
/// regardless of the effect.
pub fn activate_powerup(state: &mut GameState, kind: PowerUpKind) {
    state.score += POWERUP_SCORE;
    log::debug!("power-up activated: {kind:?}");

    match kind {
        PowerUpKind::Wide => {
            state
                .paddle
                .set_width(PADDLE_DEFAULT_WIDTH * WIDE_PADDLE_FACTOR);
            state.schedule(WIDE_PADDLE_SECS, TimedEffect::RestorePaddle);
        }
        PowerUpKind::Multi => spawn_multi_balls(state),
        PowerUpKind::Fire => {
            for ball in &mut state.balls {
                ball.set_fire(true);
            }
        }
        PowerUpKind::Sticky => state.paddle.set_sticky(true),
    }
}

/// Spawn two extra balls from the first ball's position, fire state
/// inherited, at a randomized upward spread angle
fn spawn_multi_balls(state: &mut GameState) {
    use std::f32::consts::FRAC_PI_4;

    let Some(base) = state.balls.first().cloned() else {
        return;
    };

    for _ in 0..2 {
        let id = state.next_entity_id();
        let mut ball = Ball::new(id, base.pos);
        ball.state = BallState::Free;
        ball.set_fire(base.fire);

        let angle = state.rng.random_range(FRAC_PI_4..3.0 * FRAC_PI_4);
        let sign = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        ball.vel = Vec2::new(
            angle.cos() * ball.speed * sign,
            -angle.sin() * ball.speed,
        );

        state.balls.push(ball);
    }
}

/// Roll the power-up drop for one destroyed block: 20% chance, kind uniform
/// across the four variants
pub fn roll_powerup(rng: &mut Pcg32) -> Option<PowerUpKind> {
    if rng.random::<f32>() > POWERUP_DROP_CHANCE {
        return None;
    }
    Some(match rng.random_range(0..4u8) {
        0 => PowerUpKind::Wide,
        1 => PowerUpKind::Multi,
        2 => PowerUpKind::Fire,
        _ => PowerUpKind::Sticky,
    })
}

fn try_drop_powerup(state: &mut GameState, pos: Vec2) {
    if let Some(kind) = roll_powerup(&mut state.rng) {
        log::debug!("power-up drop: {kind:?}");
        let id = state.next_entity_id();
        state.powerups.push(PowerUp::new(id, kind, pos));
    }
}

/// Spawn the particle burst for one destroyed block, evicting the oldest
/// particles at the pool cap
fn spawn_burst(state: &mut GameState, pos: Vec2, color: u8) {
    for _ in 0..PARTICLES_PER_BLOCK {
        if state.particles.len() >= MAX_PARTICLES {
            state.particles.remove(0);
        }
        let particle = Particle::burst(&mut state.rng, pos, color);
        state.particles.push(particle);
    }
}
