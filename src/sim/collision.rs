//! Axis-aligned overlap tests
//!
//! Everything here is rectangle-vs-rectangle with exclusive edges. The ball
//! is deliberately approximated by its bounding square rather than a true
//! circle; the scenario behavior downstream is derived from that
//! approximation, so it must not be tightened.

use glam::Vec2;

use super::state::{Ball, Block};

/// Exclusive-edge overlap test between two top-left-anchored rectangles.
/// Rectangles that merely touch do not overlap.
pub fn rects_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x < b_pos.x + b_size.x
        && a_pos.x + a_size.x > b_pos.x
        && a_pos.y < b_pos.y + b_size.y
        && a_pos.y + a_size.y > b_pos.y
}

/// Ball-vs-block test using the ball's bounding square
pub fn ball_block_overlap(ball: &Ball, block: &Block) -> bool {
    let bbox_pos = ball.pos - Vec2::splat(ball.radius);
    let bbox_size = Vec2::splat(ball.radius * 2.0);
    rects_overlap(bbox_pos, bbox_size, block.pos, block.size)
}
