//! Smooth-pursuit training: follow a ball bouncing around the canvas.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{free_span, Point, Viewport};
use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::round::{RoundEvent, RoundGate};
use crate::stats::RoundStats;
use crate::time::Duration;

pub const BALL_SIZE_PX: f64 = 30.0;
/// Velocity in px per animation frame.
pub const INITIAL_VELOCITY: Point = Point::new(2.0, 3.0);
pub const INITIAL_POSITION: Point = Point::new(185.0, 185.0);

/// Ball under constant-velocity reflection inside `[0, extent - size]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Point,
    pub vel: Point,
    pub size: f64,
}

impl Ball {
    pub fn new(viewport: Viewport) -> Self {
        let v = viewport.sanitized();
        Self {
            pos: Point::new(
                INITIAL_POSITION.x.min(free_span(v.width, BALL_SIZE_PX)),
                INITIAL_POSITION.y.min(free_span(v.height, BALL_SIZE_PX)),
            ),
            vel: INITIAL_VELOCITY,
            size: BALL_SIZE_PX,
        }
    }

    /// Advance one frame, reflecting off the walls.
    pub fn step(&mut self, viewport: Viewport) {
        let v = viewport.sanitized();
        let (x, vx) = reflect(self.pos.x + self.vel.x, self.vel.x, free_span(v.width, self.size));
        let (y, vy) = reflect(self.pos.y + self.vel.y, self.vel.y, free_span(v.height, self.size));
        self.pos = Point::new(x, y);
        self.vel = Point::new(vx, vy);
    }
}

fn reflect(pos: f64, vel: f64, max: f64) -> (f64, f64) {
    if pos <= 0.0 {
        (0.0, vel.abs())
    } else if pos >= max {
        (max, -vel.abs())
    } else {
        (pos, vel)
    }
}

#[derive(Debug, Clone)]
pub struct FollowRound {
    gate: RoundGate,
    viewport: Viewport,
    ball: Ball,
    stats: RoundStats,
    frames: u64,
}

impl FollowRound {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            gate: RoundGate::new(),
            viewport,
            ball: Ball::new(viewport),
            stats: RoundStats::new(),
            frames: 0,
        }
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn stimulus(&self) -> Option<&Ball> {
        self.gate.is_running().then_some(&self.ball)
    }

    pub fn elapsed_s(&self) -> u64 {
        self.stats.elapsed_whole_s()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn start(&mut self) -> RoundEvent<Ball> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.ball = Ball::new(self.viewport);
        self.stats = RoundStats::new();
        self.frames = 0;
        debug!("follow round started");
        RoundEvent::Presented(self.ball)
    }

    /// One animation frame. Returns `None` once the round is no longer running,
    /// which tells the host to stop requesting frames.
    pub fn frame(&mut self, dt: Duration) -> Option<Ball> {
        if !self.gate.is_running() {
            return None;
        }
        self.ball.step(self.viewport);
        self.stats.advance(dt);
        self.frames += 1;
        Some(self.ball)
    }

    pub fn stop(&mut self) -> RoundEvent<Ball> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        let seconds = self.stats.elapsed_whole_s();
        debug!(seconds, frames = self.frames, "follow round finished");
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Follow,
            ResultPayload::Elapsed { seconds },
        ))
    }
}

impl Default for FollowRound {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn bounces_inside_canvas() {
        let vp = Viewport::new(400.0, 300.0);
        let mut ball = Ball::new(vp);
        for _ in 0..5_000 {
            let before = ball.vel;
            ball.step(vp);
            assert!(ball.pos.x >= 0.0 && ball.pos.x <= 370.0);
            assert!(ball.pos.y >= 0.0 && ball.pos.y <= 270.0);
            if ball.vel.x != before.x {
                assert!(ball.pos.x == 0.0 || ball.pos.x == 370.0);
            }
            if ball.vel.y != before.y {
                assert!(ball.pos.y == 0.0 || ball.pos.y == 270.0);
            }
        }
    }

    #[test]
    fn first_wall_contact_flips_one_axis() {
        let vp = Viewport::new(400.0, 400.0);
        let mut ball = Ball::new(vp);
        // y reaches 370 after 62 frames (185 + 3 * 62 = 371 -> clamped).
        for _ in 0..61 {
            ball.step(vp);
        }
        assert_eq!(ball.vel, INITIAL_VELOCITY);
        ball.step(vp);
        assert_eq!(ball.pos.y, 370.0);
        assert_eq!(ball.vel, Point::new(2.0, -3.0));
    }

    #[test]
    fn tiny_canvas_keeps_ball_at_origin() {
        let vp = Viewport::new(0.0, 0.0);
        let mut ball = Ball::new(vp);
        for _ in 0..10 {
            ball.step(vp);
            assert_eq!(ball.pos, Point::new(0.0, 0.0));
        }
    }

    #[test]
    fn frames_stop_after_stop() {
        let mut round = FollowRound::default();
        assert!(round.frame(FRAME).is_none(), "not started");
        round.start();
        for _ in 0..130 {
            assert!(round.frame(FRAME).is_some());
        }
        let summary = round.stop().into_summary().unwrap();
        assert_eq!(summary.payload, ResultPayload::Elapsed { seconds: 2 });
        assert!(round.frame(FRAME).is_none());
        assert!(round.stop().is_ignored());
        assert!(round.stimulus().is_none());
    }
}
