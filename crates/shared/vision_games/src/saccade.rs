//! Saccade training: a dot jumps to a random spot at a fixed interval.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{Point, Viewport};
use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::prng::Prng;
use crate::round::{RoundEvent, RoundGate};
use crate::time::{Countdown, Duration, Interval};

/// Dots stay this far from every edge (px).
pub const DOT_MARGIN_PX: f64 = 50.0;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(800);
/// Slider bounds for the jump interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(200);
pub const MAX_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaccadeDot {
    pub pos: Point,
    /// 1-based index of this jump within the round.
    pub count: u32,
}

/// Uniform position inside the viewport inset by [`DOT_MARGIN_PX`].
///
/// When the viewport is narrower than both margins the dot sits on the centre line.
pub fn place_dot(viewport: Viewport, rng: &mut Prng) -> Point {
    let v = viewport.sanitized();
    let axis = |extent: f64, rng: &mut Prng| {
        let span = extent - DOT_MARGIN_PX * 2.0;
        if span > 0.0 {
            rng.next_f64_01() * span + DOT_MARGIN_PX
        } else {
            extent / 2.0
        }
    };
    let x = axis(v.width, rng);
    let y = axis(v.height, rng);
    Point::new(x, y)
}

pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

#[derive(Debug, Clone)]
pub struct SaccadeRound {
    gate: RoundGate,
    viewport: Viewport,
    interval: Duration,
    limit_s: Option<f64>,
    timer: Option<Interval>,
    session: Option<Countdown>,
    dot: Option<SaccadeDot>,
    count: u32,
}

impl SaccadeRound {
    pub fn new(viewport: Viewport, interval: Duration) -> Self {
        Self {
            gate: RoundGate::new(),
            viewport,
            interval: clamp_interval(interval),
            limit_s: None,
            timer: None,
            session: None,
            dot: None,
            count: 0,
        }
    }

    /// End the round automatically after `limit`.
    pub fn with_limit(mut self, limit: Duration) -> Self {
        self.limit_s = Some(limit.as_secs_f64());
        self
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn stimulus(&self) -> Option<&SaccadeDot> {
        self.dot.as_ref()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn start(&mut self, rng: &mut Prng) -> RoundEvent<SaccadeDot> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.count = 0;
        self.timer = Some(Interval::new(self.interval));
        self.session = self.limit_s.map(Countdown::new);
        debug!(interval_ms = self.interval.as_millis() as u64, "saccade round started");
        RoundEvent::Presented(self.jump(rng))
    }

    /// Change the jump interval. A running round is recorded and restarted
    /// with the new pace; the returned event carries that summary.
    pub fn set_interval(&mut self, interval: Duration, rng: &mut Prng) -> RoundEvent<SaccadeDot> {
        self.interval = clamp_interval(interval);
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        let finished = self.stop();
        self.start(rng);
        finished
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut Prng) -> RoundEvent<SaccadeDot> {
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        if self.session.as_mut().is_some_and(|c| c.advance(dt)) {
            return self.stop();
        }
        let due = self.timer.as_mut().map_or(0, |t| t.advance(dt));
        if due == 0 {
            return RoundEvent::None;
        }
        // Only the final position of a long tick is visible; every jump still counts.
        let mut dot = self.jump(rng);
        for _ in 1..due {
            dot = self.jump(rng);
        }
        RoundEvent::Presented(dot)
    }

    pub fn stop(&mut self) -> RoundEvent<SaccadeDot> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        self.timer = None;
        self.session = None;
        self.dot = None;
        debug!(count = self.count, "saccade round finished");
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Saccade,
            ResultPayload::Count { moves: self.count },
        ))
    }

    fn jump(&mut self, rng: &mut Prng) -> SaccadeDot {
        self.count += 1;
        let dot = SaccadeDot {
            pos: place_dot(self.viewport, rng),
            count: self.count,
        };
        self.dot = Some(dot);
        dot
    }
}

impl Default for SaccadeRound {
    fn default() -> Self {
        Self::new(Viewport::default(), DEFAULT_INTERVAL)
    }
}
