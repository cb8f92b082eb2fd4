pub use core::time::Duration;

// `std::time::Instant::now()` can panic on `wasm32-unknown-unknown` depending on
// how the runtime is configured. `web-time` provides a browser-backed monotonic
// clock via `performance.now()`.
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Longest step a single tick may advance a round.
///
/// A host that was suspended (laptop lid, background tab) must not dump minutes
/// into a countdown in one go.
pub const MAX_FRAME_DT: Duration = Duration::from_millis(250);

/// Turns successive wall-clock samples into clamped frame deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        dt.min(MAX_FRAME_DT)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot countdown, advanced explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    remaining_s: f64,
}

impl Countdown {
    pub fn new(seconds: f64) -> Self {
        Self {
            remaining_s: seconds,
        }
    }

    pub fn remaining_s(&self) -> f64 {
        self.remaining_s
    }

    /// Add (or with a negative value, remove) time.
    pub fn adjust(&mut self, seconds: f64) {
        self.remaining_s += seconds;
    }

    /// Advance and report whether the countdown has run out.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.remaining_s -= dt.as_secs_f64();
        self.expired()
    }

    pub fn expired(&self) -> bool {
        self.remaining_s <= 0.0
    }
}

/// Repeating interval; reports how many periods elapsed during an advance.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    period: Duration,
    acc: Duration,
}

impl Interval {
    /// Periods shorter than this are raised to it.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Self::MIN_PERIOD),
            acc: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.acc += dt;
        let mut fired = 0;
        while self.acc >= self.period {
            self.acc -= self.period;
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_clock_clamps_long_gaps() {
        let start = Instant::now();
        let mut clock = FrameClock { last: start };
        let dt = clock.tick_at(start + Duration::from_secs(30));
        assert_eq!(dt, MAX_FRAME_DT);
        let dt = clock.tick_at(start + Duration::from_secs(30) + Duration::from_millis(16));
        assert_eq!(dt, Duration::from_millis(16));
    }

    #[test]
    fn countdown_expires_and_adjusts() {
        let mut c = Countdown::new(1.0);
        assert!(!c.advance(Duration::from_millis(600)));
        c.adjust(-0.5);
        assert!(c.expired());
    }

    #[test]
    fn interval_counts_whole_periods() {
        let mut i = Interval::new(Duration::from_millis(800));
        assert_eq!(i.advance(Duration::from_millis(700)), 0);
        assert_eq!(i.advance(Duration::from_millis(100)), 1);
        assert_eq!(i.advance(Duration::from_millis(1700)), 2);
        assert_eq!(Interval::new(Duration::ZERO).period(), Interval::MIN_PERIOD);
    }
}
