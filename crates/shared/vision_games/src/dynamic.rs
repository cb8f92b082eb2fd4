//! Dynamic visual acuity: read a two-digit number flying across the screen.
//!
//! Pace adapts to performance and a smoothed "visual age" estimate tracks the
//! pace the player can sustain.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cues::{Tone, TICK_FREQ_DEFAULT};
use crate::error::ParseError;
use crate::geometry::{free_span, Viewport};
use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::prng::Prng;
use crate::round::{RoundEvent, RoundGate};
use crate::stats::RoundStats;
use crate::time::{Countdown, Duration};

pub const GAME_DURATION_S: f64 = 180.0;
/// Pause between an answer and the next number.
pub const SPAWN_DELAY_S: f64 = 0.8;
pub const NUMBER_MIN: u32 = 10;
pub const NUMBER_MAX: u32 = 99;
pub const SPEED_UP_RATE: f64 = 0.95;
pub const SLOW_DOWN_RATE: f64 = 1.25;
/// Slowest allowed pace (ms per crossing).
pub const DURATION_MAX_MS: f64 = 2500.0;
pub const AGE_MIN: f64 = 18.0;
pub const AGE_MAX: f64 = 85.0;
pub const AGE_INIT_OFFSET: f64 = 10.0;
pub const COMBO_BONUS_RATE: f64 = 0.1;
pub const COMBO_BONUS_MAX: f64 = 0.5;
pub const TRACKING_RATE_BASE: f64 = 0.2;
/// Downward drift once the estimate has reached the pace's target age.
pub const AGE_DRIFT: f64 = 0.1;
pub const PENALTY_BASE: f64 = 5.0;
pub const PENALTY_MAX_ADD: f64 = 15.0;
pub const SCORE_PER_COMBO: u32 = 10;
pub const TICK_FREQ_WRONG: f32 = 220.0;
/// Random-mode jitter factor range `[0.8, 1.2)`.
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_SPAN: f64 = 0.4;
/// Numbers enter from this far left of the canvas (px).
pub const ENTRY_OFFSET_PX: f64 = 100.0;
/// Rendered glyph height; numbers are placed so they fit vertically.
pub const NUMBER_HEIGHT_PX: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTier {
    Slow,
    #[default]
    Normal,
    Fast,
    Pro,
}

impl SpeedTier {
    pub fn base_ms(self) -> f64 {
        match self {
            SpeedTier::Slow => 2000.0,
            SpeedTier::Normal => 1200.0,
            SpeedTier::Fast => 750.0,
            SpeedTier::Pro => 450.0,
        }
    }

    pub fn parse(v: &str) -> Result<Self, ParseError> {
        match v.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(SpeedTier::Slow),
            "normal" => Ok(SpeedTier::Normal),
            "fast" => Ok(SpeedTier::Fast),
            "pro" => Ok(SpeedTier::Pro),
            other => Err(ParseError::SpeedTier(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicMode {
    #[default]
    Fixed,
    /// Each spawn rescales the pace by a random factor in `[0.8, 1.2)`.
    Random,
}

impl DynamicMode {
    pub fn parse(v: &str) -> Result<Self, ParseError> {
        match v.trim().to_ascii_lowercase().as_str() {
            "fixed" | "normal" => Ok(DynamicMode::Fixed),
            "random" => Ok(DynamicMode::Random),
            other => Err(ParseError::DynamicMode(other.to_string())),
        }
    }
}

/// Age the player's pace corresponds to.
pub fn target_age_for(duration_ms: f64) -> f64 {
    if duration_ms <= 400.0 {
        18.0
    } else if duration_ms <= 550.0 {
        24.0
    } else if duration_ms <= 750.0 {
        30.0
    } else if duration_ms <= 950.0 {
        38.0
    } else if duration_ms <= 1200.0 {
        45.0
    } else if duration_ms <= 1500.0 {
        55.0
    } else {
        65.0
    }
}

pub fn speed_up(duration_ms: f64) -> f64 {
    duration_ms * SPEED_UP_RATE
}

pub fn slow_down(duration_ms: f64) -> f64 {
    (duration_ms * SLOW_DOWN_RATE).min(DURATION_MAX_MS)
}

/// Exponentially smoothed age estimate, always within `[AGE_MIN, AGE_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeEstimator {
    estimate: f64,
}

impl AgeEstimator {
    pub fn for_pace(duration_ms: f64) -> Self {
        Self::from_estimate(target_age_for(duration_ms) + AGE_INIT_OFFSET)
    }

    pub fn from_estimate(estimate: f64) -> Self {
        Self {
            estimate: estimate.clamp(AGE_MIN, AGE_MAX),
        }
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn rounded(&self) -> u32 {
        self.estimate.round() as u32
    }

    /// `combo` and `accuracy` include the trial being judged; `duration_ms` is the
    /// pace after this trial's adjustment.
    pub fn update(&mut self, correct: bool, combo: u32, accuracy: f64, duration_ms: f64) -> f64 {
        let target = target_age_for(duration_ms);
        if correct {
            if self.estimate > target {
                let bonus = (combo as f64 * COMBO_BONUS_RATE).min(COMBO_BONUS_MAX);
                let rate = TRACKING_RATE_BASE + bonus;
                self.estimate -= (self.estimate - target) * rate;
            } else {
                self.estimate -= AGE_DRIFT;
            }
        } else {
            self.estimate += PENALTY_BASE + (1.0 - accuracy) * PENALTY_MAX_ADD;
        }
        self.estimate = self.estimate.clamp(AGE_MIN, AGE_MAX);
        self.estimate
    }
}

/// A number crossing the canvas left to right at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingNumber {
    pub value: u32,
    pub top_px: f64,
    pub from_x_px: f64,
    pub to_x_px: f64,
    pub duration_ms: f64,
}

impl MovingNumber {
    pub fn x_at(&self, elapsed_ms: f64) -> f64 {
        let t = if self.duration_ms > 0.0 {
            (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.from_x_px + (self.to_x_px - self.from_x_px) * t
    }
}

#[derive(Debug, Clone)]
pub struct DynamicRound {
    gate: RoundGate,
    tier: SpeedTier,
    mode: DynamicMode,
    viewport: Viewport,
    duration_ms: f64,
    age: AgeEstimator,
    stats: RoundStats,
    countdown: Option<Countdown>,
    spawn_delay: Option<Countdown>,
    current: Option<MovingNumber>,
    flight_ms: f64,
    pending_cue: Option<Tone>,
}

impl DynamicRound {
    pub fn new(tier: SpeedTier, mode: DynamicMode, viewport: Viewport) -> Self {
        let duration_ms = tier.base_ms();
        Self {
            gate: RoundGate::new(),
            tier,
            mode,
            viewport,
            duration_ms,
            age: AgeEstimator::for_pace(duration_ms),
            stats: RoundStats::new(),
            countdown: None,
            spawn_delay: None,
            current: None,
            flight_ms: 0.0,
            pending_cue: None,
        }
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn age(&self) -> &AgeEstimator {
        &self.age
    }

    pub fn remaining_s(&self) -> f64 {
        self.countdown.as_ref().map_or(0.0, |c| c.remaining_s().max(0.0))
    }

    pub fn stimulus(&self) -> Option<&MovingNumber> {
        self.current.as_ref()
    }

    /// Whether the current number is still on its way across the canvas.
    pub fn in_flight(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|n| self.flight_ms < n.duration_ms)
    }

    /// Horizontal position of the number, while in flight.
    pub fn number_x(&self) -> Option<f64> {
        if !self.in_flight() {
            return None;
        }
        self.current.as_ref().map(|n| n.x_at(self.flight_ms))
    }

    pub fn take_cue(&mut self) -> Option<Tone> {
        self.pending_cue.take()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn start(&mut self, rng: &mut Prng) -> RoundEvent<MovingNumber> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.duration_ms = self.tier.base_ms();
        self.age = AgeEstimator::for_pace(self.duration_ms);
        self.stats = RoundStats::new();
        self.countdown = Some(Countdown::new(GAME_DURATION_S));
        self.spawn_delay = None;
        debug!(tier = ?self.tier, mode = ?self.mode, "dynamic round started");
        RoundEvent::Presented(self.spawn(rng))
    }

    /// Text answer. Non-numeric text is ignored without consuming the trial.
    pub fn respond(&mut self, text: &str) -> RoundEvent<MovingNumber> {
        let Ok(answer) = text.trim().parse::<i64>() else {
            return RoundEvent::Ignored;
        };
        let Some(expected) = self.current.as_ref().map(|n| n.value) else {
            return RoundEvent::Ignored;
        };
        if !self.gate.accept_input() {
            return RoundEvent::Ignored;
        }

        let correct = answer == i64::from(expected);
        self.stats.record_trial(correct);
        if correct {
            self.duration_ms = speed_up(self.duration_ms);
            self.stats.add_score(SCORE_PER_COMBO * self.stats.combo);
            self.pending_cue = Some(Tone::beep(TICK_FREQ_DEFAULT));
        } else {
            self.duration_ms = slow_down(self.duration_ms);
            self.pending_cue = Some(Tone::beep(TICK_FREQ_WRONG));
        }
        self.age.update(
            correct,
            self.stats.combo,
            self.stats.accuracy(),
            self.duration_ms,
        );

        self.spawn_delay = Some(Countdown::new(SPAWN_DELAY_S));
        RoundEvent::Judged {
            correct,
            next: None,
        }
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut Prng) -> RoundEvent<MovingNumber> {
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        self.stats.advance(dt);
        if self.countdown.as_mut().is_some_and(|c| c.advance(dt)) {
            return self.finish();
        }

        if self.current.is_some() {
            self.flight_ms += dt.as_secs_f64() * 1000.0;
        }

        let due = self.spawn_delay.as_mut().is_some_and(|d| d.advance(dt));
        if due {
            self.spawn_delay = None;
            let next = self.spawn(rng);
            self.gate.present();
            return RoundEvent::Presented(next);
        }
        RoundEvent::None
    }

    pub fn stop(&mut self) -> RoundEvent<MovingNumber> {
        self.finish()
    }

    fn spawn(&mut self, rng: &mut Prng) -> MovingNumber {
        if self.mode == DynamicMode::Random {
            let factor = JITTER_MIN + rng.next_f64_01() * JITTER_SPAN;
            self.duration_ms = (self.duration_ms * factor).min(DURATION_MAX_MS);
        }
        let v = self.viewport.sanitized();
        let n = MovingNumber {
            value: rng.gen_range_u32(NUMBER_MIN, NUMBER_MAX + 1),
            top_px: rng.next_f64_01() * free_span(v.height, NUMBER_HEIGHT_PX),
            from_x_px: -ENTRY_OFFSET_PX,
            to_x_px: v.width,
            duration_ms: self.duration_ms,
        };
        self.flight_ms = 0.0;
        self.current = Some(n.clone());
        n
    }

    fn finish(&mut self) -> RoundEvent<MovingNumber> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        // Pending timers die with the round.
        self.countdown = None;
        self.spawn_delay = None;
        self.current = None;
        let age = self.age.rounded();
        debug!(age, trials = self.stats.attempted, "dynamic round finished");
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Dynamic,
            ResultPayload::EstimatedAge { age },
        ))
    }
}

impl Default for DynamicRound {
    fn default() -> Self {
        Self::new(SpeedTier::default(), DynamicMode::default(), Viewport::default())
    }
}
