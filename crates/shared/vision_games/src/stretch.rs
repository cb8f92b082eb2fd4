//! Focus stretch: alternate between a near target and a look into the distance.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::history::{ResultPayload, RoundSummary};
use crate::kind::GameKind;
use crate::prng::Prng;
use crate::round::{RoundEvent, RoundGate};
use crate::time::{Countdown, Duration};

pub const NEAR_PHASE: Duration = Duration::from_secs(10);
pub const FAR_PHASE: Duration = Duration::from_secs(10);
pub const ROTATIONS_DEG: [u32; 4] = [0, 90, 180, 270];

pub const FONT_SIZE_DEFAULT_PX: u32 = 80;
pub const FONT_SIZE_MIN_PX: u32 = 20;
pub const FONT_SIZE_MAX_PX: u32 = 200;

pub const NEAR_INSTRUCTION: &str = "Keep your eyes on the C on screen";
pub const FAR_INSTRUCTION: &str = "Look at something at least 3 m away and relax your eyes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusPhase {
    Near,
    Far,
}

impl FocusPhase {
    pub fn duration(self) -> Duration {
        match self {
            FocusPhase::Near => NEAR_PHASE,
            FocusPhase::Far => FAR_PHASE,
        }
    }

    pub fn next(self) -> Self {
        match self {
            FocusPhase::Near => FocusPhase::Far,
            FocusPhase::Far => FocusPhase::Near,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            FocusPhase::Near => NEAR_INSTRUCTION,
            FocusPhase::Far => FAR_INSTRUCTION,
        }
    }
}

pub fn clamp_font_size(px: u32) -> u32 {
    px.clamp(FONT_SIZE_MIN_PX, FONT_SIZE_MAX_PX)
}

/// What the display shows during a phase. The far phase keeps the last
/// near-phase orientation and blurs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTarget {
    pub phase: FocusPhase,
    pub rotation_deg: u32,
    pub font_px: u32,
    pub blurred: bool,
}

#[derive(Debug, Clone)]
pub struct StretchRound {
    gate: RoundGate,
    font_px: u32,
    limit_s: Option<f64>,
    session: Option<Countdown>,
    target: Option<FocusTarget>,
    phase_elapsed: Duration,
    practiced: Duration,
}

impl StretchRound {
    pub fn new(font_px: u32) -> Self {
        Self {
            gate: RoundGate::new(),
            font_px: clamp_font_size(font_px),
            limit_s: None,
            session: None,
            target: None,
            phase_elapsed: Duration::ZERO,
            practiced: Duration::ZERO,
        }
    }

    pub fn with_limit(mut self, limit: Duration) -> Self {
        self.limit_s = Some(limit.as_secs_f64());
        self
    }

    pub fn gate(&self) -> &RoundGate {
        &self.gate
    }

    pub fn stimulus(&self) -> Option<&FocusTarget> {
        self.target.as_ref()
    }

    pub fn font_px(&self) -> u32 {
        self.font_px
    }

    /// Whole seconds practiced so far.
    pub fn practiced_s(&self) -> u64 {
        self.practiced.as_secs()
    }

    /// Whole seconds left in the current phase, counted down like a clock.
    pub fn phase_remaining_s(&self) -> u64 {
        self.target.map_or(0, |t| {
            t.phase
                .duration()
                .saturating_sub(self.phase_elapsed)
                .as_secs_f64()
                .ceil() as u64
        })
    }

    /// Resize the target; applies to the visible target immediately.
    pub fn set_font_px(&mut self, px: u32) {
        self.font_px = clamp_font_size(px);
        if let Some(t) = self.target.as_mut() {
            t.font_px = self.font_px;
        }
    }

    pub fn start(&mut self, rng: &mut Prng) -> RoundEvent<FocusTarget> {
        if !self.gate.start() {
            return RoundEvent::Ignored;
        }
        self.practiced = Duration::ZERO;
        self.session = self.limit_s.map(Countdown::new);
        debug!(font_px = self.font_px, "stretch round started");
        RoundEvent::Presented(self.enter(FocusPhase::Near, rng))
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut Prng) -> RoundEvent<FocusTarget> {
        if !self.gate.is_running() {
            return RoundEvent::None;
        }
        self.practiced += dt;
        if self.session.as_mut().is_some_and(|c| c.advance(dt)) {
            return self.stop();
        }
        self.phase_elapsed += dt;
        let Some(mut phase) = self.target.map(|t| t.phase) else {
            return RoundEvent::None;
        };
        let mut switched = None;
        while self.phase_elapsed >= phase.duration() {
            let carry = self.phase_elapsed - phase.duration();
            phase = phase.next();
            switched = Some(self.enter(phase, rng));
            self.phase_elapsed = carry;
        }
        match switched {
            Some(target) => RoundEvent::Presented(target),
            None => RoundEvent::None,
        }
    }

    /// End the round. Sessions shorter than one whole second finish without
    /// a summary and are not recorded.
    pub fn stop(&mut self) -> RoundEvent<FocusTarget> {
        if !self.gate.finish() {
            return RoundEvent::Ignored;
        }
        self.target = None;
        self.session = None;
        let seconds = self.practiced.as_secs();
        debug!(seconds, "stretch round finished");
        if seconds == 0 {
            return RoundEvent::None;
        }
        RoundEvent::Finished(RoundSummary::new(
            GameKind::Stretch,
            ResultPayload::Practice { seconds },
        ))
    }

    fn enter(&mut self, phase: FocusPhase, rng: &mut Prng) -> FocusTarget {
        self.phase_elapsed = Duration::ZERO;
        let rotation_deg = match (phase, self.target) {
            (FocusPhase::Near, _) | (_, None) => rng.pick(&ROTATIONS_DEG).copied().unwrap_or(0),
            (FocusPhase::Far, Some(t)) => t.rotation_deg,
        };
        let target = FocusTarget {
            phase,
            rotation_deg,
            font_px: self.font_px,
            blurred: phase == FocusPhase::Far,
        };
        self.target = Some(target);
        target
    }
}

impl Default for StretchRound {
    fn default() -> Self {
        Self::new(FONT_SIZE_DEFAULT_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn phases_alternate_every_ten_seconds() {
        let mut rng = Prng::new(9);
        let mut round = StretchRound::default();
        let first = match round.start(&mut rng) {
            RoundEvent::Presented(t) => t,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(first.phase, FocusPhase::Near);
        assert!(!first.blurred);
        assert!(ROTATIONS_DEG.contains(&first.rotation_deg));
        assert_eq!(round.phase_remaining_s(), 10);

        for _ in 0..9 {
            assert_eq!(round.tick(SECOND, &mut rng), RoundEvent::None);
        }
        assert_eq!(round.phase_remaining_s(), 1);
        match round.tick(SECOND, &mut rng) {
            RoundEvent::Presented(t) => {
                assert_eq!(t.phase, FocusPhase::Far);
                assert!(t.blurred);
                assert_eq!(t.rotation_deg, first.rotation_deg);
            }
            other => panic!("unexpected {other:?}"),
        }
        for _ in 0..9 {
            round.tick(SECOND, &mut rng);
        }
        assert!(matches!(
            round.tick(SECOND, &mut rng),
            RoundEvent::Presented(FocusTarget {
                phase: FocusPhase::Near,
                blurred: false,
                ..
            })
        ));
        assert_eq!(round.practiced_s(), 20);
    }

    #[test]
    fn long_tick_carries_into_next_phase() {
        let mut rng = Prng::new(10);
        let mut round = StretchRound::default();
        round.start(&mut rng);
        round.tick(Duration::from_secs(23), &mut rng);
        assert_eq!(round.stimulus().unwrap().phase, FocusPhase::Near);
        assert_eq!(round.phase_remaining_s(), 7);
    }

    #[test]
    fn records_only_whole_seconds() {
        let mut rng = Prng::new(11);
        let mut round = StretchRound::default();
        round.start(&mut rng);
        round.tick(Duration::from_millis(900), &mut rng);
        assert_eq!(round.stop(), RoundEvent::None);
        assert!(round.gate().is_finished());

        round.start(&mut rng);
        for _ in 0..65 {
            round.tick(SECOND, &mut rng);
        }
        let s = round.stop().into_summary().unwrap();
        assert_eq!(s.payload, ResultPayload::Practice { seconds: 65 });
        assert!(round.stop().is_ignored());
    }

    #[test]
    fn session_limit_and_font_size() {
        let mut rng = Prng::new(12);
        let mut round = StretchRound::new(1_000).with_limit(Duration::from_secs(30));
        assert_eq!(round.font_px(), FONT_SIZE_MAX_PX);
        round.start(&mut rng);
        round.set_font_px(5);
        assert_eq!(round.stimulus().unwrap().font_px, FONT_SIZE_MIN_PX);

        let mut summaries = 0;
        for _ in 0..40 {
            if round.tick(SECOND, &mut rng).summary().is_some() {
                summaries += 1;
            }
        }
        assert_eq!(summaries, 1);
    }
}
